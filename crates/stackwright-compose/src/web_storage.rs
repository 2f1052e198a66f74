//! Static website storage: bucket, public-read policy, and CDN.

use stackwright_common::constants::{HTTPS_PORT, HTTP_PORT};
use stackwright_common::error::{Result, StackwrightError};
use stackwright_core::{ComponentHandle, DeclaredResource, DeploymentContext, Input, ResourceKind};

/// Type token of the storage component.
pub const COMPONENT_TOKEN: &str = "stackwright:web:StaticWeb";

const INDEX_DOCUMENT: &str = "index.html";

/// Parameters for [`WebStorageComponent::build`].
#[derive(Debug, Clone, Default)]
pub struct WebStorageArgs {
    /// Component name, `{service}-{env}`.
    pub name: String,
    /// Host label, e.g. `docs`.
    pub host: String,
    /// Parent domain, e.g. `example.com`.
    pub domain: String,
    /// Certificate served by the CDN for `{host}.{domain}`.
    pub certificate_arn: String,
}

impl WebStorageArgs {
    /// Fully qualified site name; also the bucket name.
    #[must_use]
    pub fn site_name(&self) -> String {
        format!("{}.{}", self.host, self.domain)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("service", &self.name),
            ("host", &self.host),
            ("domain", &self.domain),
            ("domainSslCertArn", &self.certificate_arn),
        ] {
            if value.is_empty() {
                return Err(StackwrightError::InvalidInput {
                    field,
                    message: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Everything declared by [`WebStorageComponent::build`].
#[derive(Debug, Clone)]
pub struct WebStorageComponent {
    /// The storage component, named after the site's service and environment.
    pub handle: ComponentHandle,
    /// Website bucket.
    pub bucket: DeclaredResource,
    /// Public-read policy on the bucket.
    pub bucket_policy: DeclaredResource,
    /// CDN in front of the bucket.
    pub distribution: DeclaredResource,
}

impl WebStorageComponent {
    /// Declares the storage component and publishes `bucketName` and
    /// `cdnDomainName` on it.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::InvalidInput`] for empty arguments or the
    /// first declaration error.
    pub fn build(ctx: &mut DeploymentContext, args: &WebStorageArgs) -> Result<Self> {
        args.validate()?;
        let site = args.site_name();
        let handle = ctx.register_component(COMPONENT_TOKEN, &args.name, None)?;
        tracing::info!(site = %site, "building static web storage");

        let bucket = ctx.declare(
            "bucket",
            ResourceKind::Bucket,
            [
                ("bucket", site.as_str().into()),
                (
                    "website",
                    Input::object([
                        ("indexDocument", INDEX_DOCUMENT.into()),
                        ("errorDocument", INDEX_DOCUMENT.into()),
                    ]),
                ),
                ("forceDestroy", false.into()),
            ],
            handle.child_options(),
        )?;

        let bucket_policy = ctx.declare(
            "bucket-policy",
            ResourceKind::BucketPolicy,
            [
                ("bucket", bucket.output("bucket")?),
                (
                    "policy",
                    Input::object([
                        ("Version", "2012-10-17".into()),
                        (
                            "Statement",
                            Input::List(vec![Input::object([
                                ("Sid", "PublicReadGetObject".into()),
                                ("Effect", "Allow".into()),
                                ("Principal", "*".into()),
                                ("Action", Input::strings(&["s3:GetObject"])),
                                (
                                    "Resource",
                                    Input::concat([bucket.output("arn")?, Input::from("/*")]),
                                ),
                            ])]),
                        ),
                    ]),
                ),
            ],
            handle.child_options(),
        )?;

        let distribution = ctx.declare(
            "distribution",
            ResourceKind::Distribution,
            [
                ("enabled", true.into()),
                ("aliases", Input::strings(&[site.as_str()])),
                ("defaultRootObject", INDEX_DOCUMENT.into()),
                (
                    "origins",
                    Input::List(vec![Input::object([
                        ("originId", site.as_str().into()),
                        ("domainName", bucket.output("websiteEndpoint")?),
                        (
                            "customOriginConfig",
                            Input::object([
                                ("httpPort", HTTP_PORT.into()),
                                ("httpsPort", HTTPS_PORT.into()),
                                ("originProtocolPolicy", "http-only".into()),
                                ("originSslProtocols", Input::strings(&["TLSv1.2"])),
                            ]),
                        ),
                    ])]),
                ),
                (
                    "defaultCacheBehavior",
                    Input::object([
                        ("targetOriginId", site.as_str().into()),
                        ("viewerProtocolPolicy", "redirect-to-https".into()),
                        ("allowedMethods", Input::strings(&["GET", "HEAD"])),
                        ("cachedMethods", Input::strings(&["GET", "HEAD"])),
                        (
                            "forwardedValues",
                            Input::object([
                                ("queryString", false.into()),
                                ("cookies", Input::object([("forward", "none".into())])),
                            ]),
                        ),
                    ]),
                ),
                (
                    "viewerCertificate",
                    Input::object([
                        ("acmCertificateArn", args.certificate_arn.as_str().into()),
                        ("sslSupportMethod", "sni-only".into()),
                    ]),
                ),
                (
                    "restrictions",
                    Input::object([(
                        "geoRestriction",
                        Input::object([("restrictionType", "none".into())]),
                    )]),
                ),
            ],
            handle.child_options(),
        )?;

        ctx.register_outputs(
            &handle,
            [
                ("bucketName", bucket.output("bucket")?),
                ("cdnDomainName", distribution.output("domainName")?),
            ],
        )?;

        Ok(Self {
            handle,
            bucket,
            bucket_policy,
            distribution,
        })
    }

    /// Name of the website bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket exposes no `bucket` output.
    pub fn bucket_name(&self) -> Result<Input> {
        self.bucket.output("bucket")
    }
}
