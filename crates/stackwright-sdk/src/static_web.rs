//! Static website stack: storage, CDN, and publishing pipeline.

use serde::{Deserialize, Serialize};
use stackwright_common::error::Result;
use stackwright_common::types::{Tags, qualified_name};
use stackwright_compose::{PipelineSettings, WebCICDComponent, WebStorageArgs, WebStorageComponent};
use stackwright_core::DeploymentContext;

/// Parameters of the static website stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticWebParams {
    /// Host label; the site is served at `{host}.{domain}`.
    pub host: String,
    /// Parent domain.
    pub domain: String,
    /// Service name, used for tags and the pipeline name.
    pub service: String,
    /// Environment name.
    pub env: String,
    /// Certificate for `{host}.{domain}`.
    pub domain_ssl_cert_arn: String,
    /// Pipeline options.
    pub pipeline: PipelineSettings,
}

/// Result of [`StaticWebInfraComposer::compose`].
#[derive(Debug, Clone)]
pub struct StaticWebInfraComposer {
    /// Bucket, policy, and CDN.
    pub storage: WebStorageComponent,
    /// Publishing pipeline.
    pub cicd: WebCICDComponent,
}

impl StaticWebInfraComposer {
    /// Declares the whole static website stack and exports `bucketName`.
    ///
    /// Nothing is exported unless every stage succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a stage, unchanged.
    pub fn compose(ctx: &mut DeploymentContext, params: &StaticWebParams) -> Result<Self> {
        tracing::info!(service = %params.service, env = %params.env, "composing static web stack");
        ctx.register_auto_tags(Tags::for_service(&params.env, &params.service));
        let name = qualified_name(&params.service, &params.env);

        let storage = WebStorageComponent::build(
            ctx,
            &WebStorageArgs {
                name: name.clone(),
                host: params.host.clone(),
                domain: params.domain.clone(),
                certificate_arn: params.domain_ssl_cert_arn.clone(),
            },
        )?;
        let bucket_name = storage.bucket_name()?;

        let cicd = WebCICDComponent::build(ctx, &name, bucket_name.clone(), &params.pipeline)?;

        ctx.export("bucketName", bucket_name)?;
        Ok(Self { storage, cicd })
    }
}
