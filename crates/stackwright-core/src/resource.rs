//! Resource kinds, declarations, and lifecycle options.

use std::collections::BTreeMap;
use std::fmt;

use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::Urn;

use crate::input::{Input, OutputRef};

/// The kind of cloud resource being declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A grouping node with a caller-chosen type token.
    Component(String),
    /// ECS cluster.
    Cluster,
    /// ECS task definition.
    TaskDefinition,
    /// ECS service.
    Service,
    /// Application load balancer.
    LoadBalancer,
    /// Load balancer target group.
    TargetGroup,
    /// Load balancer listener.
    Listener,
    /// Application autoscaling target.
    ScalingTarget,
    /// Application autoscaling policy.
    ScalingPolicy,
    /// S3 bucket.
    Bucket,
    /// S3 bucket policy.
    BucketPolicy,
    /// CloudFront distribution.
    Distribution,
    /// CodeBuild project.
    BuildProject,
    /// CodePipeline pipeline.
    Pipeline,
    /// Pipeline notification rule.
    NotificationRule,
}

impl ResourceKind {
    /// Returns the type token, e.g. `aws:ecs:Service`.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::Component(token) => token,
            Self::Cluster => "aws:ecs:Cluster",
            Self::TaskDefinition => "aws:ecs:TaskDefinition",
            Self::Service => "aws:ecs:Service",
            Self::LoadBalancer => "aws:lb:LoadBalancer",
            Self::TargetGroup => "aws:lb:TargetGroup",
            Self::Listener => "aws:lb:Listener",
            Self::ScalingTarget => "aws:appautoscaling:Target",
            Self::ScalingPolicy => "aws:appautoscaling:Policy",
            Self::Bucket => "aws:s3:Bucket",
            Self::BucketPolicy => "aws:s3:BucketPolicy",
            Self::Distribution => "aws:cloudfront:Distribution",
            Self::BuildProject => "aws:codebuild:Project",
            Self::Pipeline => "aws:codepipeline:Pipeline",
            Self::NotificationRule => "aws:codestarnotifications:NotificationRule",
        }
    }

    /// Whether the kind accepts a `tags` property.
    #[must_use]
    pub const fn is_taggable(&self) -> bool {
        !matches!(
            self,
            Self::Component(_) | Self::ScalingPolicy | Self::BucketPolicy
        )
    }

    /// Output properties the engine resolves for this kind.
    #[must_use]
    pub const fn output_properties(&self) -> &'static [&'static str] {
        match self {
            Self::Component(_) => &[],
            Self::Cluster => &["arn", "name"],
            Self::TaskDefinition => &["arn", "family", "revision"],
            Self::Service => &["id", "name"],
            Self::LoadBalancer => &["arn", "dnsName", "zoneId"],
            Self::TargetGroup => &["arn", "name"],
            Self::Listener | Self::NotificationRule => &["arn"],
            Self::ScalingTarget => &["resourceId"],
            Self::ScalingPolicy | Self::BuildProject | Self::Pipeline => &["arn", "name"],
            Self::Bucket => &["arn", "bucket", "websiteEndpoint", "bucketRegionalDomainName"],
            Self::BucketPolicy => &["id"],
            Self::Distribution => &["arn", "domainName", "id"],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Lifecycle and ordering options attached to a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Owning component, if any.
    pub parent: Option<Urn>,
    /// Resources that must exist first, beyond what property references imply.
    pub depends_on: Vec<Urn>,
    /// Refuse deletion of the realized resource.
    pub protect: bool,
    /// Properties whose later drift is not reverted.
    pub ignore_changes: Vec<String>,
}

impl ResourceOptions {
    /// Options with the given parent.
    #[must_use]
    pub fn parent(parent: &Urn) -> Self {
        Self {
            parent: Some(parent.clone()),
            ..Self::default()
        }
    }

    /// Adds an explicit dependency.
    #[must_use]
    pub fn depends_on(mut self, urn: &Urn) -> Self {
        self.depends_on.push(urn.clone());
        self
    }

    /// Marks the resource as protected from deletion.
    #[must_use]
    pub const fn protect(mut self, protect: bool) -> Self {
        self.protect = protect;
        self
    }

    /// Ignores later changes to `property`.
    #[must_use]
    pub fn ignore_changes(mut self, property: impl Into<String>) -> Self {
        self.ignore_changes.push(property.into());
        self
    }
}

/// A concrete request for one cloud resource.
#[derive(Debug, Clone)]
pub struct ResourceDeclaration {
    /// Unique identifier.
    pub urn: Urn,
    /// Logical name, unique within the parent.
    pub name: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Property bag.
    pub properties: BTreeMap<String, Input>,
    /// Lifecycle and ordering options.
    pub options: ResourceOptions,
}

impl ResourceDeclaration {
    /// Every output this declaration's properties read.
    #[must_use]
    pub fn references(&self) -> Vec<&OutputRef> {
        self.properties
            .values()
            .flat_map(Input::references)
            .collect()
    }

    /// Looks up a property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Input> {
        self.properties.get(key)
    }
}

/// Handle to a declared resource and its deferred outputs.
#[derive(Debug, Clone)]
pub struct DeclaredResource {
    /// Identifier of the declaration.
    pub urn: Urn,
    /// Resource kind.
    pub kind: ResourceKind,
    outputs: BTreeMap<String, OutputRef>,
}

impl DeclaredResource {
    pub(crate) const fn new(
        urn: Urn,
        kind: ResourceKind,
        outputs: BTreeMap<String, OutputRef>,
    ) -> Self {
        Self { urn, kind, outputs }
    }

    /// Returns an input that reads the named output.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::UnknownOutput`] if the kind does not
    /// expose `property`.
    pub fn output(&self, property: &str) -> Result<Input> {
        self.output_ref(property).map(|r| Input::Output(r.clone()))
    }

    /// Returns the raw reference for the named output.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::UnknownOutput`] if the kind does not
    /// expose `property`.
    pub fn output_ref(&self, property: &str) -> Result<&OutputRef> {
        self.outputs
            .get(property)
            .ok_or_else(|| StackwrightError::UnknownOutput {
                urn: self.urn.to_string(),
                property: property.to_string(),
            })
    }

    /// All outputs, keyed by property name.
    #[must_use]
    pub const fn outputs(&self) -> &BTreeMap<String, OutputRef> {
        &self.outputs
    }
}
