//! Create-or-reuse resolution of the ECS cluster.
//!
//! Downstream declarations only see a [`ClusterRef`]; whether the cluster
//! was found or declared here does not change how it is consumed.

use stackwright_common::config::LookupErrorPolicy;
use stackwright_common::error::{Result, StackwrightError};
use stackwright_core::{
    ClusterLookup, ComponentHandle, DeclaredResource, DeploymentContext, ExistingResource, Input,
    LookupOutcome, ResourceKind,
};

/// Where a cluster came from.
#[derive(Debug, Clone)]
pub enum ClusterOrigin {
    /// The cluster already existed and is only referenced.
    Existing(ExistingResource),
    /// The cluster was declared by this deployment.
    Declared(DeclaredResource),
}

/// Name and ARN of the cluster a service runs on.
#[derive(Debug, Clone)]
pub struct ClusterRef {
    /// Cluster name.
    pub name: Input,
    /// Cluster ARN.
    pub arn: Input,
    /// Origin of the cluster.
    pub origin: ClusterOrigin,
}

impl ClusterRef {
    fn existing(resource: ExistingResource) -> Self {
        Self {
            name: Input::string(&resource.name),
            arn: Input::string(&resource.arn),
            origin: ClusterOrigin::Existing(resource),
        }
    }

    fn declared(resource: DeclaredResource) -> Result<Self> {
        Ok(Self {
            name: resource.output("name")?,
            arn: resource.output("arn")?,
            origin: ClusterOrigin::Declared(resource),
        })
    }

    /// Returns `true` if the cluster was declared by this deployment.
    #[must_use]
    pub const fn is_declared(&self) -> bool {
        matches!(self.origin, ClusterOrigin::Declared(_))
    }
}

/// Finds the cluster named `service` or declares it under `parent`.
///
/// A failed lookup follows the configured [`LookupErrorPolicy`].
///
/// # Errors
///
/// Returns [`StackwrightError::Lookup`] when the lookup fails and the policy
/// is [`LookupErrorPolicy::Abort`], or any error from declaring the cluster.
pub fn resolve_cluster(
    ctx: &mut DeploymentContext,
    lookup: &dyn ClusterLookup,
    service: &str,
    parent: &ComponentHandle,
) -> Result<ClusterRef> {
    match lookup.lookup_cluster(service) {
        LookupOutcome::Found(existing) => {
            tracing::info!(
                cluster = %existing.name,
                arn = %existing.arn,
                "reusing existing ecs cluster"
            );
            Ok(ClusterRef::existing(existing))
        }
        LookupOutcome::NotFound => {
            tracing::info!(cluster = service, "ecs cluster does not exist, declaring it");
            declare_cluster(ctx, service, parent)
        }
        LookupOutcome::LookupError(message) => match ctx.config().lookup_error_policy {
            LookupErrorPolicy::CreateNew => {
                tracing::warn!(
                    cluster = service,
                    error = %message,
                    "ecs cluster lookup failed, declaring a new cluster"
                );
                declare_cluster(ctx, service, parent)
            }
            LookupErrorPolicy::Abort => Err(StackwrightError::Lookup {
                kind: "ecs cluster",
                name: service.to_string(),
                message,
            }),
        },
    }
}

fn declare_cluster(
    ctx: &mut DeploymentContext,
    service: &str,
    parent: &ComponentHandle,
) -> Result<ClusterRef> {
    let insights = if ctx.config().container_insights {
        "enabled"
    } else {
        "disabled"
    };
    let cluster = ctx.declare(
        service,
        ResourceKind::Cluster,
        [
            ("name", Input::string(service)),
            (
                "settings",
                Input::List(vec![Input::object([
                    ("name", "containerInsights".into()),
                    ("value", insights.into()),
                ])]),
            ),
        ],
        parent.child_options().protect(true),
    )?;
    ClusterRef::declared(cluster)
}

#[cfg(test)]
mod tests {
    use stackwright_common::config::StackwrightConfig;
    use stackwright_runtime::PlanEngine;

    use super::*;

    fn context(config: StackwrightConfig) -> (DeploymentContext, ComponentHandle) {
        let engine = PlanEngine::from_config(&config);
        let mut ctx = DeploymentContext::new(config, Box::new(engine));
        let root = ctx
            .register_component("stackwright:api:FargateApi", "fargate-api", None)
            .expect("root");
        (ctx, root)
    }

    #[test]
    fn found_cluster_is_not_declared() {
        let (mut ctx, root) = context(StackwrightConfig::default());
        let found = |_: &str| {
            LookupOutcome::Found(ExistingResource {
                name: "checkout-cluster".into(),
                arn: "arn:aws:ecs:ap-northeast-1:1:cluster/checkout-cluster".into(),
            })
        };
        let cluster = resolve_cluster(&mut ctx, &found, "checkout", &root).expect("cluster");
        assert!(!cluster.is_declared());
        assert_eq!(cluster.name.as_literal_str(), Some("checkout-cluster"));
        assert!(ctx.declarations_of(&ResourceKind::Cluster).is_empty());
    }

    #[test]
    fn missing_cluster_is_declared_protected() {
        let (mut ctx, root) = context(StackwrightConfig::default());
        let missing = |_: &str| LookupOutcome::NotFound;
        let cluster = resolve_cluster(&mut ctx, &missing, "checkout", &root).expect("cluster");
        assert!(cluster.is_declared());

        let clusters = ctx.declarations_of(&ResourceKind::Cluster);
        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].options.protect);
        assert_eq!(clusters[0].name, "checkout");
        assert_eq!(
            clusters[0].property("settings").map(Input::to_json),
            Some(serde_json::json!([{"name": "containerInsights", "value": "enabled"}]))
        );
    }

    #[test]
    fn lookup_error_creates_by_default() {
        let (mut ctx, root) = context(StackwrightConfig::default());
        let failing = |_: &str| LookupOutcome::LookupError("RequestLimitExceeded".into());
        let cluster = resolve_cluster(&mut ctx, &failing, "checkout", &root).expect("cluster");
        assert!(cluster.is_declared());
        assert_eq!(ctx.declarations_of(&ResourceKind::Cluster).len(), 1);
    }

    #[test]
    fn lookup_error_aborts_when_configured() {
        let config = StackwrightConfig {
            lookup_error_policy: LookupErrorPolicy::Abort,
            ..StackwrightConfig::default()
        };
        let (mut ctx, root) = context(config);
        let failing = |_: &str| LookupOutcome::LookupError("RequestLimitExceeded".into());
        let err = resolve_cluster(&mut ctx, &failing, "checkout", &root).unwrap_err();
        assert!(matches!(err, StackwrightError::Lookup { .. }));
        assert!(ctx.declarations_of(&ResourceKind::Cluster).is_empty());
    }

    #[test]
    fn insights_can_be_disabled() {
        let config = StackwrightConfig {
            container_insights: false,
            ..StackwrightConfig::default()
        };
        let (mut ctx, root) = context(config);
        let missing = |_: &str| LookupOutcome::NotFound;
        let _ = resolve_cluster(&mut ctx, &missing, "checkout", &root).expect("cluster");
        let settings = ctx.declarations_of(&ResourceKind::Cluster)[0]
            .property("settings")
            .map(Input::to_json);
        assert_eq!(
            settings,
            Some(serde_json::json!([{"name": "containerInsights", "value": "disabled"}]))
        );
    }
}
