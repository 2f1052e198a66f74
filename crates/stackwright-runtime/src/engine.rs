//! In-memory engine that plans declarations without calling any provider.

use std::collections::BTreeMap;

use stackwright_common::config::StackwrightConfig;
use stackwright_common::error::Result;
use stackwright_common::types::Urn;
use stackwright_core::{Input, OutputRef, ResourceDeclaration, ResourceEngine};

use crate::naming;

/// Deterministic engine used for plan previews and tests.
///
/// Outputs are resolved as soon as a declaration is accepted. Because
/// declarations arrive in dependency order, any output a property reads is
/// already resolved when the reader is planned.
#[derive(Debug, Clone)]
pub struct PlanEngine {
    region: String,
    account_id: String,
    accepted: usize,
    exports: usize,
}

impl PlanEngine {
    /// Creates an engine that synthesizes identifiers in `region` under `account_id`.
    #[must_use]
    pub fn new(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account_id: account_id.into(),
            accepted: 0,
            exports: 0,
        }
    }

    /// Creates an engine from the region and account in `config`.
    #[must_use]
    pub fn from_config(config: &StackwrightConfig) -> Self {
        Self::new(&config.region, &config.account_id)
    }

    /// Number of declarations accepted so far.
    #[must_use]
    pub const fn accepted(&self) -> usize {
        self.accepted
    }

    /// Number of stack exports recorded so far.
    #[must_use]
    pub const fn exported(&self) -> usize {
        self.exports
    }
}

impl ResourceEngine for PlanEngine {
    fn register_resource(
        &mut self,
        declaration: &ResourceDeclaration,
        outputs: &BTreeMap<String, OutputRef>,
    ) -> Result<()> {
        tracing::debug!(
            urn = %declaration.urn,
            kind = %declaration.kind,
            protect = declaration.options.protect,
            "planning resource"
        );
        for (property, output) in outputs {
            let value = naming::synthesize(declaration, property, &self.region, &self.account_id);
            output.resolve(value)?;
        }
        self.accepted += 1;
        Ok(())
    }

    fn register_outputs(
        &mut self,
        component: &Urn,
        outputs: &BTreeMap<String, Input>,
    ) -> Result<()> {
        tracing::debug!(
            component = %component,
            outputs = ?outputs.keys().collect::<Vec<_>>(),
            "component outputs registered"
        );
        Ok(())
    }

    fn export(&mut self, name: &str, value: &Input) -> Result<()> {
        tracing::debug!(export = name, value = %value.to_json(), "planning export");
        self.exports += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use stackwright_core::{DeploymentContext, ResourceKind, ResourceOptions};

    use super::*;

    #[test]
    fn outputs_resolve_on_declaration() {
        let config = StackwrightConfig::default();
        let mut ctx =
            DeploymentContext::new(config.clone(), Box::new(PlanEngine::from_config(&config)));
        let cluster = ctx
            .declare(
                "checkout",
                ResourceKind::Cluster,
                [("name", "checkout".into())],
                ResourceOptions::default(),
            )
            .expect("cluster");

        let arn = cluster.output_ref("arn").expect("arn");
        assert_eq!(
            arn.cell().get().and_then(|v| v.as_str()),
            Some("arn:aws:ecs:ap-northeast-1:000000000000:cluster/checkout")
        );
    }

    #[test]
    fn references_resolve_through_templates() {
        let config = StackwrightConfig::default();
        let mut ctx =
            DeploymentContext::new(config.clone(), Box::new(PlanEngine::from_config(&config)));
        let cluster = ctx
            .declare(
                "checkout",
                ResourceKind::Cluster,
                [("name", "checkout".into())],
                ResourceOptions::default(),
            )
            .expect("cluster");
        let target = ctx
            .declare(
                "autoscale-target",
                ResourceKind::ScalingTarget,
                [(
                    "resourceId",
                    Input::template(vec![
                        stackwright_core::TemplatePart::Text("service/".into()),
                        stackwright_core::TemplatePart::Output(
                            cluster.output_ref("name").expect("name").clone(),
                        ),
                    ]),
                )],
                ResourceOptions::default(),
            )
            .expect("target");
        assert_eq!(
            target.output("resourceId").expect("id").to_json(),
            serde_json::json!("service/checkout")
        );
    }
}
