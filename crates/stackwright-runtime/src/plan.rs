//! Serializable snapshot of a finished deployment context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stackwright_common::error::Result;
use stackwright_core::DeploymentContext;

/// One declaration as it appears in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedResource {
    /// Unique identifier.
    pub urn: String,
    /// Type token.
    pub kind: String,
    /// Logical name.
    pub name: String,
    /// Parent URN, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Explicit dependencies.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub depends_on: Vec<String>,
    /// Deletion protection flag.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub protect: bool,
    /// Properties whose drift is ignored.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ignore_changes: Vec<String>,
    /// Rendered properties.
    pub properties: BTreeMap<String, Value>,
    /// Rendered outputs.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub outputs: BTreeMap<String, Value>,
}

/// A complete plan: declarations in dependency order plus published outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Project name.
    pub project: String,
    /// Stack name.
    pub stack: String,
    /// Declarations, dependencies first.
    pub resources: Vec<PlannedResource>,
    /// Outputs published by components, keyed by component URN.
    pub component_outputs: BTreeMap<String, BTreeMap<String, Value>>,
    /// Stack-level exports.
    pub exports: BTreeMap<String, Value>,
}

impl Plan {
    /// Captures every declaration and output recorded in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the dependency graph cannot be ordered.
    pub fn capture(ctx: &DeploymentContext) -> Result<Self> {
        let order = ctx.graph()?.resolve_order()?;
        let resources = order
            .iter()
            .filter_map(|urn| {
                let declaration = ctx.declaration(urn)?;
                let outputs = ctx
                    .outputs_of(urn)
                    .map(|outputs| {
                        outputs
                            .iter()
                            .map(|(k, v)| {
                                (k.clone(), v.cell().get().cloned().unwrap_or(Value::Null))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Some(PlannedResource {
                    urn: urn.to_string(),
                    kind: declaration.kind.token().to_string(),
                    name: declaration.name.clone(),
                    parent: declaration.options.parent.as_ref().map(ToString::to_string),
                    depends_on: declaration
                        .options
                        .depends_on
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                    protect: declaration.options.protect,
                    ignore_changes: declaration.options.ignore_changes.clone(),
                    properties: declaration
                        .properties
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json()))
                        .collect(),
                    outputs,
                })
            })
            .collect();

        let component_outputs = ctx
            .component_outputs()
            .iter()
            .map(|(urn, outputs)| {
                (
                    urn.to_string(),
                    outputs.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
                )
            })
            .collect();

        let exports = ctx
            .exports()
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();

        Ok(Self {
            project: ctx.config().project.clone(),
            stack: ctx.config().stack.clone(),
            resources,
            component_outputs,
            exports,
        })
    }

    /// Finds a planned resource by logical name.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&PlannedResource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Planned resources of one type token.
    #[must_use]
    pub fn resources_of(&self, kind: &str) -> Vec<&PlannedResource> {
        self.resources.iter().filter(|r| r.kind == kind).collect()
    }

    /// Renders the plan as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use stackwright_common::config::StackwrightConfig;
    use stackwright_core::{ResourceKind, ResourceOptions};

    use super::*;
    use crate::engine::PlanEngine;

    fn planned_context() -> DeploymentContext {
        let config = StackwrightConfig::default();
        let mut ctx =
            DeploymentContext::new(config.clone(), Box::new(PlanEngine::from_config(&config)));
        let root = ctx
            .register_component("stackwright:test:Root", "root", None)
            .expect("root");
        let lb = ctx
            .declare("lb", ResourceKind::LoadBalancer, [], root.child_options())
            .expect("lb");
        ctx.register_outputs(&root, [("dns", lb.output("dnsName").expect("dns"))])
            .expect("outputs");
        ctx.export("dns", lb.output("dnsName").expect("dns")).expect("export");
        let _ = ctx
            .declare(
                "cluster",
                ResourceKind::Cluster,
                [("name", "c".into())],
                ResourceOptions::default().protect(true),
            )
            .expect("cluster");
        ctx
    }

    #[test]
    fn capture_orders_parents_first() {
        let plan = Plan::capture(&planned_context()).expect("plan");
        let pos = |name: &str| plan.resources.iter().position(|r| r.name == name).expect(name);
        assert!(pos("root") < pos("lb"));
        assert_eq!(plan.resources.len(), 3);
    }

    #[test]
    fn capture_renders_exports_and_flags() {
        let plan = Plan::capture(&planned_context()).expect("plan");
        let dns = plan.exports["dns"].as_str().expect("dns");
        assert!(dns.ends_with(".elb.amazonaws.com"));
        assert!(plan.resource("cluster").expect("cluster").protect);
        assert_eq!(plan.component_outputs.len(), 1);
    }

    #[test]
    fn json_omits_default_flags() {
        let plan = Plan::capture(&planned_context()).expect("plan");
        let json = plan.to_json_pretty().expect("json");
        let back: Plan = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, plan);
        assert_eq!(json.matches("\"protect\"").count(), 1);
    }
}
