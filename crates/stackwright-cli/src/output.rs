//! Formatted output helpers for CLI commands.

use serde_json::Value;
use stackwright_runtime::PlannedResource;

/// Width of section rules.
const RULE_WIDTH: usize = 48;

/// A heavy horizontal rule.
#[must_use]
pub fn rule() -> String {
    "\u{2550}".repeat(RULE_WIDTH)
}

/// Logical name of a URN: the last entry of its name path.
#[must_use]
pub fn short_urn(urn: &str) -> &str {
    let names = urn.rsplit("::").next().unwrap_or(urn);
    names.rsplit('$').next().unwrap_or(names)
}

/// Renders a plan value for humans: strings unquoted, the rest as JSON.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Detail lines printed under a planned resource.
#[must_use]
pub fn resource_details(resource: &PlannedResource) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(parent) = &resource.parent {
        lines.push(format!("parent: {}", short_urn(parent)));
    }
    if !resource.depends_on.is_empty() {
        let names: Vec<_> = resource.depends_on.iter().map(|u| short_urn(u)).collect();
        lines.push(format!("depends on: {}", names.join(", ")));
    }
    if resource.protect {
        lines.push("protected".to_string());
    }
    if !resource.ignore_changes.is_empty() {
        lines.push(format!("ignore changes: {}", resource.ignore_changes.join(", ")));
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;
    use stackwright_common::types::Urn;

    use super::*;

    fn planned(name: &str) -> PlannedResource {
        PlannedResource {
            urn: format!("urn:stackwright:prod::shop::aws:ecs:Service::{name}"),
            kind: "aws:ecs:Service".into(),
            name: name.into(),
            parent: None,
            depends_on: Vec::new(),
            protect: false,
            ignore_changes: Vec::new(),
            properties: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    #[test]
    fn short_urn_keeps_logical_name() {
        assert_eq!(
            short_urn(
                "urn:stackwright:prod::shop::stackwright:api:FargateApi$aws:lb:Listener\
                 ::fargate-api$https-listener"
            ),
            "https-listener"
        );
        assert_eq!(short_urn("plain"), "plain");
    }

    #[test]
    fn render_value_unquotes_strings() {
        assert_eq!(render_value(&json!("d123.cloudfront.net")), "d123.cloudfront.net");
        assert_eq!(render_value(&json!(60.0)), "60.0");
    }

    #[test]
    fn details_list_lifecycle_flags() {
        let api = Urn::new("prod", "shop", "stackwright:api:FargateApi", "fargate-api");
        let resource = PlannedResource {
            parent: Some(api.to_string()),
            depends_on: vec![api.child("aws:lb:Listener", "https-listener").to_string()],
            protect: true,
            ignore_changes: vec!["taskDefinition".into(), "desiredCount".into()],
            ..planned("app-svc")
        };
        assert_eq!(
            resource_details(&resource),
            [
                "parent: fargate-api",
                "depends on: https-listener",
                "protected",
                "ignore changes: taskDefinition, desiredCount",
            ]
        );
        assert!(resource_details(&planned("bare")).is_empty());
    }
}
