//! Account-level configuration for the blueprints.
//!
//! Role ARNs, S3 locations, and other account-specific values are supplied
//! here rather than embedded in composition logic.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StackwrightError};

/// What to do when an existing-resource lookup fails for a reason other
/// than "not found".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupErrorPolicy {
    /// Treat the failure as "not found" and declare a new resource.
    #[default]
    CreateNew,
    /// Abort the enclosing component with the lookup error.
    Abort,
}

/// Root configuration shared by every composer invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackwrightConfig {
    /// Project name, embedded in every URN.
    pub project: String,
    /// Stack (deployment) name, embedded in every URN.
    pub stack: String,
    /// Region used when synthesizing identifiers.
    pub region: String,
    /// Account id used when synthesizing identifiers.
    pub account_id: String,
    /// Region the log router ships container logs to.
    pub log_region: String,
    /// Image of the log router sidecar.
    pub log_router_image: String,
    /// S3 ARN of the shared fluent-bit configuration file.
    pub firelens_config_arn: Option<String>,
    /// Build role for the static-web pipeline.
    pub static_web_build_role_arn: Option<String>,
    /// Pipeline execution role for the static-web pipeline.
    pub static_web_pipeline_role_arn: Option<String>,
    /// Bucket that stores pipeline artifacts.
    pub artifact_bucket: String,
    /// Topic that receives pipeline notifications.
    pub notification_topic_arn: Option<String>,
    /// Whether new clusters get container insights.
    pub container_insights: bool,
    /// Handling of failed cluster lookups.
    pub lookup_error_policy: LookupErrorPolicy,
}

impl Default for StackwrightConfig {
    fn default() -> Self {
        Self {
            project: crate::constants::APP_NAME.to_string(),
            stack: "dev".to_string(),
            region: crate::constants::DEFAULT_REGION.to_string(),
            account_id: "000000000000".to_string(),
            log_region: crate::constants::DEFAULT_LOG_REGION.to_string(),
            log_router_image: crate::constants::DEFAULT_LOG_ROUTER_IMAGE.to_string(),
            firelens_config_arn: None,
            static_web_build_role_arn: None,
            static_web_pipeline_role_arn: None,
            artifact_bucket: "stackwright-pipeline-artifacts".to_string(),
            notification_topic_arn: None,
            container_insights: true,
            lookup_error_policy: LookupErrorPolicy::default(),
        }
    }
}

impl StackwrightConfig {
    /// Parses a configuration from YAML, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the result fails
    /// [`validate`](Self::validate).
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that identifiers used in URNs are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if `project` or `stack` is empty or contains `::`.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("project", &self.project), ("stack", &self.stack)] {
            if value.is_empty() || value.contains("::") {
                return Err(StackwrightError::Config {
                    message: format!("{field} must be non-empty and must not contain \"::\""),
                });
            }
        }
        Ok(())
    }

    /// Returns a required optional field or a configuration error naming it.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is `None`.
    pub fn require<'a>(value: Option<&'a String>, field: &str) -> Result<&'a str> {
        value.map(String::as_str).ok_or_else(|| StackwrightError::Config {
            message: format!("{field} is required"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_insights_and_create_new() {
        let config = StackwrightConfig::default();
        assert!(config.container_insights);
        assert_eq!(config.lookup_error_policy, LookupErrorPolicy::CreateNew);
        assert_eq!(config.log_region, "ap-northeast-1");
    }

    #[test]
    fn yaml_overrides_selected_fields() {
        let config = StackwrightConfig::from_yaml_str(
            "stack: prod\nlookupErrorPolicy: abort\nstaticWebBuildRoleArn: arn:aws:iam::1:role/b\n",
        )
        .expect("parse");
        assert_eq!(config.stack, "prod");
        assert_eq!(config.lookup_error_policy, LookupErrorPolicy::Abort);
        assert_eq!(
            config.static_web_build_role_arn.as_deref(),
            Some("arn:aws:iam::1:role/b")
        );
        assert_eq!(config.project, "stackwright");
    }

    #[test]
    fn empty_stack_is_rejected() {
        let err = StackwrightConfig::from_yaml_str("stack: \"\"\n").unwrap_err();
        assert!(err.to_string().contains("stack"));
    }

    #[test]
    fn require_reports_missing_field() {
        let err = StackwrightConfig::require(None, "artifactBucket").unwrap_err();
        assert!(err.to_string().contains("artifactBucket is required"));
    }
}
