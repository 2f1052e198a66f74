//! YAML blueprint files read by the CLI.
//!
//! ```yaml
//! config:
//!   project: shop
//!   stack: prod
//! existingClusters:
//!   checkout:
//!     name: checkout-cluster
//!     arn: arn:aws:ecs:ap-northeast-1:123456789012:cluster/checkout-cluster
//! api:
//!   service: checkout
//!   ...
//! ```
//!
//! Exactly one of `staticWeb` or `api` must be present.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stackwright_common::config::StackwrightConfig;
use stackwright_common::error::{Result, StackwrightError};
use stackwright_core::{DeploymentContext, ExistingResource, StaticClusterLookup};
use stackwright_runtime::PlanEngine;
use stackwright_sdk::{ApiInfraComposer, ApiParams, StaticWebInfraComposer, StaticWebParams};

/// A parsed blueprint file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Blueprint {
    /// Account-level configuration.
    #[serde(default)]
    pub config: StackwrightConfig,
    /// Clusters that already exist, keyed by the service name looked up.
    #[serde(default)]
    pub existing_clusters: BTreeMap<String, ExistingResource>,
    /// Static website stack.
    #[serde(default)]
    pub static_web: Option<StaticWebParams>,
    /// Container API stack.
    #[serde(default)]
    pub api: Option<ApiParams>,
}

impl Blueprint {
    /// Reads and validates a blueprint file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading blueprint");
        let content = std::fs::read_to_string(path).map_err(|e| StackwrightError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parses and validates a blueprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the blueprint is invalid.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let blueprint: Self = serde_yaml::from_str(content)?;
        blueprint.validate()?;
        Ok(blueprint)
    }

    /// Checks the configuration and that exactly one stack is described.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::Config`] on failure.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        match (&self.static_web, &self.api) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (None, None) => Err(StackwrightError::Config {
                message: "blueprint must define either staticWeb or api".to_string(),
            }),
            (Some(_), Some(_)) => Err(StackwrightError::Config {
                message: "blueprint must not define both staticWeb and api".to_string(),
            }),
        }
    }

    /// Name of the stack this blueprint describes.
    pub const fn kind(&self) -> &'static str {
        if self.static_web.is_some() { "staticWeb" } else { "api" }
    }

    /// Composes the blueprint into a fresh planning context.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while composing.
    pub fn compose(&self) -> Result<DeploymentContext> {
        let engine = PlanEngine::from_config(&self.config);
        let mut ctx = DeploymentContext::new(self.config.clone(), Box::new(engine));
        if let Some(params) = &self.static_web {
            let _ = StaticWebInfraComposer::compose(&mut ctx, params)?;
        } else if let Some(params) = &self.api {
            let lookup = self
                .existing_clusters
                .iter()
                .fold(StaticClusterLookup::new(), |lookup, (service, cluster)| {
                    lookup.with_cluster_as(service, cluster.clone())
                });
            let _ = ApiInfraComposer::compose(&mut ctx, &lookup, params)?;
        }
        Ok(ctx)
    }
}
