//! Domain primitive types used across the Stackwright workspace.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a declared resource or component.
///
/// Formatted as `urn:stackwright:<stack>::<project>::<type path>::<name path>`.
/// The type path joins the kinds of every ancestor with `$`, and the name
/// path joins their logical names the same way, so two parents sharing a
/// kind still give their children distinct URNs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Urn(String);

impl Urn {
    /// Builds a URN from its parts.
    #[must_use]
    pub fn new(stack: &str, project: &str, type_path: &str, name: &str) -> Self {
        Self(format!(
            "urn:{}:{stack}::{project}::{type_path}::{name}",
            crate::constants::APP_NAME
        ))
    }

    /// Builds the URN of a child declared under `self`.
    #[must_use]
    pub fn child(&self, token: &str, name: &str) -> Self {
        match self.0.rsplit_once("::") {
            Some((head, parent_names)) => Self(format!("{head}${token}::{parent_names}${name}")),
            None => Self(format!("{}${token}::{name}", self.0)),
        }
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `$`-joined type path.
    #[must_use]
    pub fn type_path(&self) -> &str {
        self.0.split("::").nth(2).unwrap_or_default()
    }

    /// Returns the `$`-joined names of every ancestor and the resource itself.
    #[must_use]
    pub fn name_path(&self) -> &str {
        self.0.splitn(4, "::").nth(3).unwrap_or_default()
    }

    /// Returns the logical name (the last segment of the name path).
    #[must_use]
    pub fn name(&self) -> &str {
        self.name_path().rsplit('$').next().unwrap_or_default()
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Joins a service and environment into the `<service>-<env>` form used for
/// service, target group, and pipeline names.
#[must_use]
pub fn qualified_name(service: &str, environment: &str) -> String {
    format!("{service}-{environment}")
}

/// Key/value tags stamped onto taggable resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    /// Creates an empty tag set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// The standard environment + service tags applied by every composer.
    #[must_use]
    pub fn for_service(environment: &str, service: &str) -> Self {
        Self::new()
            .with(crate::constants::TAG_ENVIRONMENT, environment)
            .with(crate::constants::TAG_NAME, service)
    }

    /// Adds or replaces a tag.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.0.insert(key.into(), value.into());
        self
    }

    /// Merges `other` into `self`. Keys already present in `self` win.
    pub fn merge_missing(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            let _ = self.0.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    /// Looks up a tag value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns `true` when no tags are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates tags in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
