//! Lookup of resources that already exist outside this deployment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A resource found by lookup, standing in for a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingResource {
    /// Resource name.
    pub name: String,
    /// Resource ARN.
    pub arn: String,
}

/// Result of an existing-resource lookup.
///
/// Lookup failures are kept apart from genuine absence so the caller
/// decides how to treat them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The resource exists.
    Found(ExistingResource),
    /// The resource does not exist.
    NotFound,
    /// The lookup itself failed; existence is unknown.
    LookupError(String),
}

/// Looks up ECS clusters by name.
pub trait ClusterLookup {
    /// Looks up the cluster called `name`.
    fn lookup_cluster(&self, name: &str) -> LookupOutcome;
}

impl<F> ClusterLookup for F
where
    F: Fn(&str) -> LookupOutcome,
{
    fn lookup_cluster(&self, name: &str) -> LookupOutcome {
        self(name)
    }
}

/// Lookup over a fixed set of known clusters.
#[derive(Debug, Clone, Default)]
pub struct StaticClusterLookup {
    clusters: BTreeMap<String, ExistingResource>,
}

impl StaticClusterLookup {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a known cluster, found under its own name.
    #[must_use]
    pub fn with_cluster(self, cluster: ExistingResource) -> Self {
        let key = cluster.name.clone();
        self.with_cluster_as(key, cluster)
    }

    /// Adds a known cluster found when `key` is looked up.
    #[must_use]
    pub fn with_cluster_as(mut self, key: impl Into<String>, cluster: ExistingResource) -> Self {
        let _ = self.clusters.insert(key.into(), cluster);
        self
    }
}

impl FromIterator<ExistingResource> for StaticClusterLookup {
    fn from_iter<I: IntoIterator<Item = ExistingResource>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with_cluster)
    }
}

impl ClusterLookup for StaticClusterLookup {
    fn lookup_cluster(&self, name: &str) -> LookupOutcome {
        self.clusters
            .get(name)
            .cloned()
            .map_or(LookupOutcome::NotFound, LookupOutcome::Found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkout() -> ExistingResource {
        ExistingResource {
            name: "checkout-cluster".into(),
            arn: "arn:aws:ecs:ap-northeast-1:123456789012:cluster/checkout-cluster".into(),
        }
    }

    #[test]
    fn static_lookup_finds_known_cluster() {
        let lookup = StaticClusterLookup::new().with_cluster(checkout());
        assert_eq!(
            lookup.lookup_cluster("checkout-cluster"),
            LookupOutcome::Found(checkout())
        );
        assert_eq!(lookup.lookup_cluster("billing"), LookupOutcome::NotFound);
    }

    #[test]
    fn lookup_key_may_differ_from_cluster_name() {
        let lookup = StaticClusterLookup::new().with_cluster_as("checkout", checkout());
        assert_eq!(lookup.lookup_cluster("checkout"), LookupOutcome::Found(checkout()));
        assert_eq!(lookup.lookup_cluster("checkout-cluster"), LookupOutcome::NotFound);
    }

    #[test]
    fn closures_are_lookups() {
        let failing = |_: &str| LookupOutcome::LookupError("throttled".into());
        assert_eq!(
            failing.lookup_cluster("any"),
            LookupOutcome::LookupError("throttled".into())
        );
    }

    #[test]
    fn collects_from_iterator() {
        let lookup: StaticClusterLookup = vec![checkout()].into_iter().collect();
        assert!(matches!(
            lookup.lookup_cluster("checkout-cluster"),
            LookupOutcome::Found(_)
        ));
    }
}
