//! # stackwright-core
//!
//! The declaration model every blueprint is written against.
//!
//! Handles:
//! - **Deferred**: write-once output cells resolved by the engine.
//! - **Input**: property values that mix literals with references to other
//!   resources' outputs.
//! - **Resource**: resource kinds, declarations, and lifecycle options.
//! - **Engine**: the black-box [`ResourceEngine`](engine::ResourceEngine) seam.
//! - **Lookup**: existing-resource lookup with an explicit three-way outcome.
//! - **Context**: the [`DeploymentContext`](context::DeploymentContext) that
//!   records declarations, applies auto-tags, and enforces naming rules.
//! - **Graph**: a single dependency graph built from parent, explicit, and
//!   reference edges.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod context;
pub mod deferred;
pub mod engine;
pub mod graph;
pub mod input;
pub mod lookup;
pub mod resource;

pub use context::{ComponentHandle, DeploymentContext};
pub use deferred::Deferred;
pub use engine::ResourceEngine;
pub use graph::{DependencyGraph, EdgeKind};
pub use input::{Input, OutputRef, TemplatePart};
pub use lookup::{ClusterLookup, ExistingResource, LookupOutcome, StaticClusterLookup};
pub use resource::{DeclaredResource, ResourceDeclaration, ResourceKind, ResourceOptions};
