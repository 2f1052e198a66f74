//! Plan engine and plan snapshots for the Stackwright blueprints.
//!
//! [`PlanEngine`](engine::PlanEngine) stands in for a live infrastructure
//! engine: it accepts declarations in order and resolves their outputs with
//! deterministic synthesized identifiers. [`Plan`](plan::Plan) captures a
//! finished deployment context as a serializable snapshot.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod engine;
pub mod naming;
pub mod plan;

pub use engine::PlanEngine;
pub use plan::{Plan, PlannedResource};
