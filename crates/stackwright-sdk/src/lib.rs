//! # stackwright-sdk
//!
//! Entry points for composing a whole stack in one call.
//!
//! - [`StaticWebInfraComposer`](static_web::StaticWebInfraComposer): website
//!   bucket and CDN plus the pipeline that publishes into it. Exports
//!   `bucketName`.
//! - [`ApiInfraComposer`](api::ApiInfraComposer): Fargate service behind a
//!   load balancer plus the pipeline that deploys it. Exports `dns`.
//!
//! # Example
//!
//! ```rust,no_run
//! use stackwright_common::config::StackwrightConfig;
//! use stackwright_core::DeploymentContext;
//! use stackwright_runtime::PlanEngine;
//! use stackwright_sdk::static_web::{StaticWebInfraComposer, StaticWebParams};
//!
//! # fn params() -> StaticWebParams { unimplemented!() }
//! let config = StackwrightConfig::default();
//! let engine = PlanEngine::from_config(&config);
//! let mut ctx = DeploymentContext::new(config, Box::new(engine));
//! let _stack = StaticWebInfraComposer::compose(&mut ctx, &params())?;
//! # Ok::<(), stackwright_common::error::StackwrightError>(())
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod api;
pub mod static_web;

pub use api::{ApiInfraComposer, ApiParams};
pub use static_web::{StaticWebInfraComposer, StaticWebParams};
