//! # stackwright-compose
//!
//! Component blueprints that declare cloud resources into a
//! [`DeploymentContext`](stackwright_core::DeploymentContext).
//!
//! Handles:
//! - **Cluster**: create-or-reuse resolution of the ECS cluster.
//! - **Load balancer**: ALB, target group, redirecting HTTP listener, and
//!   forwarding HTTPS listener.
//! - **Container API**: task definition, service, and CPU autoscaling.
//! - **Container template**: the fixed app + log-router container list.
//! - **Web storage**: website bucket, public-read policy, and CDN.
//! - **CI/CD**: build project, pipeline, and notifications for both stacks.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod api_cicd;
pub mod cicd;
pub mod cluster;
pub mod container_api;
pub mod container_template;
pub mod load_balancer;
pub mod web_cicd;
pub mod web_storage;

pub use api_cicd::ApiCICDComponent;
pub use cicd::{CicdComponent, DeployTarget, GitRepository, PipelineRoles, PipelineSettings};
pub use cluster::{ClusterOrigin, ClusterRef};
pub use container_api::{ContainerApiArgs, ContainerApiComponent};
pub use load_balancer::{LoadBalancerArgs, LoadBalancerOutputs, LoadBalancerSubcomponent};
pub use web_cicd::WebCICDComponent;
pub use web_storage::{WebStorageArgs, WebStorageComponent};
