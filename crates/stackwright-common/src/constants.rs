//! Fixed values baked into the blueprints.
//!
//! Anything account- or environment-specific lives in
//! [`StackwrightConfig`](crate::config::StackwrightConfig) instead.

/// Application name used in URNs and CLI output.
pub const APP_NAME: &str = "stackwright";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "swr";

/// Default blueprint file read by the CLI.
pub const DEFAULT_BLUEPRINT_FILE: &str = "stackwright.yaml";

/// Port used when the caller passes `0` as the application port.
pub const DEFAULT_APP_PORT: u16 = 80;

/// Plain HTTP listener port.
pub const HTTP_PORT: u16 = 80;

/// TLS listener port.
pub const HTTPS_PORT: u16 = 443;

/// Name of the application container in the task template.
pub const APP_CONTAINER_NAME: &str = "app";

/// Name of the log-shipping sidecar in the task template.
pub const LOG_ROUTER_CONTAINER_NAME: &str = "log-router";

/// Task definition family shared by every API service.
pub const TASK_FAMILY: &str = "fargate-task-definition";

/// Launch type for container services.
pub const LAUNCH_TYPE: &str = "FARGATE";

/// Network mode required by the serverless launch type.
pub const TASK_NETWORK_MODE: &str = "awsvpc";

/// Desired task count at service creation. Later changes belong to CI/CD.
pub const INITIAL_DESIRED_COUNT: u32 = 1;

/// Consecutive health-check results needed to flip a target's state.
pub const HEALTH_CHECK_THRESHOLD: u32 = 3;

/// Seconds between target health checks.
pub const HEALTH_CHECK_INTERVAL_SECS: u32 = 30;

/// Seconds before a health check times out.
pub const HEALTH_CHECK_TIMEOUT_SECS: u32 = 5;

/// Status codes that count as healthy.
pub const HEALTH_CHECK_MATCHER: &str = "200-299";

/// Seconds a deregistering target is allowed to drain.
pub const DEREGISTRATION_DELAY_SECS: u32 = 1;

/// Scale-in cooldown in seconds (slow).
pub const SCALE_IN_COOLDOWN_SECS: u32 = 30;

/// Scale-out cooldown in seconds (fast).
pub const SCALE_OUT_COOLDOWN_SECS: u32 = 1;

/// Autoscaling dimension for ECS services.
pub const SCALABLE_DIMENSION: &str = "ecs:service:DesiredCount";

/// Autoscaling namespace for ECS services.
pub const SERVICE_NAMESPACE: &str = "ecs";

/// Predefined metric tracked by the scaling policy.
pub const CPU_METRIC: &str = "ECSServiceAverageCPUUtilization";

/// Tag key carrying the environment name.
pub const TAG_ENVIRONMENT: &str = "Environment";

/// Tag key carrying the service name.
pub const TAG_NAME: &str = "Name";

/// Default public image for the fluent-bit log router.
pub const DEFAULT_LOG_ROUTER_IMAGE: &str =
    "906394416424.dkr.ecr.us-west-2.amazonaws.com/aws-for-fluent-bit:latest";

/// Default region for container log streams.
pub const DEFAULT_LOG_REGION: &str = "ap-northeast-1";

/// Stream prefix for container log streams.
pub const LOG_STREAM_PREFIX: &str = "fluentbit";

/// Default cloud region for synthesized identifiers.
pub const DEFAULT_REGION: &str = "ap-northeast-1";
