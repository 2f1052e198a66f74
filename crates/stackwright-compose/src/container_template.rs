//! The fixed container list every API task runs.
//!
//! Two containers: the application itself and a fluent-bit sidecar that the
//! application's firelens log driver ships to.

use serde_json::{Value, json};
use stackwright_common::config::StackwrightConfig;
use stackwright_common::constants::{
    APP_CONTAINER_NAME, DEFAULT_APP_PORT, LOG_ROUTER_CONTAINER_NAME, LOG_STREAM_PREFIX,
};

const APP_IMAGE: &str = "nginx:latest";
const NOFILE_LIMIT: u32 = 65_535;
const FLUENT_FORWARD_PORT: u16 = 24_224;

/// Renders the container definitions for a task.
///
/// `log_group` names the CloudWatch group the sidecar writes to. Image,
/// region and firelens configuration come from `config`; when no firelens
/// configuration ARN is set the sidecar runs with its built-in config.
#[must_use]
pub fn render(config: &StackwrightConfig, log_group: &str) -> Value {
    let mut log_router = json!({
        "name": LOG_ROUTER_CONTAINER_NAME,
        "image": config.log_router_image,
        "cpu": 0,
        "user": "0",
        "environment": [],
        "mountPoints": [],
        "volumesFrom": [],
        "portMappings": [{
            "containerPort": FLUENT_FORWARD_PORT,
            "hostPort": FLUENT_FORWARD_PORT,
            "protocol": "tcp"
        }],
        "logConfiguration": {
            "logDriver": "awslogs",
            "options": {
                "awslogs-group": log_group,
                "awslogs-region": config.log_region,
                "awslogs-stream-prefix": LOG_STREAM_PREFIX
            }
        },
        "firelensConfiguration": {"type": "fluentbit"}
    });
    if let Some(arn) = &config.firelens_config_arn {
        log_router["firelensConfiguration"]["options"] = json!({
            "config-file-type": "s3",
            "config-file-value": arn
        });
    }

    json!([
        {
            "name": APP_CONTAINER_NAME,
            "image": APP_IMAGE,
            "essential": true,
            "environment": [],
            "portMappings": [{
                "containerPort": DEFAULT_APP_PORT,
                "hostPort": DEFAULT_APP_PORT,
                "protocol": "tcp"
            }],
            "ulimits": [{
                "name": "nofile",
                "softLimit": NOFILE_LIMIT,
                "hardLimit": NOFILE_LIMIT
            }],
            "healthCheck": {
                "command": ["CMD-SHELL", "echo hello"],
                "retries": 3,
                "timeout": 5,
                "interval": 30
            },
            "logConfiguration": {"logDriver": "awsfirelens"}
        },
        log_router
    ])
}
