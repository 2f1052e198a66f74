//! Fargate service behind a load balancer, with CPU target tracking.
//!
//! Declaration order inside the `fargate-api` component:
//!
//! 1. cluster (found or declared, see [`crate::cluster`])
//! 2. load balancer, target group, listeners
//! 3. `app-task`
//! 4. `app-svc`, explicitly ordered after the HTTPS listener
//! 5. `autoscale-target` and `autoscale-policy`

use stackwright_common::constants::{
    APP_CONTAINER_NAME, CPU_METRIC, DEFAULT_APP_PORT, INITIAL_DESIRED_COUNT, LAUNCH_TYPE,
    SCALABLE_DIMENSION, SCALE_IN_COOLDOWN_SECS, SCALE_OUT_COOLDOWN_SECS, SERVICE_NAMESPACE,
    TASK_FAMILY, TASK_NETWORK_MODE,
};
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::qualified_name;
use stackwright_core::{
    ClusterLookup, ComponentHandle, DeclaredResource, DeploymentContext, Input, ResourceKind,
};

use crate::cluster::{ClusterRef, resolve_cluster};
use crate::container_template;
use crate::load_balancer::{LoadBalancerArgs, LoadBalancerOutputs, LoadBalancerSubcomponent};

/// Type token of the API component.
pub const COMPONENT_TOKEN: &str = "stackwright:api:FargateApi";

/// Logical name of the API component.
pub const COMPONENT_NAME: &str = "fargate-api";

/// Parameters for [`ContainerApiComponent::build`].
#[derive(Debug, Clone, Default)]
pub struct ContainerApiArgs {
    /// Service name. Also the name of the cluster looked up or declared.
    pub service: String,
    /// Environment name.
    pub environment: String,
    /// Subnets the tasks run in.
    pub task_subnet_ids: Vec<String>,
    /// Security groups attached to the tasks.
    pub task_security_group_ids: Vec<String>,
    /// Subnets the load balancer spans.
    pub lb_subnet_ids: Vec<String>,
    /// Security groups attached to the load balancer.
    pub lb_security_group_ids: Vec<String>,
    /// VPC of the target group.
    pub vpc_id: String,
    /// Task execution role.
    pub task_role_arn: String,
    /// Application port; `0` selects port 80.
    pub app_port: u16,
    /// Task CPU units, e.g. `"256"`.
    pub cpu: String,
    /// Task memory, e.g. `"512"`.
    pub memory: String,
    /// Health check path on the target group.
    pub health_check_path: String,
    /// Certificate for the HTTPS listener.
    pub certificate_arn: Option<String>,
    /// Minimum task count.
    pub scale_min: u32,
    /// Maximum task count.
    pub scale_max: u32,
    /// Target average CPU utilization in percent.
    pub scale_cpu_percent: f64,
    /// Log group the log router writes to.
    pub log_group: String,
}

impl ContainerApiArgs {
    /// Port the service actually exposes.
    #[must_use]
    pub const fn effective_port(&self) -> u16 {
        if self.app_port == 0 {
            DEFAULT_APP_PORT
        } else {
            self.app_port
        }
    }

    /// Checks the arguments before anything is declared.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::InvalidInput`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, message: &str| StackwrightError::InvalidInput {
            field,
            message: message.to_string(),
        };
        if self.service.is_empty() {
            return Err(invalid("service", "must not be empty"));
        }
        if self.environment.is_empty() {
            return Err(invalid("environment", "must not be empty"));
        }
        if self.scale_min > self.scale_max {
            return Err(invalid("scaleMin", "must not exceed scaleMax"));
        }
        if !(self.scale_cpu_percent > 0.0 && self.scale_cpu_percent <= 100.0) {
            return Err(invalid("scaleCpuPercent", "must be in (0, 100]"));
        }
        Ok(())
    }
}

/// Everything declared by [`ContainerApiComponent::build`].
#[derive(Debug, Clone)]
pub struct ContainerApiComponent {
    /// The `fargate-api` component.
    pub handle: ComponentHandle,
    /// Cluster the service runs on.
    pub cluster: ClusterRef,
    /// Load balancer declarations.
    pub load_balancer: LoadBalancerOutputs,
    /// Task definition.
    pub task_definition: DeclaredResource,
    /// ECS service.
    pub service: DeclaredResource,
    /// Autoscaling target.
    pub scaling_target: DeclaredResource,
    /// Autoscaling policy.
    pub scaling_policy: DeclaredResource,
}

impl ContainerApiComponent {
    /// Declares the API component.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::InvalidInput`] for bad arguments, or the
    /// first error raised while resolving the cluster or declaring a
    /// resource.
    pub fn build(
        ctx: &mut DeploymentContext,
        lookup: &dyn ClusterLookup,
        args: &ContainerApiArgs,
    ) -> Result<Self> {
        args.validate()?;
        let port = args.effective_port();
        let handle = ctx.register_component(COMPONENT_TOKEN, COMPONENT_NAME, None)?;
        tracing::info!(
            service = %args.service,
            environment = %args.environment,
            "building container api"
        );

        let cluster = resolve_cluster(ctx, lookup, &args.service, &handle)?;

        let load_balancer = LoadBalancerSubcomponent::build(
            ctx,
            &handle,
            &LoadBalancerArgs {
                service: &args.service,
                environment: &args.environment,
                subnet_ids: &args.lb_subnet_ids,
                security_group_ids: &args.lb_security_group_ids,
                vpc_id: &args.vpc_id,
                app_port: port,
                health_check_path: &args.health_check_path,
                certificate_arn: args.certificate_arn.as_deref(),
            },
        )?;

        let containers = container_template::render(ctx.config(), &args.log_group);
        let task_definition = ctx.declare(
            "app-task",
            ResourceKind::TaskDefinition,
            [
                ("family", TASK_FAMILY.into()),
                ("cpu", args.cpu.as_str().into()),
                ("memory", args.memory.as_str().into()),
                ("networkMode", TASK_NETWORK_MODE.into()),
                ("requiresCompatibilities", Input::strings(&[LAUNCH_TYPE])),
                ("executionRoleArn", args.task_role_arn.as_str().into()),
                ("containerDefinitions", containers.to_string().into()),
            ],
            handle.child_options(),
        )?;

        let service = ctx.declare(
            "app-svc",
            ResourceKind::Service,
            [
                ("name", qualified_name(&args.service, &args.environment).into()),
                ("cluster", cluster.arn.clone()),
                ("taskDefinition", task_definition.output("arn")?),
                ("desiredCount", INITIAL_DESIRED_COUNT.into()),
                ("launchType", LAUNCH_TYPE.into()),
                ("deploymentController", Input::object([("type", "ECS".into())])),
                (
                    "networkConfiguration",
                    Input::object([
                        ("assignPublicIp", true.into()),
                        ("subnets", Input::strings(&args.task_subnet_ids)),
                        ("securityGroups", Input::strings(&args.task_security_group_ids)),
                    ]),
                ),
                (
                    "loadBalancers",
                    Input::List(vec![Input::object([
                        ("targetGroupArn", load_balancer.target_group.output("arn")?),
                        ("containerName", APP_CONTAINER_NAME.into()),
                        ("containerPort", port.into()),
                    ])]),
                ),
            ],
            handle
                .child_options()
                .depends_on(&load_balancer.https_listener.urn)
                .ignore_changes("taskDefinition")
                .ignore_changes("desiredCount"),
        )?;

        let resource_id = Input::concat([
            Input::from("service/"),
            cluster.name.clone(),
            Input::from("/"),
            service.output("name")?,
        ]);

        let scaling_target = ctx.declare(
            "autoscale-target",
            ResourceKind::ScalingTarget,
            [
                ("minCapacity", args.scale_min.into()),
                ("maxCapacity", args.scale_max.into()),
                ("resourceId", resource_id.clone()),
                ("scalableDimension", SCALABLE_DIMENSION.into()),
                ("serviceNamespace", SERVICE_NAMESPACE.into()),
            ],
            handle.child_options(),
        )?;

        let scaling_policy = ctx.declare(
            "autoscale-policy",
            ResourceKind::ScalingPolicy,
            [
                ("name", "scale-inout".into()),
                ("policyType", "TargetTrackingScaling".into()),
                ("resourceId", scaling_target.output("resourceId")?),
                ("scalableDimension", SCALABLE_DIMENSION.into()),
                ("serviceNamespace", SERVICE_NAMESPACE.into()),
                (
                    "targetTrackingScalingPolicyConfiguration",
                    Input::object([
                        (
                            "predefinedMetricSpecification",
                            Input::object([("predefinedMetricType", CPU_METRIC.into())]),
                        ),
                        ("scaleInCooldown", SCALE_IN_COOLDOWN_SECS.into()),
                        ("scaleOutCooldown", SCALE_OUT_COOLDOWN_SECS.into()),
                        ("targetValue", args.scale_cpu_percent.into()),
                    ]),
                ),
            ],
            handle.child_options(),
        )?;

        Ok(Self {
            handle,
            cluster,
            load_balancer,
            task_definition,
            service,
            scaling_target,
            scaling_policy,
        })
    }

    /// Public DNS name of the load balancer.
    #[must_use]
    pub const fn dns_name(&self) -> &Input {
        &self.load_balancer.dns_name
    }
}
