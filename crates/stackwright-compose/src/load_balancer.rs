//! Public application load balancer in front of a container service.

use stackwright_common::constants::{
    DEREGISTRATION_DELAY_SECS, HEALTH_CHECK_INTERVAL_SECS, HEALTH_CHECK_MATCHER,
    HEALTH_CHECK_THRESHOLD, HEALTH_CHECK_TIMEOUT_SECS, HTTPS_PORT, HTTP_PORT,
};
use stackwright_common::error::Result;
use stackwright_common::types::qualified_name;
use stackwright_core::{ComponentHandle, DeclaredResource, DeploymentContext, Input, ResourceKind};

/// Parameters for [`LoadBalancerSubcomponent::build`].
#[derive(Debug, Clone)]
pub struct LoadBalancerArgs<'a> {
    /// Service name.
    pub service: &'a str,
    /// Environment name.
    pub environment: &'a str,
    /// Subnets the load balancer spans.
    pub subnet_ids: &'a [String],
    /// Security groups attached to the load balancer.
    pub security_group_ids: &'a [String],
    /// VPC of the target group.
    pub vpc_id: &'a str,
    /// Port the application listens on.
    pub app_port: u16,
    /// Path probed by the target group health check.
    pub health_check_path: &'a str,
    /// Certificate for the HTTPS listener.
    pub certificate_arn: Option<&'a str>,
}

/// Declarations made by [`LoadBalancerSubcomponent::build`].
#[derive(Debug, Clone)]
pub struct LoadBalancerOutputs {
    /// The load balancer.
    pub load_balancer: DeclaredResource,
    /// Target group the service registers into.
    pub target_group: DeclaredResource,
    /// Port 80 listener (redirect only).
    pub http_listener: DeclaredResource,
    /// Port 443 listener that carries production traffic.
    pub https_listener: DeclaredResource,
    /// Public DNS name of the load balancer.
    pub dns_name: Input,
}

/// Builds the load balancer, target group, and both listeners.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadBalancerSubcomponent;

impl LoadBalancerSubcomponent {
    /// Declares the load balancer stack under `parent` and publishes its
    /// DNS name as the parent's `dns` output.
    ///
    /// # Errors
    ///
    /// Returns the first declaration error.
    pub fn build(
        ctx: &mut DeploymentContext,
        parent: &ComponentHandle,
        args: &LoadBalancerArgs<'_>,
    ) -> Result<LoadBalancerOutputs> {
        let load_balancer = ctx.declare(
            "lb",
            ResourceKind::LoadBalancer,
            [
                ("loadBalancerType", "application".into()),
                ("internal", false.into()),
                ("subnets", Input::strings(args.subnet_ids)),
                ("securityGroups", Input::strings(args.security_group_ids)),
            ],
            parent.child_options(),
        )?;

        let target_group = ctx.declare(
            "tg",
            ResourceKind::TargetGroup,
            [
                ("name", qualified_name(args.service, args.environment).into()),
                ("port", args.app_port.into()),
                ("protocol", "HTTP".into()),
                ("targetType", "ip".into()),
                ("vpcId", args.vpc_id.into()),
                ("deregistrationDelay", DEREGISTRATION_DELAY_SECS.into()),
                ("healthCheck", health_check(args)),
            ],
            parent.child_options(),
        )?;

        let http_listener = ctx.declare(
            "http-listener",
            ResourceKind::Listener,
            [
                ("loadBalancerArn", load_balancer.output("arn")?),
                ("port", HTTP_PORT.into()),
                ("protocol", "HTTP".into()),
                (
                    "defaultActions",
                    Input::List(vec![Input::object([
                        ("type", "redirect".into()),
                        (
                            "redirect",
                            Input::object([
                                ("port", HTTPS_PORT.to_string().into()),
                                ("protocol", "HTTPS".into()),
                                ("statusCode", "HTTP_301".into()),
                            ]),
                        ),
                    ])]),
                ),
            ],
            parent.child_options(),
        )?;

        let mut https_properties = vec![
            ("loadBalancerArn", load_balancer.output("arn")?),
            ("port", HTTPS_PORT.into()),
            ("protocol", "HTTPS".into()),
            (
                "defaultActions",
                Input::List(vec![Input::object([
                    ("type", "forward".into()),
                    ("targetGroupArn", target_group.output("arn")?),
                ])]),
            ),
        ];
        if let Some(certificate) = args.certificate_arn {
            https_properties.push(("certificateArn", certificate.into()));
        }
        let https_listener = ctx.declare(
            "https-listener",
            ResourceKind::Listener,
            https_properties,
            parent.child_options(),
        )?;

        let dns_name = load_balancer.output("dnsName")?;
        ctx.register_outputs(parent, [("dns", dns_name.clone())])?;
        tracing::info!(service = args.service, "load balancer declared");

        Ok(LoadBalancerOutputs {
            load_balancer,
            target_group,
            http_listener,
            https_listener,
            dns_name,
        })
    }
}

fn health_check(args: &LoadBalancerArgs<'_>) -> Input {
    Input::object([
        ("enabled", true.into()),
        ("healthyThreshold", HEALTH_CHECK_THRESHOLD.into()),
        ("unhealthyThreshold", HEALTH_CHECK_THRESHOLD.into()),
        ("interval", HEALTH_CHECK_INTERVAL_SECS.into()),
        ("timeout", HEALTH_CHECK_TIMEOUT_SECS.into()),
        ("matcher", HEALTH_CHECK_MATCHER.into()),
        ("path", args.health_check_path.into()),
        // The API takes the port as a string.
        ("port", args.app_port.to_string().into()),
        ("protocol", "HTTP".into()),
    ])
}
