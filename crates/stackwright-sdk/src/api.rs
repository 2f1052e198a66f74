//! Container API stack: Fargate service, load balancer, autoscaling, and
//! deployment pipeline.

use serde::{Deserialize, Serialize};
use stackwright_common::error::Result;
use stackwright_common::types::{Tags, qualified_name};
use stackwright_compose::{
    ApiCICDComponent, ContainerApiArgs, ContainerApiComponent, PipelineRoles, PipelineSettings,
};
use stackwright_core::{ClusterLookup, DeploymentContext};

/// Parameters of the container API stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiParams {
    /// Service name. Also the cluster name.
    pub service: String,
    /// Environment name.
    pub env: String,
    /// Subnets the tasks run in.
    pub task_subnet_ids: Vec<String>,
    /// Security groups attached to the tasks.
    pub task_security_group_ids: Vec<String>,
    /// Subnets the load balancer spans.
    pub subnet_ids: Vec<String>,
    /// Security groups attached to the load balancer.
    pub security_group_ids: Vec<String>,
    /// VPC of the target group.
    pub vpc_id: String,
    /// Task execution role.
    pub task_role: String,
    /// Application port; `0` or absent selects port 80.
    #[serde(default)]
    pub app_port: u16,
    /// Task CPU units.
    pub app_cpu: String,
    /// Task memory.
    pub app_memory: String,
    /// Target group health check path.
    pub app_health_check_path: String,
    /// Certificate for the HTTPS listener.
    #[serde(default)]
    pub certificate_arn: Option<String>,
    /// Maximum task count.
    pub scale_max: u32,
    /// Minimum task count.
    pub scale_min: u32,
    /// Target average CPU utilization in percent.
    pub scale_cpu_percent: f64,
    /// Log group of the log router. Defaults to `/ecs/{service}-{env}`.
    #[serde(default)]
    pub log_group: Option<String>,
    /// Build project service role.
    pub build_role: String,
    /// Pipeline service role.
    pub pipeline_role: String,
    /// Pipeline options.
    pub pipeline: PipelineSettings,
}

impl ApiParams {
    fn component_args(&self) -> ContainerApiArgs {
        ContainerApiArgs {
            service: self.service.clone(),
            environment: self.env.clone(),
            task_subnet_ids: self.task_subnet_ids.clone(),
            task_security_group_ids: self.task_security_group_ids.clone(),
            lb_subnet_ids: self.subnet_ids.clone(),
            lb_security_group_ids: self.security_group_ids.clone(),
            vpc_id: self.vpc_id.clone(),
            task_role_arn: self.task_role.clone(),
            app_port: self.app_port,
            cpu: self.app_cpu.clone(),
            memory: self.app_memory.clone(),
            health_check_path: self.app_health_check_path.clone(),
            certificate_arn: self.certificate_arn.clone(),
            scale_min: self.scale_min,
            scale_max: self.scale_max,
            scale_cpu_percent: self.scale_cpu_percent,
            log_group: self
                .log_group
                .clone()
                .unwrap_or_else(|| format!("/ecs/{}", qualified_name(&self.service, &self.env))),
        }
    }
}

/// Result of [`ApiInfraComposer::compose`].
#[derive(Debug, Clone)]
pub struct ApiInfraComposer {
    /// Service, load balancer, and autoscaling.
    pub api: ContainerApiComponent,
    /// Deployment pipeline.
    pub cicd: ApiCICDComponent,
}

impl ApiInfraComposer {
    /// Declares the whole API stack and exports `dns`.
    ///
    /// `lookup` decides whether the cluster named after the service is
    /// reused or declared. Nothing is exported unless every stage succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a stage, unchanged.
    pub fn compose(
        ctx: &mut DeploymentContext,
        lookup: &dyn ClusterLookup,
        params: &ApiParams,
    ) -> Result<Self> {
        tracing::info!(service = %params.service, env = %params.env, "composing api stack");
        ctx.register_auto_tags(Tags::for_service(&params.env, &params.service));

        let api = ContainerApiComponent::build(ctx, lookup, &params.component_args())?;

        let cicd = ApiCICDComponent::build(
            ctx,
            &qualified_name(&params.service, &params.env),
            PipelineRoles {
                build: &params.build_role,
                pipeline: &params.pipeline_role,
            },
            &params.pipeline,
            api.cluster.name.clone(),
            api.service.output("name")?,
        )?;

        ctx.export("dns", api.dns_name().clone())?;
        Ok(Self { api, cicd })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_parse_from_camel_case_yaml() {
        let yaml = r"
service: checkout
env: prod
taskSubnetIds: [subnet-task]
taskSecurityGroupIds: [sg-task]
subnetIds: [subnet-a, subnet-b]
securityGroupIds: [sg-lb]
vpcId: vpc-1
taskRole: arn:aws:iam::1:role/task
appCpu: '256'
appMemory: '512'
appHealthCheckPath: /health
scaleMax: 10
scaleMin: 2
scaleCpuPercent: 60.0
buildRole: arn:aws:iam::1:role/build
pipelineRole: arn:aws:iam::1:role/pipeline
pipeline:
  gitRepo: acme/checkout
  gitBranch: main
  buildSpec: buildspec.yml
";
        let params: ApiParams = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(params.app_port, 0);
        assert!(params.certificate_arn.is_none());
        assert!(!params.pipeline.require_approval);

        let args = params.component_args();
        assert_eq!(args.effective_port(), 80);
        assert_eq!(args.log_group, "/ecs/checkout-prod");
        assert_eq!(args.lb_subnet_ids.len(), 2);
    }
}
