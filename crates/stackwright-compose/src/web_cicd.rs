//! Pipeline that builds a static site and extracts it into its bucket.

use stackwright_common::config::StackwrightConfig;
use stackwright_common::error::Result;
use stackwright_core::{DeploymentContext, Input};

use crate::cicd::{CicdComponent, DeployTarget, PipelineRoles, PipelineSettings};

/// Type token of the web pipeline component.
pub const COMPONENT_TOKEN: &str = "stackwright:web:StaticWebCICD";

/// The web pipeline and the bucket it deploys into.
#[derive(Debug, Clone)]
pub struct WebCICDComponent {
    /// Declared pipeline resources.
    pub cicd: CicdComponent,
    /// Bucket the pipeline deploys into.
    pub target_bucket: Input,
}

impl WebCICDComponent {
    /// Declares `{name}-cicd` deploying into `bucket`.
    ///
    /// Build and pipeline roles come from the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when either role is missing, or any
    /// error from [`CicdComponent::build`].
    pub fn build(
        ctx: &mut DeploymentContext,
        name: &str,
        bucket: Input,
        settings: &PipelineSettings,
    ) -> Result<Self> {
        let config = ctx.config();
        let build_role = StackwrightConfig::require(
            config.static_web_build_role_arn.as_ref(),
            "staticWebBuildRoleArn",
        )?
        .to_string();
        let pipeline_role = StackwrightConfig::require(
            config.static_web_pipeline_role_arn.as_ref(),
            "staticWebPipelineRoleArn",
        )?
        .to_string();

        let target = DeployTarget::Bucket(bucket.clone());
        let cicd = CicdComponent::build(
            ctx,
            COMPONENT_TOKEN,
            name,
            PipelineRoles {
                build: &build_role,
                pipeline: &pipeline_role,
            },
            settings,
            &target,
        )?;
        Ok(Self {
            cicd,
            target_bucket: bucket,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use stackwright_common::error::StackwrightError;
    use stackwright_core::ResourceKind;
    use stackwright_runtime::PlanEngine;

    use super::*;

    fn bucket() -> Input {
        Input::from("docs.example.com")
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            git_repo: "acme/docs".into(),
            git_branch: "main".into(),
            build_spec: "buildspec.yml".into(),
            ..PipelineSettings::default()
        }
    }

    fn configured() -> StackwrightConfig {
        StackwrightConfig {
            static_web_build_role_arn: Some("arn:aws:iam::1:role/build".into()),
            static_web_pipeline_role_arn: Some("arn:aws:iam::1:role/pipeline".into()),
            ..StackwrightConfig::default()
        }
    }

    #[test]
    fn missing_roles_are_a_config_error() {
        let config = StackwrightConfig::default();
        let mut ctx =
            DeploymentContext::new(config.clone(), Box::new(PlanEngine::from_config(&config)));
        let err =
            WebCICDComponent::build(&mut ctx, "docs-stage", bucket(), &settings()).unwrap_err();
        assert!(matches!(err, StackwrightError::Config { .. }));
        assert!(err.to_string().contains("staticWebBuildRoleArn"));
        assert!(ctx.is_empty());
    }

    #[test]
    fn two_sites_get_their_own_pipelines() {
        let config = configured();
        let mut ctx =
            DeploymentContext::new(config.clone(), Box::new(PlanEngine::from_config(&config)));
        let docs =
            WebCICDComponent::build(&mut ctx, "docs-stage", bucket(), &settings()).expect("docs");
        let blog_bucket = Input::from("blog.example.com");
        let blog = WebCICDComponent::build(&mut ctx, "blog-stage", blog_bucket, &settings())
            .expect("blog");

        assert_ne!(docs.cicd.pipeline.urn, blog.cicd.pipeline.urn);
        assert_ne!(docs.cicd.build_project.urn, blog.cicd.build_project.urn);
        assert_eq!(ctx.declarations_of(&ResourceKind::Pipeline).len(), 2);
    }

    #[test]
    fn deploys_into_bucket() {
        let config = configured();
        let mut ctx =
            DeploymentContext::new(config.clone(), Box::new(PlanEngine::from_config(&config)));
        let web =
            WebCICDComponent::build(&mut ctx, "docs-stage", bucket(), &settings()).expect("build");
        let pipeline = ctx.declaration(&web.cicd.pipeline.urn).expect("pipeline");
        assert_eq!(
            pipeline.property("roleArn").and_then(Input::as_literal_str),
            Some("arn:aws:iam::1:role/pipeline")
        );
        assert_eq!(
            pipeline.property("targetBucket").and_then(Input::as_literal_str),
            Some("docs.example.com")
        );
        let stages = pipeline.property("stages").map(Input::to_json).expect("stages");
        let deploy = &stages[2]["actions"][0];
        assert_eq!(deploy["provider"], json!("S3"));
        assert_eq!(deploy["configuration"]["BucketName"], json!("docs.example.com"));

        let builds = ctx.declarations_of(&ResourceKind::BuildProject);
        let env = builds[0].property("environment").map(Input::to_json).expect("env");
        assert_eq!(env["environmentVariables"][0]["name"], json!("S3_BUCKET"));
        assert_eq!(env["privilegedMode"], json!(false));
    }
}
