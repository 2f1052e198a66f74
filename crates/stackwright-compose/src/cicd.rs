//! Build project, pipeline, and notifications shared by both stacks.
//!
//! The web and API flavours only differ in their deploy target; see
//! [`crate::web_cicd`] and [`crate::api_cicd`].

use std::fmt;

use serde::{Deserialize, Serialize};
use stackwright_common::config::StackwrightConfig;
use stackwright_common::constants::APP_CONTAINER_NAME;
use stackwright_common::error::{Result, StackwrightError};
use stackwright_core::{ComponentHandle, DeclaredResource, DeploymentContext, Input, ResourceKind};

const BUILD_IMAGE: &str = "aws/codebuild/standard:5.0";
const BUILD_COMPUTE_TYPE: &str = "BUILD_GENERAL1_SMALL";
const IMAGE_DEFINITIONS_FILE: &str = "imagedefinitions.json";
const SOURCE_ARTIFACT: &str = "source_output";
const BUILD_ARTIFACT: &str = "build_output";
const NOTIFIED_EVENTS: [&str; 2] = [
    "codepipeline-pipeline-pipeline-execution-failed",
    "codepipeline-pipeline-pipeline-execution-succeeded",
];

/// A hosted git repository in `owner/repo` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepository {
    /// Account or organization.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl GitRepository {
    /// Parses `owner/repo`.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::InvalidInput`] unless the input is two
    /// non-empty segments without whitespace separated by one `/`.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || StackwrightError::InvalidInput {
            field: "gitRepo",
            message: format!("expected owner/repo, got {input:?}"),
        };
        let (owner, name) = input.split_once('/').ok_or_else(invalid)?;
        let well_formed =
            |s: &str| !s.is_empty() && !s.contains('/') && !s.contains(char::is_whitespace);
        if !well_formed(owner) || !well_formed(name) {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for GitRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Caller-facing pipeline options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    /// Source repository, `owner/repo`.
    pub git_repo: String,
    /// Branch that triggers the pipeline.
    pub git_branch: String,
    /// Poll the repository instead of relying on webhooks.
    #[serde(default)]
    pub git_polling: bool,
    /// Insert a manual approval stage before building.
    #[serde(default)]
    pub require_approval: bool,
    /// Publish pipeline results to the notification topic.
    #[serde(default)]
    pub require_notification: bool,
    /// Buildspec for the build project.
    pub build_spec: String,
}

/// Roles the build project and pipeline assume.
#[derive(Debug, Clone, Copy)]
pub struct PipelineRoles<'a> {
    /// Build project service role.
    pub build: &'a str,
    /// Pipeline service role.
    pub pipeline: &'a str,
}

/// Where the pipeline deploys to.
#[derive(Debug, Clone)]
pub enum DeployTarget {
    /// Extract the build output into a website bucket.
    Bucket(Input),
    /// Roll a new image onto an ECS service.
    EcsService {
        /// Cluster name.
        cluster: Input,
        /// Service name.
        service: Input,
    },
}

impl DeployTarget {
    fn environment_variables(&self) -> Input {
        let variable =
            |name: &str, value: Input| Input::object([("name", name.into()), ("value", value)]);
        match self {
            Self::Bucket(bucket) => Input::List(vec![variable("S3_BUCKET", bucket.clone())]),
            Self::EcsService { cluster, service } => Input::List(vec![
                variable("SERVICE_NAME", service.clone()),
                variable("CLUSTER_NAME", cluster.clone()),
                variable("CONTAINER_NAME", APP_CONTAINER_NAME.into()),
            ]),
        }
    }

    fn deploy_action(&self) -> Input {
        let (provider, configuration) = match self {
            Self::Bucket(bucket) => (
                "S3",
                Input::object([("BucketName", bucket.clone()), ("Extract", "true".into())]),
            ),
            Self::EcsService { cluster, service } => (
                "ECS",
                Input::object([
                    ("ClusterName", cluster.clone()),
                    ("ServiceName", service.clone()),
                    ("FileName", IMAGE_DEFINITIONS_FILE.into()),
                ]),
            ),
        };
        action("Deploy", "Deploy", provider, configuration, Some(BUILD_ARTIFACT), None)
    }

    const fn privileged(&self) -> bool {
        matches!(self, Self::EcsService { .. })
    }
}

/// Everything declared by [`CicdComponent::build`].
#[derive(Debug, Clone)]
pub struct CicdComponent {
    /// The `{name}-cicd` component.
    pub handle: ComponentHandle,
    /// Build project.
    pub build_project: DeclaredResource,
    /// Pipeline.
    pub pipeline: DeclaredResource,
    /// Notification rule, when notifications were requested.
    pub notifications: Option<DeclaredResource>,
}

impl CicdComponent {
    /// Declares a `{name}-cicd` component of type `token`.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::InvalidInput`] for a malformed repository
    /// or empty branch, [`StackwrightError::Config`] when notifications are
    /// requested without a configured topic, or the first declaration error.
    pub fn build(
        ctx: &mut DeploymentContext,
        token: &str,
        name: &str,
        roles: PipelineRoles<'_>,
        settings: &PipelineSettings,
        target: &DeployTarget,
    ) -> Result<Self> {
        let repository = GitRepository::parse(&settings.git_repo)?;
        if settings.git_branch.is_empty() {
            return Err(StackwrightError::InvalidInput {
                field: "gitBranch",
                message: "must not be empty".to_string(),
            });
        }
        let topic = if settings.require_notification {
            Some(
                StackwrightConfig::require(
                    ctx.config().notification_topic_arn.as_ref(),
                    "notificationTopicArn",
                )?
                .to_string(),
            )
        } else {
            None
        };
        let artifact_bucket = ctx.config().artifact_bucket.clone();

        let handle = ctx.register_component(token, &format!("{name}-cicd"), None)?;
        tracing::info!(pipeline = name, repository = %repository, "building pipeline");

        let build_project = ctx.declare(
            "build",
            ResourceKind::BuildProject,
            [
                ("name", name.into()),
                ("serviceRole", roles.build.into()),
                (
                    "source",
                    Input::object([
                        ("type", "CODEPIPELINE".into()),
                        ("buildspec", settings.build_spec.as_str().into()),
                    ]),
                ),
                ("artifacts", Input::object([("type", "CODEPIPELINE".into())])),
                (
                    "environment",
                    Input::object([
                        ("computeType", BUILD_COMPUTE_TYPE.into()),
                        ("image", BUILD_IMAGE.into()),
                        ("type", "LINUX_CONTAINER".into()),
                        ("privilegedMode", target.privileged().into()),
                        ("environmentVariables", target.environment_variables()),
                    ]),
                ),
            ],
            handle.child_options(),
        )?;

        let mut stages = vec![stage(
            "Source",
            action(
                "Source",
                "Source",
                "GitHub",
                Input::object([
                    ("Owner", repository.owner.as_str().into()),
                    ("Repo", repository.name.as_str().into()),
                    ("Branch", settings.git_branch.as_str().into()),
                    ("PollForSourceChanges", settings.git_polling.to_string().into()),
                ]),
                None,
                Some(SOURCE_ARTIFACT),
            ),
        )];
        if settings.require_approval {
            stages.push(stage(
                "Approval",
                action("Approval", "Approval", "Manual", Input::object([]), None, None),
            ));
        }
        stages.push(stage(
            "Build",
            action(
                "Build",
                "Build",
                "CodeBuild",
                Input::object([("ProjectName", build_project.output("name")?)]),
                Some(SOURCE_ARTIFACT),
                Some(BUILD_ARTIFACT),
            ),
        ));
        stages.push(stage("Deploy", target.deploy_action()));

        let mut properties = vec![
            ("name", Input::from(name)),
            ("roleArn", roles.pipeline.into()),
            (
                "artifactStore",
                Input::object([("type", "S3".into()), ("location", artifact_bucket.into())]),
            ),
            ("stages", Input::List(stages)),
        ];
        if let DeployTarget::Bucket(bucket) = target {
            properties.push(("targetBucket", bucket.clone()));
        }
        let pipeline = ctx.declare(
            "pipeline",
            ResourceKind::Pipeline,
            properties,
            handle.child_options(),
        )?;

        let notifications = match topic {
            Some(topic) => Some(ctx.declare(
                "notifications",
                ResourceKind::NotificationRule,
                [
                    ("name", format!("{name}-notifications").into()),
                    ("resource", pipeline.output("arn")?),
                    ("detailType", "FULL".into()),
                    ("eventTypeIds", Input::strings(&NOTIFIED_EVENTS)),
                    (
                        "targets",
                        Input::List(vec![Input::object([
                            ("type", "SNS".into()),
                            ("address", topic.into()),
                        ])]),
                    ),
                ],
                handle.child_options(),
            )?),
            None => None,
        };

        Ok(Self {
            handle,
            build_project,
            pipeline,
            notifications,
        })
    }
}

fn stage(name: &str, action: Input) -> Input {
    Input::object([("name", name.into()), ("actions", Input::List(vec![action]))])
}

fn action(
    name: &str,
    category: &str,
    provider: &str,
    configuration: Input,
    input_artifact: Option<&str>,
    output_artifact: Option<&str>,
) -> Input {
    let owner = match provider {
        "GitHub" => "ThirdParty",
        _ => "AWS",
    };
    let mut entries = vec![
        ("name", Input::from(name)),
        ("category", category.into()),
        ("owner", owner.into()),
        ("provider", provider.into()),
        ("version", "1".into()),
        ("configuration", configuration),
    ];
    if let Some(artifact) = input_artifact {
        entries.push(("inputArtifacts", Input::strings(&[artifact])));
    }
    if let Some(artifact) = output_artifact {
        entries.push(("outputArtifacts", Input::strings(&[artifact])));
    }
    Input::object(entries)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use stackwright_runtime::PlanEngine;

    use super::*;

    #[test]
    fn parses_owner_and_repo() {
        let repo = GitRepository::parse("acme/docs-site").expect("parse");
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.name, "docs-site");
        assert_eq!(repo.to_string(), "acme/docs-site");
    }

    #[test]
    fn rejects_malformed_repositories() {
        for bad in ["docs", "/docs", "acme/", "acme/docs/extra", "ac me/docs", ""] {
            let err = GitRepository::parse(bad).unwrap_err();
            assert!(
                matches!(err, StackwrightError::InvalidInput { field: "gitRepo", .. }),
                "{bad}"
            );
        }
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            git_repo: "acme/checkout".into(),
            git_branch: "main".into(),
            git_polling: true,
            require_approval: false,
            require_notification: false,
            build_spec: "buildspec.yml".into(),
        }
    }

    const ROLES: PipelineRoles<'static> = PipelineRoles {
        build: "arn:aws:iam::1:role/build",
        pipeline: "arn:aws:iam::1:role/pipeline",
    };

    fn context(config: StackwrightConfig) -> DeploymentContext {
        let engine = PlanEngine::from_config(&config);
        DeploymentContext::new(config, Box::new(engine))
    }

    fn ecs_target() -> DeployTarget {
        DeployTarget::EcsService {
            cluster: "checkout".into(),
            service: "checkout-prod".into(),
        }
    }

    fn build(ctx: &mut DeploymentContext, settings: &PipelineSettings) -> Result<CicdComponent> {
        CicdComponent::build(ctx, "t:a:B", "checkout-prod", ROLES, settings, &ecs_target())
    }

    fn stage_names(ctx: &DeploymentContext, cicd: &CicdComponent) -> Vec<String> {
        let stages = ctx
            .declaration(&cicd.pipeline.urn)
            .and_then(|d| d.property("stages"))
            .map(Input::to_json)
            .expect("stages");
        stages
            .as_array()
            .expect("array")
            .iter()
            .map(|s| s["name"].as_str().expect("name").to_string())
            .collect()
    }

    #[test]
    fn stages_without_approval() {
        let mut ctx = context(StackwrightConfig::default());
        let cicd = build(&mut ctx, &settings()).expect("build");
        assert_eq!(stage_names(&ctx, &cicd), ["Source", "Build", "Deploy"]);
        assert!(cicd.notifications.is_none());
    }

    #[test]
    fn approval_stage_precedes_build() {
        let mut ctx = context(StackwrightConfig::default());
        let with_approval = PipelineSettings {
            require_approval: true,
            ..settings()
        };
        let cicd = build(&mut ctx, &with_approval).expect("build");
        assert_eq!(stage_names(&ctx, &cicd), ["Source", "Approval", "Build", "Deploy"]);
    }

    #[test]
    fn notifications_need_a_topic() {
        let mut ctx = context(StackwrightConfig::default());
        let notify = PipelineSettings {
            require_notification: true,
            ..settings()
        };
        let err = build(&mut ctx, &notify).unwrap_err();
        assert!(matches!(err, StackwrightError::Config { .. }));
        assert!(ctx.is_empty());

        let mut ctx = context(StackwrightConfig {
            notification_topic_arn: Some("arn:aws:sns:ap-northeast-1:1:deploys".into()),
            ..StackwrightConfig::default()
        });
        let cicd = build(&mut ctx, &notify).expect("build");
        let rule = cicd.notifications.expect("rule");
        let targets = ctx
            .declaration(&rule.urn)
            .and_then(|d| d.property("targets"))
            .map(Input::to_json)
            .expect("targets");
        assert_eq!(targets[0]["address"], json!("arn:aws:sns:ap-northeast-1:1:deploys"));
    }

    #[test]
    fn build_stage_reads_project_name() {
        let mut ctx = context(StackwrightConfig::default());
        let cicd = build(&mut ctx, &settings()).expect("build");
        let graph = ctx.graph().expect("graph");
        assert!(graph.has_edge(
            &cicd.pipeline.urn,
            &cicd.build_project.urn,
            stackwright_core::EdgeKind::Reference
        ));
        let source = ctx
            .declaration(&cicd.pipeline.urn)
            .and_then(|d| d.property("stages"))
            .map(Input::to_json)
            .expect("stages");
        assert_eq!(source[0]["actions"][0]["configuration"]["PollForSourceChanges"], json!("true"));
        assert_eq!(source[0]["actions"][0]["owner"], json!("ThirdParty"));
    }

    #[test]
    fn empty_branch_is_rejected() {
        let mut ctx = context(StackwrightConfig::default());
        let no_branch = PipelineSettings {
            git_branch: String::new(),
            ..settings()
        };
        let err = build(&mut ctx, &no_branch).unwrap_err();
        assert!(matches!(err, StackwrightError::InvalidInput { field: "gitBranch", .. }));
    }
}
