//! Pipeline that builds an image and rolls it onto the API service.

use stackwright_common::error::Result;
use stackwright_core::{DeploymentContext, Input};

use crate::cicd::{CicdComponent, DeployTarget, PipelineRoles, PipelineSettings};

/// Type token of the API pipeline component.
pub const COMPONENT_TOKEN: &str = "stackwright:api:FargateApiCICD";

/// The API pipeline and the service it deploys onto.
#[derive(Debug, Clone)]
pub struct ApiCICDComponent {
    /// Declared pipeline resources.
    pub cicd: CicdComponent,
    /// Cluster the service runs on.
    pub cluster_name: Input,
    /// Service receiving new images.
    pub service_name: Input,
}

impl ApiCICDComponent {
    /// Declares `{name}-cicd` deploying onto `service_name` in
    /// `cluster_name`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`CicdComponent::build`].
    pub fn build(
        ctx: &mut DeploymentContext,
        name: &str,
        roles: PipelineRoles<'_>,
        settings: &PipelineSettings,
        cluster_name: Input,
        service_name: Input,
    ) -> Result<Self> {
        let target = DeployTarget::EcsService {
            cluster: cluster_name.clone(),
            service: service_name.clone(),
        };
        let cicd = CicdComponent::build(ctx, COMPONENT_TOKEN, name, roles, settings, &target)?;
        Ok(Self {
            cicd,
            cluster_name,
            service_name,
        })
    }
}
