//! Stage deployments.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::gateway::DeploymentRequest;
use crate::planner::{Change, Target};

use super::context::{DRY_RUN_ID, RunContext};

/// Revision label used when none is given.
pub const DEFAULT_REVISION: &str = "manual";

/// Builds the description recorded on a deployment.
#[must_use]
pub fn deployment_description(revision: Option<&str>, at: DateTime<Utc>) -> String {
    format!(
        "[{}] deployed by apigw-sync at {}",
        revision.unwrap_or(DEFAULT_REVISION),
        at.format("%Y-%m-%dT%H:%M:%SZ")
    )
}

/// Deploys the current API configuration to `stage`.
///
/// Returns the deployment id, or [`DRY_RUN_ID`] in dry-run mode.
///
/// # Errors
///
/// Returns an error if the deployment call fails.
pub async fn deploy(
    ctx: &RunContext<'_>,
    stage: &str,
    variables: BTreeMap<String, String>,
    revision: Option<&str>,
) -> Result<String> {
    let request = DeploymentRequest {
        rest_api_id: ctx.options.rest_api_id.clone(),
        stage_name: stage.to_string(),
        variables,
        description: deployment_description(revision, Utc::now()),
    };

    let id = ctx
        .mutate(Change::create(Target::Deployment, stage), "CreateDeployment", || {
            ctx.backends.gateway.create_deployment(&request)
        })
        .await?;
    Ok(id.unwrap_or_else(|| String::from(DRY_RUN_ID)))
}
