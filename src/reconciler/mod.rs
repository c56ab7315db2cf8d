//! Reconciliation engine.
//!
//! A run converges the remote API towards a [`Definition`] in a fixed order:
//!
//! 1. Check options, then validate the definition locally and remotely
//! 2. Mirror the remote resource tree
//! 3. Authorizers, then binary media types
//! 4. Resource tree, parents before children
//! 5. Methods, integrations and responses
//! 6. Alarms, then API keys
//! 7. Prune undeclared resources against the snapshot taken in step 2
//!
//! Every decision is recorded in the returned [`ChangeSet`]. In dry-run mode
//! the same decisions are made and logged, but no mutating call is issued.

mod alarms;
mod api_keys;
mod authorizers;
mod binary;
mod context;
mod deploy;
mod methods;
mod preflight;
mod pruner;
mod resources;

pub use alarms::reconcile_alarms;
pub use api_keys::reconcile_api_keys;
pub use authorizers::reconcile_authorizers;
pub use binary::{ANY_MEDIA_TYPE, ensure_binary_media_types};
pub use context::{DRY_RUN_ID, RunContext};
pub use deploy::{DEFAULT_REVISION, deploy, deployment_description};
pub use methods::{
    DesiredMethod, MAX_STATEMENT_ID_LEN, MethodBuilder, permissions, reconcile_method, source_arn,
    statement_id,
};
pub use preflight::{FunctionIndex, Preflight, preflight};
pub use pruner::{declared_paths, prune, prune_candidates};
pub use resources::{PathStep, creation_plan, reconcile_tree};

use std::collections::BTreeMap;
use tracing::{error, info};

use crate::config::{Definition, DefinitionValidator, SyncOptions, path_depth};
use crate::error::{ConfigError, Result, SyncError};
use crate::gateway::{Backends, RemoteMirror, RestApiInfo};
use crate::model::{HttpMethod, MethodNode, MethodTarget, ResourceTree};
use crate::planner::{ChangeSet, Phase};

/// Runs reconciliations and deployments against one set of services.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    options: &'a SyncOptions,
    backends: &'a Backends,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler.
    #[must_use]
    pub const fn new(options: &'a SyncOptions, backends: &'a Backends) -> Self {
        Self { options, backends }
    }

    /// Validates a definition without changing anything.
    ///
    /// Local checks and remote lookups (API, functions, aliases, VPC links)
    /// all run, and every problem is reported together.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] listing every problem, or the error
    /// of a failed lookup.
    pub async fn validate(&self, definition: &Definition) -> Result<Vec<String>> {
        let ctx = RunContext::new(self.options, self.backends);
        let (_, warnings) = self.check(&ctx, definition).await?;
        Ok(warnings)
    }

    /// Converges the remote API towards `definition`.
    ///
    /// # Errors
    ///
    /// Returns a configuration or validation error before any remote change,
    /// or the first failing remote call. Changes applied before a failure
    /// stay in place; running again resumes from there.
    pub async fn run(&self, definition: &Definition) -> Result<ChangeSet> {
        self.options.validate()?;
        let ctx = RunContext::new(self.options, self.backends);
        if self.options.dry_run {
            info!("[dry-run] Planning changes for {}, nothing will be applied", self.options.rest_api_id);
        }

        match self.converge(&ctx, definition).await {
            Ok(()) => {
                let journal = ctx.finish();
                info!("Run finished with {} change(s)", journal.changes.len());
                Ok(journal)
            }
            Err(e) => {
                let journal = ctx.finish();
                error!("Run stopped after {} change(s): {e}", journal.changes.len());
                Err(e)
            }
        }
    }

    /// Deploys the API to the configured stage.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingOption`] without a stage, or the error of
    /// the deployment call.
    pub async fn deploy(&self, variables: BTreeMap<String, String>, revision: Option<&str>) -> Result<ChangeSet> {
        let stage = self
            .options
            .deployment_stage
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::missing("deploymentStage"))?;

        let ctx = RunContext::new(self.options, self.backends);
        let id = deploy(&ctx, stage, variables, revision).await?;
        info!("Deployed {} to {stage} as {id}", self.options.rest_api_id);
        Ok(ctx.finish())
    }

    async fn check(&self, ctx: &RunContext<'_>, definition: &Definition) -> Result<(Preflight, Vec<String>)> {
        let mut findings = DefinitionValidator::new()?
            .with_base_domain(self.options.base_domain.clone())
            .validate(definition);
        let mut report = preflight(ctx, definition).await?;
        findings.merge(std::mem::take(&mut report.findings));
        let warnings = findings.into_result()?;
        Ok((report, warnings))
    }

    async fn converge(&self, ctx: &RunContext<'_>, definition: &Definition) -> Result<()> {
        let (report, warnings) = self.check(ctx, definition).await?;
        for warning in warnings {
            ctx.warn(warning).await;
        }
        let api = report
            .api
            .clone()
            .ok_or_else(|| SyncError::internal("REST API summary is missing after validation"))?;

        let rest_api_id = self.options.rest_api_id.as_str();
        let snapshot = RemoteMirror::new(ctx.backends.gateway.as_ref(), &ctx.sequencer, rest_api_id)
            .fetch()
            .await?;

        let authorizers = reconcile_authorizers(ctx, definition).await?;
        ensure_binary_media_types(ctx, &api, definition).await?;

        let tree = reconcile_tree(ctx, definition, &snapshot).await?;
        let builder = MethodBuilder::new(self.options, &report.functions, &authorizers);
        let work = plan_methods(&builder, rest_api_id, definition, &tree)?;
        info!("Reconciling {} method(s)", work.len());
        ctx.sequencer
            .run(Phase::Methods, work, |(target, desired, current)| async move {
                reconcile_method(ctx, &target, &desired, current).await
            })
            .await?;

        reconcile_alarms(ctx, definition, &api_name(&api)).await?;
        reconcile_api_keys(ctx, definition).await?;
        prune(ctx, definition, &snapshot).await?;
        Ok(())
    }
}

type MethodWork<'t> = (MethodTarget, DesiredMethod, Option<&'t MethodNode>);

/// Builds every declared method, shallowest resources first.
fn plan_methods<'t>(
    builder: &MethodBuilder<'_>,
    rest_api_id: &str,
    definition: &Definition,
    tree: &'t ResourceTree,
) -> Result<Vec<MethodWork<'t>>> {
    let mut resources: Vec<_> = definition
        .resources
        .iter()
        .map(|r| (r.normalized_path(), r))
        .collect();
    resources.sort_by(|(a, _), (b, _)| path_depth(a).cmp(&path_depth(b)).then_with(|| a.cmp(b)));

    let mut work = Vec::new();
    for (path, resource) in resources {
        let node = tree
            .get(&path)
            .ok_or_else(|| SyncError::internal(format!("resource {path} is missing after creation")))?;
        for (verb, def) in &resource.methods {
            let http_method = verb
                .parse::<HttpMethod>()
                .map_err(|message| SyncError::Validation { messages: vec![message] })?;
            let target = MethodTarget {
                rest_api_id: rest_api_id.to_string(),
                resource_id: node.id.clone(),
                http_method,
                path: path.clone(),
            };
            let desired = builder.build(http_method, &path, def)?;
            work.push((target, desired, node.methods.get(&http_method)));
        }
    }
    Ok(work)
}

fn api_name(api: &RestApiInfo) -> String {
    if api.name.is_empty() {
        api.id.clone()
    } else {
        api.name.clone()
    }
}
