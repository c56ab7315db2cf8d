//! Resource tree reconciliation.
//!
//! Paths are materialized one segment at a time, parents first, so a new deep
//! path never fails on a missing parent.

use std::collections::BTreeSet;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{Definition, path_depth};
use crate::error::{Result, SyncError};
use crate::model::{ROOT_PATH, ResourceNode, ResourceTree, child_path};
use crate::planner::{Change, Phase, Target};

use super::context::{DRY_RUN_ID, RunContext};

/// One missing path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    /// Path of the parent.
    pub parent_path: String,
    /// Segment to create under the parent.
    pub segment: String,
    /// Resulting full path.
    pub path: String,
}

/// Lists the segments to create, shallowest first.
///
/// Desired paths are sorted by depth, then each one is walked from the root;
/// every segment absent from `existing` (and not already planned) becomes a
/// step.
#[must_use]
pub fn creation_plan(paths: &[String], existing: &ResourceTree) -> Vec<PathStep> {
    let mut ordered: Vec<&String> = paths.iter().collect();
    ordered.sort_by(|a, b| path_depth(a).cmp(&path_depth(b)).then_with(|| a.cmp(b)));

    let mut planned = BTreeSet::new();
    let mut steps = Vec::new();
    for path in ordered {
        let mut parent = String::from(ROOT_PATH);
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let full = child_path(&parent, segment);
            if existing.get(&full).is_none() && planned.insert(full.clone()) {
                steps.push(PathStep {
                    parent_path: parent.clone(),
                    segment: segment.to_string(),
                    path: full.clone(),
                });
            }
            parent = full;
        }
    }
    steps
}

/// Creates every missing path of the definition and returns the merged tree.
///
/// # Errors
///
/// Returns an error if the remote tree has no root or a creation fails.
pub async fn reconcile_tree(
    ctx: &RunContext<'_>,
    definition: &Definition,
    remote: &ResourceTree,
) -> Result<ResourceTree> {
    if remote.root().is_none() {
        return Err(SyncError::internal("remote API has no root resource"));
    }

    let paths: Vec<String> = definition
        .resources
        .iter()
        .map(|r| r.normalized_path())
        .collect();
    let steps = creation_plan(&paths, remote);
    debug!("{} path segment(s) to create", steps.len());

    let merged = Mutex::new(remote.clone());
    let tree = &merged;
    let rest_api_id = ctx.options.rest_api_id.as_str();

    ctx.sequencer
        .run(Phase::Resources, steps, move |step| {
            async move {
                let parent_id = tree
                    .lock()
                    .await
                    .get(&step.parent_path)
                    .map(|p| p.id.clone())
                    .ok_or_else(|| {
                        SyncError::internal(format!("parent of {} is missing", step.path))
                    })?;

                let id = ctx
                    .mutate(Change::create(Target::Resource, &step.path), "CreateResource", || {
                        ctx.backends
                            .gateway
                            .create_resource(rest_api_id, &parent_id, &step.segment)
                    })
                    .await?
                    .unwrap_or_else(|| String::from(DRY_RUN_ID));

                tree.lock().await.insert(ResourceNode::new(
                    id,
                    step.path,
                    Some(parent_id),
                    step.segment,
                ));
                Ok(())
            }
        })
        .await?;

    Ok(merged.into_inner())
}
