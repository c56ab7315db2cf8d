//! Deletion of remote resources that are no longer declared.
//!
//! Candidates are picked from a frozen snapshot of the remote tree taken
//! before any creation, so the child check never sees nodes created in the
//! same run.

use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::config::Definition;
use crate::error::Result;
use crate::model::{ROOT_PATH, ResourceNode, ResourceTree, child_path};
use crate::planner::{Change, Phase, Target};

use super::context::RunContext;

/// Expands declared paths with every ancestor path.
#[must_use]
pub fn declared_paths(definition: &Definition) -> BTreeSet<String> {
    let mut paths = BTreeSet::from([String::from(ROOT_PATH)]);
    for resource in &definition.resources {
        let mut current = String::from(ROOT_PATH);
        for segment in resource.normalized_path().split('/').filter(|s| !s.is_empty()) {
            current = child_path(&current, segment);
            paths.insert(current.clone());
        }
    }
    paths
}

/// Returns remote nodes to delete.
///
/// A node is a candidate when it is not the root, is not declared (directly
/// or as an ancestor of a declared path), and has no children in `remote`.
#[must_use]
pub fn prune_candidates(remote: &ResourceTree, declared: &BTreeSet<String>) -> Vec<ResourceNode> {
    remote
        .iter()
        .filter(|node| !node.is_root() && !declared.contains(&node.path))
        .filter(|node| {
            let protected = remote.has_children(&node.id);
            if protected {
                debug!("Keeping {} because it still has children", node.path);
            }
            !protected
        })
        .cloned()
        .collect()
}

/// Deletes undeclared leaf resources found in `snapshot`.
///
/// Returns the number of deleted (or, in dry-run mode, planned) resources.
///
/// # Errors
///
/// Returns the first deletion error.
pub async fn prune(ctx: &RunContext<'_>, definition: &Definition, snapshot: &ResourceTree) -> Result<usize> {
    let candidates = prune_candidates(snapshot, &declared_paths(definition));
    if candidates.is_empty() {
        debug!("Nothing to prune");
        return Ok(0);
    }
    info!("Pruning {} resource(s)", candidates.len());

    let rest_api_id = ctx.options.rest_api_id.as_str();
    let deleted = ctx
        .sequencer
        .run(Phase::Prune, candidates, |node| async move {
            ctx.mutate(Change::delete(Target::Resource, &node.path), "DeleteResource", || {
                ctx.backends.gateway.delete_resource(rest_api_id, &node.id)
            })
            .await
        })
        .await?;
    Ok(deleted.len())
}
