//! Lookup-or-create for custom authorizers.

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::Definition;
use crate::error::Result;
use crate::model::AuthorizerNode;
use crate::planner::{Change, Phase, Target};

use super::context::{DRY_RUN_ID, RunContext};

/// Ensures every declared authorizer exists and returns name -> id.
///
/// Existing authorizers are reused as they are; they are never patched.
///
/// # Errors
///
/// Returns an error if listing or creation fails.
pub async fn reconcile_authorizers(
    ctx: &RunContext<'_>,
    definition: &Definition,
) -> Result<BTreeMap<String, String>> {
    if definition.authorizers.is_empty() {
        return Ok(BTreeMap::new());
    }

    let rest_api_id = ctx.options.rest_api_id.as_str();
    let existing = ctx
        .read("GetAuthorizers", ctx.backends.gateway.get_authorizers(rest_api_id))
        .await?;

    let mut ids = BTreeMap::new();
    let mut missing = Vec::new();
    for (name, def) in &definition.authorizers {
        match existing.iter().find(|a| a.name == *name) {
            Some(found) => {
                debug!("Authorizer {name} exists as {}", found.id);
                ids.insert(name.clone(), found.id.clone());
            }
            None => missing.push(AuthorizerNode::from_def(
                name,
                def,
                &ctx.options.region,
                &ctx.options.account_id,
            )),
        }
    }

    let created = ctx
        .sequencer
        .run(Phase::Authorizers, missing, |node| async move {
            let id = ctx
                .mutate(Change::create(Target::Authorizer, &node.name), "CreateAuthorizer", || {
                    ctx.backends.gateway.create_authorizer(rest_api_id, &node)
                })
                .await?;
            Ok((node.name, id.unwrap_or_else(|| String::from(DRY_RUN_ID))))
        })
        .await?;

    ids.extend(created);
    Ok(ids)
}
