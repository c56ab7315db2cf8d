//! API keys and their usage plan membership.

use tracing::debug;

use crate::config::{ApiKeyDef, Definition};
use crate::error::Result;
use crate::gateway::NewApiKey;
use crate::planner::{Change, Phase, Target};

use super::context::{DRY_RUN_ID, RunContext};

/// Ensures every declared key exists and is attached to its usage plan.
///
/// Keys are matched by name and never updated.
///
/// # Errors
///
/// Returns an error if a lookup or creation fails.
pub async fn reconcile_api_keys(ctx: &RunContext<'_>, definition: &Definition) -> Result<()> {
    ctx.sequencer
        .run(Phase::ApiKeys, &definition.api_keys, |key| ensure_key(ctx, key))
        .await?;
    Ok(())
}

async fn ensure_key(ctx: &RunContext<'_>, key: &ApiKeyDef) -> Result<()> {
    let gateway = ctx.backends.gateway.as_ref();

    let existing = ctx
        .read("GetApiKeys", gateway.find_api_key(&key.name))
        .await?;
    let key_id = match existing {
        Some(id) => {
            debug!("API key {} exists as {id}", key.name);
            id
        }
        None => {
            let new_key = NewApiKey {
                name: key.name.clone(),
                description: key.description.clone(),
                enabled: key.enabled,
                value: key.value.clone(),
            };
            ctx.mutate(Change::create(Target::ApiKey, &key.name), "CreateApiKey", || {
                gateway.create_api_key(&new_key)
            })
            .await?
            .unwrap_or_else(|| String::from(DRY_RUN_ID))
        }
    };

    let Some(plan) = key.usage_plan_id.as_deref() else {
        return Ok(());
    };

    // A planned key cannot be a member yet.
    if key_id != DRY_RUN_ID && is_member(ctx, plan, &key_id).await? {
        debug!("API key {} is already attached to {plan}", key.name);
        return Ok(());
    }

    ctx.mutate(
        Change::create(Target::UsagePlanKey, format!("{} -> {plan}", key.name)),
        "CreateUsagePlanKey",
        || gateway.create_usage_plan_key(plan, &key_id),
    )
    .await?;
    Ok(())
}

/// Walks the usage plan listing until `key_id` shows up or the pages run out.
async fn is_member(ctx: &RunContext<'_>, plan: &str, key_id: &str) -> Result<bool> {
    let gateway = ctx.backends.gateway.as_ref();
    let mut position = None;
    loop {
        let page = ctx
            .read("GetUsagePlanKeys", gateway.get_usage_plan_keys(plan, position.take()))
            .await?;
        if page.items.iter().any(|id| id == key_id) {
            return Ok(true);
        }
        match page.position {
            Some(next) => position = Some(next),
            None => return Ok(false),
        }
    }
}
