//! Binary media type support on the REST API.

use tracing::debug;

use crate::config::Definition;
use crate::error::Result;
use crate::gateway::RestApiInfo;
use crate::planner::{Change, PatchOp, PatchOperation, Target, escape};

use super::context::RunContext;

/// Media type accepted as binary when binary support is on.
pub const ANY_MEDIA_TYPE: &str = "*/*";

/// Adds `*/*` to the API's binary media types when the definition asks for
/// binary support and the type is not there yet.
///
/// Returns true when a change was made or planned.
///
/// # Errors
///
/// Returns an error if the patch call fails.
pub async fn ensure_binary_media_types(
    ctx: &RunContext<'_>,
    api: &RestApiInfo,
    definition: &Definition,
) -> Result<bool> {
    if !definition.binary_enabled() {
        return Ok(false);
    }
    if api.binary_media_types.iter().any(|t| t == ANY_MEDIA_TYPE) {
        debug!("Binary media type {ANY_MEDIA_TYPE} already enabled");
        return Ok(false);
    }

    let operations = vec![PatchOperation {
        op: PatchOp::Add,
        path: format!("/binaryMediaTypes/{}", escape(ANY_MEDIA_TYPE)),
        value: None,
    }];
    let change = Change::update(Target::RestApi, &api.name, operations.clone());
    ctx.mutate(change, "UpdateRestApi", || {
        ctx.backends.gateway.update_rest_api(&api.id, operations)
    })
    .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ResourceDef, SyncOptions};
    use crate::gateway::fake::FakeCloud;
    use std::time::Duration;

    fn binary_resource() -> Definition {
        Definition {
            resources: vec![ResourceDef {
                path: String::from("/files"),
                enable_binary: true,
                ..ResourceDef::default()
            }],
            ..Definition::default()
        }
    }

    #[tokio::test]
    async fn test_binary_type_added_once() {
        let cloud = FakeCloud::new("api");
        let backends = cloud.backends();
        let options = SyncOptions::new("api").with_call_interval(Duration::ZERO);

        for expected in [true, false] {
            let api = backends.gateway.get_rest_api("api").await.expect("api");
            let ctx = RunContext::new(&options, &backends);
            let changed = ensure_binary_media_types(&ctx, &api, &binary_resource())
                .await
                .expect("binary");
            assert_eq!(changed, expected);
        }

        assert_eq!(cloud.binary_media_types(), vec![String::from("*/*")]);
    }

    #[tokio::test]
    async fn test_disabled_binary_is_untouched() {
        let cloud = FakeCloud::new("api");
        let backends = cloud.backends();
        let options = SyncOptions::new("api").with_call_interval(Duration::ZERO);
        let ctx = RunContext::new(&options, &backends);
        let api = RestApiInfo {
            id: String::from("api"),
            ..RestApiInfo::default()
        };

        let changed = ensure_binary_media_types(&ctx, &api, &Definition::default())
            .await
            .expect("binary");

        assert!(!changed);
        assert!(cloud.binary_media_types().is_empty());
    }
}
