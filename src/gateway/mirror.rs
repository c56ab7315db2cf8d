//! Snapshot of the remote resource tree.

use tracing::{info, warn};

use crate::config::normalize_path;
use crate::error::Result;
use crate::model::{HttpMethod, MethodNode, ResourceNode, ResourceTree};
use crate::planner::Sequencer;

use super::api::GatewayApi;
use super::types::RemoteResource;

/// Reads every resource of one API into a [`ResourceTree`].
pub struct RemoteMirror<'a> {
    gateway: &'a dyn GatewayApi,
    sequencer: &'a Sequencer,
    rest_api_id: &'a str,
}

impl<'a> RemoteMirror<'a> {
    /// Creates a mirror for one API.
    #[must_use]
    pub const fn new(gateway: &'a dyn GatewayApi, sequencer: &'a Sequencer, rest_api_id: &'a str) -> Self {
        Self {
            gateway,
            sequencer,
            rest_api_id,
        }
    }

    /// Follows every page of the resource listing.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be fetched.
    pub async fn fetch(&self) -> Result<ResourceTree> {
        let mut tree = ResourceTree::new();
        let mut position = None;
        let mut pages = 0_usize;

        loop {
            let page = self
                .sequencer
                .call(
                    "GetResources",
                    self.gateway.get_resources(self.rest_api_id, position.take()),
                )
                .await?;
            pages += 1;

            for resource in page.items {
                tree.insert(normalize_resource(resource));
            }

            match page.position {
                Some(next) => position = Some(next),
                None => break,
            }
        }

        info!(
            "Fetched {} resources of {} in {pages} page(s)",
            tree.len(),
            self.rest_api_id
        );
        Ok(tree)
    }
}

impl std::fmt::Debug for RemoteMirror<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteMirror")
            .field("rest_api_id", &self.rest_api_id)
            .finish_non_exhaustive()
    }
}

/// Converts one listed resource into the normalized model.
///
/// Verbs this engine does not manage are dropped with a warning.
#[must_use]
pub fn normalize_resource(resource: RemoteResource) -> ResourceNode {
    let path = normalize_path(&resource.path);
    let mut node = ResourceNode::new(
        resource.id,
        path,
        resource.parent_id,
        resource.path_part.unwrap_or_default(),
    );

    for (verb, method) in resource.methods {
        match verb.parse::<HttpMethod>() {
            Ok(http_method) => {
                node.methods.insert(
                    http_method,
                    MethodNode {
                        request: method.request,
                        integration: method.integration,
                        method_responses: method.method_responses,
                        integration_responses: method.integration_responses,
                    },
                );
            }
            Err(e) => warn!("Ignoring method on {}: {e}", node.path),
        }
    }

    node
}
