//! Per-run state shared by every reconciliation step.

use std::future::Future;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::SyncOptions;
use crate::error::Result;
use crate::gateway::Backends;
use crate::planner::{Change, ChangeSet, Sequencer};

/// Placeholder id given to objects that a dry-run would have created.
pub const DRY_RUN_ID: &str = "dry-run";

/// Options, services, sequencer and journal of one run.
///
/// Built at the start of a run and consumed by [`RunContext::finish`], so no
/// setting outlives the run that set it.
#[derive(Debug)]
pub struct RunContext<'a> {
    /// Run options.
    pub options: &'a SyncOptions,
    /// Remote services.
    pub backends: &'a Backends,
    /// Call scheduler; its deadline starts when the context is built.
    pub sequencer: Sequencer,
    journal: Mutex<ChangeSet>,
}

impl<'a> RunContext<'a> {
    /// Starts a run.
    #[must_use]
    pub fn new(options: &'a SyncOptions, backends: &'a Backends) -> Self {
        Self {
            options,
            backends,
            sequencer: Sequencer::new(options),
            journal: Mutex::new(ChangeSet::new(options.dry_run)),
        }
    }

    /// Issues a read call. Reads run in dry-run mode too.
    ///
    /// # Errors
    ///
    /// Returns the call's error or a deadline error.
    pub async fn read<T, Fut>(&self, operation: &str, call: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.sequencer.call(operation, call).await
    }

    /// Records a decision and, outside dry-run mode, applies it.
    ///
    /// Returns `None` in dry-run mode, where `call` is never invoked.
    ///
    /// # Errors
    ///
    /// Returns the call's error or a deadline error. A failed change is not
    /// recorded.
    pub async fn mutate<T, F, Fut>(&self, change: Change, operation: &str, call: F) -> Result<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.options.dry_run {
            info!("[dry-run] {change}");
            self.journal.lock().await.record(change);
            return Ok(None);
        }

        let value = self.sequencer.call(operation, call()).await?;
        info!("{change}");
        self.journal.lock().await.record(change.applied());
        Ok(Some(value))
    }

    /// Logs and records a non-fatal finding.
    pub async fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.journal.lock().await.warn(message);
    }

    /// Ends the run and returns its journal.
    #[must_use]
    pub fn finish(self) -> ChangeSet {
        self.journal.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::FakeCloud;
    use crate::planner::{ChangeKind, Target};
    use std::time::Duration;

    #[tokio::test]
    async fn test_dry_run_never_calls() {
        let cloud = FakeCloud::new("api");
        let backends = cloud.backends();
        let options = SyncOptions::new("api")
            .with_dry_run(true)
            .with_call_interval(Duration::ZERO);
        let ctx = RunContext::new(&options, &backends);

        let id = ctx
            .mutate(Change::create(Target::Resource, "/a"), "CreateResource", || {
                backends.gateway.create_resource("api", "root", "a")
            })
            .await
            .expect("planned");

        assert_eq!(id, None);
        assert!(cloud.calls().is_empty());
        let journal = ctx.finish();
        assert_eq!(journal.count_of(ChangeKind::Create, Target::Resource), 1);
        assert!(!journal.changes[0].applied);
    }

    #[tokio::test]
    async fn test_failed_change_is_not_recorded() {
        let cloud = FakeCloud::new("api");
        let backends = cloud.backends();
        let options = SyncOptions::new("api").with_call_interval(Duration::ZERO);
        let ctx = RunContext::new(&options, &backends);

        let result = ctx
            .mutate(Change::delete(Target::Resource, "/missing"), "DeleteResource", || {
                backends.gateway.delete_resource("api", "nope")
            })
            .await;

        assert!(result.is_err_and(|e| e.is_not_found()));
        ctx.warn("something odd").await;
        let journal = ctx.finish();
        assert!(journal.is_empty());
        assert_eq!(journal.warnings, vec![String::from("something odd")]);
    }
}
