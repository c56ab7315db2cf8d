//! Call scheduling.
//!
//! Every remote call goes through a [`Sequencer`], which applies three rules:
//! - a leaky-bucket [`RateLimiter`] spaces calls by a minimum interval no
//!   matter how many are in flight,
//! - a run deadline bounds how long any call may take,
//! - each phase is scheduled by an explicit [`SchedulePolicy`].

use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::SyncOptions;
use crate::error::{Result, SyncError};

/// How the items of one phase are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePolicy {
    /// One item at a time, in order.
    Sequential,
    /// Up to `max_in_flight` items at once, results kept in input order.
    BoundedFanOut {
        /// Concurrency cap.
        max_in_flight: usize,
    },
}

/// Phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Remote existence checks during validation.
    Preflight,
    /// Authorizer creation.
    Authorizers,
    /// Resource path creation.
    Resources,
    /// Methods of one resource.
    Methods,
    /// Method and integration responses of one method.
    Responses,
    /// Invoke permissions of one function.
    Permissions,
    /// Alarm creation.
    Alarms,
    /// API key creation.
    ApiKeys,
    /// Resource deletion.
    Prune,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Preflight => "preflight",
            Self::Authorizers => "authorizers",
            Self::Resources => "resources",
            Self::Methods => "methods",
            Self::Responses => "responses",
            Self::Permissions => "permissions",
            Self::Alarms => "alarms",
            Self::ApiKeys => "api keys",
            Self::Prune => "prune",
        };
        write!(f, "{s}")
    }
}

/// Policy for every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasePolicies {
    max_in_flight: usize,
}

impl PhasePolicies {
    /// Creates policies with the given fan-out width.
    #[must_use]
    pub const fn new(max_in_flight: usize) -> Self {
        Self { max_in_flight }
    }

    /// Returns the policy for a phase.
    ///
    /// Path creation must go parent before child, and methods and responses
    /// share one endpoint's call budget, so those phases are sequential.
    #[must_use]
    pub const fn policy(&self, phase: Phase) -> SchedulePolicy {
        match phase {
            Phase::Resources | Phase::Methods | Phase::Responses | Phase::Permissions => {
                SchedulePolicy::Sequential
            }
            Phase::Preflight | Phase::Authorizers | Phase::Alarms | Phase::ApiKeys | Phase::Prune => {
                SchedulePolicy::BoundedFanOut {
                    max_in_flight: self.max_in_flight,
                }
            }
        }
    }
}

/// Leaky-bucket limiter: call slots are handed out at least `interval` apart.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum spacing.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Waits for the next free slot.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + self.interval);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}

/// Rate-limited, deadline-bounded executor for remote calls.
#[derive(Debug)]
pub struct Sequencer {
    limiter: RateLimiter,
    policies: PhasePolicies,
    deadline: Option<Instant>,
}

impl Sequencer {
    /// Creates a sequencer from run options. The deadline starts now.
    #[must_use]
    pub fn new(options: &SyncOptions) -> Self {
        Self {
            limiter: RateLimiter::new(options.call_interval),
            policies: PhasePolicies::new(options.max_in_flight.max(1)),
            deadline: options.deadline.map(|d| Instant::now() + d),
        }
    }

    /// Returns the policy for a phase.
    #[must_use]
    pub const fn policy(&self, phase: Phase) -> SchedulePolicy {
        self.policies.policy(phase)
    }

    /// Runs one remote call under the rate limit and the run deadline.
    ///
    /// # Errors
    ///
    /// Returns the call's own error, or [`SyncError::DeadlineExceeded`] if the
    /// deadline elapses first. A call cut off by the deadline is dropped, and
    /// its remote outcome is unknown.
    pub async fn call<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let guarded = async {
            self.limiter.acquire().await;
            debug!("Calling {operation}");
            call.await
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .unwrap_or_else(|_| {
                    warn!("Deadline exceeded during {operation}");
                    Err(SyncError::DeadlineExceeded {
                        operation: operation.to_string(),
                    })
                }),
            None => guarded.await,
        }
    }

    /// Runs `f` over every item according to the phase policy.
    ///
    /// Results come back in input order. The first error stops the phase.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub async fn run<I, T, F, Fut>(&self, phase: Phase, items: I, mut f: F) -> Result<Vec<T>>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.policy(phase) {
            SchedulePolicy::Sequential => {
                let mut results = Vec::new();
                for item in items {
                    results.push(f(item).await?);
                }
                Ok(results)
            }
            SchedulePolicy::BoundedFanOut { max_in_flight } => {
                stream::iter(items)
                    .map(f)
                    .buffered(max_in_flight)
                    .try_collect()
                    .await
            }
        }
    }
}
