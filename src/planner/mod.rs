//! Planning module.
//!
//! This module holds the pieces that decide what to change and in which
//! order, independently of any remote service:
//! - the structural patch generator
//! - the call sequencer (rate limit, deadline, per-phase scheduling)
//! - the change journal

mod patch;
mod plan;
mod sequencer;

pub use patch::{
    PatchOp, PatchOperation, compute_patch, diff_documents, escape, merge_unechoed, to_value,
};
pub use plan::{Change, ChangeKind, ChangeSet, Target};
pub use sequencer::{Phase, PhasePolicies, RateLimiter, SchedulePolicy, Sequencer};
