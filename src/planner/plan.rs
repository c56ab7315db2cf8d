//! Change journal for one run.
//!
//! Every decision the reconciler takes is recorded as a [`Change`], whether it
//! was applied or only planned (dry-run). The resulting [`ChangeSet`] is what
//! the CLI renders and what tests assert on.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::patch::PatchOperation;

/// What a change does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A new object.
    Create,
    /// A patch on an existing object.
    Update,
    /// A removal.
    Delete,
    /// A permission grant.
    Grant,
}

/// The kind of remote object a change touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Target {
    /// The REST API itself.
    RestApi,
    /// A path node.
    Resource,
    /// A method request.
    Method,
    /// A method integration.
    Integration,
    /// A method response.
    MethodResponse,
    /// An integration response.
    IntegrationResponse,
    /// A custom authorizer.
    Authorizer,
    /// A Lambda invoke permission.
    Permission,
    /// A metric alarm.
    Alarm,
    /// An API key.
    ApiKey,
    /// An API key's usage plan membership.
    UsagePlanKey,
    /// A stage deployment.
    Deployment,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Grant => "grant",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RestApi => "rest api",
            Self::Resource => "resource",
            Self::Method => "method",
            Self::Integration => "integration",
            Self::MethodResponse => "method response",
            Self::IntegrationResponse => "integration response",
            Self::Authorizer => "authorizer",
            Self::Permission => "permission",
            Self::Alarm => "alarm",
            Self::ApiKey => "api key",
            Self::UsagePlanKey => "usage plan key",
            Self::Deployment => "deployment",
        };
        write!(f, "{s}")
    }
}

/// One recorded decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    /// What is done.
    pub kind: ChangeKind,
    /// What it is done to.
    pub target: Target,
    /// Human-readable subject, e.g. `GET /users`.
    pub subject: String,
    /// Patch operations, for updates.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<PatchOperation>,
    /// False for dry-run decisions.
    pub applied: bool,
}

impl Change {
    /// Creates a change.
    #[must_use]
    pub fn new(kind: ChangeKind, target: Target, subject: impl Into<String>) -> Self {
        Self {
            kind,
            target,
            subject: subject.into(),
            operations: Vec::new(),
            applied: false,
        }
    }

    /// Shorthand for a creation.
    #[must_use]
    pub fn create(target: Target, subject: impl Into<String>) -> Self {
        Self::new(ChangeKind::Create, target, subject)
    }

    /// Shorthand for an update carrying its patch.
    #[must_use]
    pub fn update(target: Target, subject: impl Into<String>, operations: Vec<PatchOperation>) -> Self {
        Self {
            operations,
            ..Self::new(ChangeKind::Update, target, subject)
        }
    }

    /// Shorthand for a deletion.
    #[must_use]
    pub fn delete(target: Target, subject: impl Into<String>) -> Self {
        Self::new(ChangeKind::Delete, target, subject)
    }

    /// Shorthand for a permission grant.
    #[must_use]
    pub fn grant(subject: impl Into<String>) -> Self {
        Self::new(ChangeKind::Grant, Target::Permission, subject)
    }

    /// Marks the change as applied.
    #[must_use]
    pub const fn applied(mut self) -> Self {
        self.applied = true;
        self
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.kind, self.target, self.subject)?;
        if !self.operations.is_empty() {
            let ops: Vec<String> = self.operations.iter().map(ToString::to_string).collect();
            write!(f, " [{}]", ops.join(", "))?;
        }
        Ok(())
    }
}

/// Everything one run decided.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeSet {
    /// Unique id of the run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Whether the run was a dry-run.
    pub dry_run: bool,
    /// Recorded changes, in the order they were decided.
    pub changes: Vec<Change>,
    /// Non-fatal findings (skipped alarms, validation warnings).
    pub warnings: Vec<String>,
}

impl ChangeSet {
    /// Creates an empty journal.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            dry_run,
            changes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Records a change.
    pub fn record(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Records a warning.
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Returns true if nothing changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes of one kind.
    #[must_use]
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// Number of changes of one kind on one target.
    #[must_use]
    pub fn count_of(&self, kind: ChangeKind, target: Target) -> usize {
        self.changes
            .iter()
            .filter(|c| c.kind == kind && c.target == target)
            .count()
    }

    /// Changes touching one target.
    pub fn on(&self, target: Target) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(move |c| c.target == target)
    }
}

impl std::fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.changes.is_empty() {
            return write!(f, "No changes required");
        }

        let header = if self.dry_run { "Planned changes" } else { "Applied changes" };
        writeln!(f, "{header} ({}):", self.changes.len())?;
        for (i, change) in self.changes.iter().enumerate() {
            writeln!(f, "  {i}. {change}")?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "\nWarnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  - {warning}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{PatchOp, PatchOperation};

    #[test]
    fn test_counts() {
        let mut set = ChangeSet::new(false);
        set.record(Change::create(Target::Resource, "/users").applied());
        set.record(Change::create(Target::Method, "GET /users").applied());
        set.record(Change::delete(Target::Resource, "/old").applied());

        assert_eq!(set.count(ChangeKind::Create), 2);
        assert_eq!(set.count_of(ChangeKind::Create, Target::Resource), 1);
        assert_eq!(set.on(Target::Resource).count(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_display() {
        let change = Change::update(
            Target::Integration,
            "GET /users",
            vec![PatchOperation {
                op: PatchOp::Replace,
                path: String::from("/uri"),
                value: Some(String::from("http://b")),
            }],
        );
        assert_eq!(
            change.to_string(),
            "update integration GET /users [replace /uri = http://b]"
        );
        assert_eq!(ChangeSet::new(true).to_string(), "No changes required");
    }
}
