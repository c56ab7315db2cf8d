//! Structural diff between two documents, rendered as patch operations.
//!
//! Only whitelisted top-level fields are compared. Nested objects are walked
//! recursively and every differing leaf becomes one operation. Operations are
//! emitted in a fixed order (add, then replace, then remove), and within each
//! group in key order, so the same inputs always produce the same patch.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Result, SyncError};

/// Kind of a patch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    /// The field is new.
    Add,
    /// The field changed.
    Replace,
    /// The field must go.
    Remove,
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Remove => "remove",
        };
        write!(f, "{s}")
    }
}

/// One field-level change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOperation {
    /// Operation kind.
    pub op: PatchOp,
    /// JSON-pointer path of the field.
    pub path: String,
    /// New value, stringified. Empty for removals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PatchOperation {
    fn new(op: PatchOp, path: String, value: Option<String>) -> Self {
        let value = if op == PatchOp::Remove { Some(String::new()) } else { value };
        Self { op, path, value }
    }
}

impl fmt::Display for PatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.path)?;
        if let Some(value) = self.value.as_deref().filter(|v| !v.is_empty()) {
            write!(f, " = {value}")?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Changes {
    added: Vec<PatchOperation>,
    replaced: Vec<PatchOperation>,
    removed: Vec<PatchOperation>,
}

impl Changes {
    fn into_patch(self) -> Option<Vec<PatchOperation>> {
        let patch: Vec<_> = self
            .added
            .into_iter()
            .chain(self.replaced)
            .chain(self.removed)
            .collect();
        (!patch.is_empty()).then_some(patch)
    }
}

/// Computes the patch turning `current` into `desired`, looking only at the
/// top-level fields named in `mutable_fields`.
///
/// Returns `None` when no whitelisted field differs.
#[must_use]
pub fn compute_patch(
    desired: &Value,
    current: &Value,
    mutable_fields: &[&str],
) -> Option<Vec<PatchOperation>> {
    let empty = Map::new();
    let desired = desired.as_object().unwrap_or(&empty);
    let current = current.as_object().unwrap_or(&empty);

    let mut changes = Changes::default();
    for key in union_keys(desired, current) {
        if !mutable_fields.contains(&key.as_str()) {
            continue;
        }
        classify(
            &format!("/{}", escape(&key)),
            desired.get(&key),
            current.get(&key),
            &mut changes,
        );
    }
    changes.into_patch()
}

/// Serializes both documents and diffs them.
///
/// # Errors
///
/// Returns an error if either document cannot be serialized.
pub fn diff_documents<T: Serialize>(
    desired: &T,
    current: &T,
    mutable_fields: &[&str],
) -> Result<Option<Vec<PatchOperation>>> {
    let desired = to_value(desired)?;
    let current = to_value(current)?;
    Ok(compute_patch(&desired, &current, mutable_fields))
}

/// Serializes a document for diffing.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn to_value<T: Serialize>(document: &T) -> Result<Value> {
    serde_json::to_value(document)
        .map_err(|e| SyncError::internal(format!("Failed to serialize document: {e}")))
}

/// Copies entries of `desired[field]` that the service never echoes back
/// (explicit nulls and empty strings) into `current[field]` when `current`
/// lacks them, so they do not show up as additions on every run.
pub fn merge_unechoed(desired: &Value, current: &mut Value, field: &str) {
    let Some(wanted) = desired.get(field).and_then(Value::as_object) else {
        return;
    };
    let Some(current) = current.as_object_mut() else {
        return;
    };
    let slot = current
        .entry(field)
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(slot) = slot.as_object_mut() else {
        return;
    };
    for (key, value) in wanted {
        let unechoed = value.is_null() || value.as_str().is_some_and(str::is_empty);
        if unechoed && !slot.contains_key(key) {
            slot.insert(key.clone(), value.clone());
        }
    }
}

fn classify(path: &str, desired: Option<&Value>, current: Option<&Value>, changes: &mut Changes) {
    match (desired, current) {
        (None, None) => {}
        (None, Some(_)) | (Some(Value::Null), Some(_)) => {
            if current != Some(&Value::Null) {
                changes
                    .removed
                    .push(PatchOperation::new(PatchOp::Remove, path.to_string(), None));
            }
        }
        (Some(value), None) => leaves(path, value, PatchOp::Add, changes),
        (Some(want), Some(have)) if want == have => {}
        (Some(Value::Object(want)), Some(Value::Object(have))) => {
            for key in union_keys(want, have) {
                classify(
                    &format!("{path}/{}", escape(&key)),
                    want.get(&key),
                    have.get(&key),
                    changes,
                );
            }
        }
        (Some(value), Some(_)) => leaves(path, value, PatchOp::Replace, changes),
    }
}

fn leaves(path: &str, value: &Value, op: PatchOp, changes: &mut Changes) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                leaves(&format!("{path}/{}", escape(key)), nested, op, changes);
            }
        }
        Value::Null => changes
            .removed
            .push(PatchOperation::new(PatchOp::Remove, path.to_string(), None)),
        scalar => {
            let op = PatchOperation::new(op, path.to_string(), Some(stringify(scalar)));
            match op.op {
                PatchOp::Add => changes.added.push(op),
                PatchOp::Replace => changes.replaced.push(op),
                PatchOp::Remove => changes.removed.push(op),
            }
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn union_keys(a: &Map<String, Value>, b: &Map<String, Value>) -> BTreeSet<String> {
    a.keys().chain(b.keys()).cloned().collect()
}

/// Escapes a key for use in a JSON pointer.
#[must_use]
pub fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
