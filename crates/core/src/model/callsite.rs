use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier of a callsite, unique within one snapshot.
pub type CallsiteId = u64;

/// Label used for callsites whose symbol could not be resolved.
pub const UNRESOLVED: &str = "unresolved";

/// Label given to the synthetic node that small callsites are folded into.
pub const MERGED_NAME: &str = "[merged]";

/// One node of a call-tree profile in flat form.
///
/// A snapshot is a parent-before-child ordered sequence of these. Sizes are
/// in the profile's value unit (samples, bytes, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallsiteRecord {
    pub id: CallsiteId,
    #[serde(default)]
    pub parent_id: Option<CallsiteId>,
    /// Distance from the nearest root (0 for roots).
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub name: Option<Arc<str>>,
    /// Size attributed to this callsite alone.
    #[serde(default)]
    pub self_size: f64,
    /// Size of this callsite including all descendants.
    #[serde(default)]
    pub total_size: f64,
    /// Binary or library the symbol belongs to.
    #[serde(default)]
    pub mapping: Option<Arc<str>>,
    /// Set on synthetic nodes produced by small-callsite merging.
    #[serde(default)]
    pub merged: bool,
    /// Derived by the highlight pass; never part of the source data.
    #[serde(default, skip_serializing)]
    pub highlighted: bool,
}

impl CallsiteRecord {
    /// A root callsite with no sizes set.
    pub fn root(id: CallsiteId, name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            parent_id: None,
            depth: 0,
            name: Some(name.into()),
            self_size: 0.0,
            total_size: 0.0,
            mapping: None,
            merged: false,
            highlighted: false,
        }
    }

    /// A callsite one level below `parent`.
    pub fn child_of(parent: &CallsiteRecord, id: CallsiteId, name: impl Into<Arc<str>>) -> Self {
        Self {
            parent_id: Some(parent.id),
            depth: parent.depth + 1,
            ..Self::root(id, name)
        }
    }

    pub fn with_sizes(mut self, self_size: f64, total_size: f64) -> Self {
        self.self_size = self_size;
        self.total_size = total_size;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The name, or `"unresolved"` when the symbol is unknown.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNRESOLVED)
    }
}

/// An immutable, cheaply clonable flamegraph snapshot.
///
/// Cloning shares the underlying records, and [`Snapshot::same`] compares by
/// pointer so callers can tell "the same data again" from "new data" without
/// looking at the records.
#[derive(Debug, Clone)]
pub struct Snapshot(Arc<[CallsiteRecord]>);

impl Snapshot {
    pub fn new(records: Vec<CallsiteRecord>) -> Self {
        Self(records.into())
    }

    pub fn records(&self) -> &[CallsiteRecord] {
        &self.0
    }

    /// Whether both handles point at the same allocation.
    pub fn same(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Snapshot {
    type Target = [CallsiteRecord];

    fn deref(&self) -> &[CallsiteRecord] {
        &self.0
    }
}

impl From<Vec<CallsiteRecord>> for Snapshot {
    fn from(records: Vec<CallsiteRecord>) -> Self {
        Self::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_unresolved() {
        let mut record = CallsiteRecord::root(1, "main");
        assert_eq!(record.display_name(), "main");
        record.name = None;
        assert_eq!(record.display_name(), "unresolved");
    }

    #[test]
    fn child_of_links_parent_and_depth() {
        let main = CallsiteRecord::root(1, "main");
        let foo = CallsiteRecord::child_of(&main, 2, "foo");
        let bar = CallsiteRecord::child_of(&foo, 3, "bar");
        assert_eq!(foo.parent_id, Some(1));
        assert_eq!(bar.depth, 2);
        assert!(main.is_root());
        assert!(!bar.is_root());
    }

    #[test]
    fn snapshot_identity_is_by_pointer() {
        let records = vec![CallsiteRecord::root(1, "main")];
        let a = Snapshot::new(records.clone());
        let b = a.clone();
        let c = Snapshot::new(records);
        assert!(a.same(&b));
        assert!(!a.same(&c));
        assert_eq!(a.records(), c.records());
    }

    #[test]
    fn deserializes_with_missing_optional_fields() {
        let json = r#"{"id": 4, "parent_id": 1, "depth": 1, "total_size": 12.5}"#;
        let record: CallsiteRecord = serde_json::from_str(json).unwrap_or_else(|_| CallsiteRecord::root(0, ""));
        assert_eq!(record.id, 4);
        assert_eq!(record.name, None);
        assert_eq!(record.self_size, 0.0);
        assert_eq!(record.total_size, 12.5);
        assert!(!record.highlighted);
    }

    #[test]
    fn highlighted_is_not_serialized() {
        let mut record = CallsiteRecord::root(1, "main");
        record.highlighted = true;
        let json = serde_json::to_string(&record).unwrap_or_default();
        assert!(!json.contains("highlighted"));
    }
}
