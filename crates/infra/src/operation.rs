//! Operations handed to a committer.

use serde::{Deserialize, Serialize};

use changeset_core::{Entity, FieldChange, Identity, ObjectKey, ObjectRef, Shared, Snapshot};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }
}

impl core::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a commit plan.
///
/// Operations are transient: produced by the change set for a single commit and not kept
/// by the tracking layer afterwards.
///
/// Inserts and updates carry the snapshot the plan was computed from: that is the state
/// to persist, and it becomes the object's new baseline once the commit succeeds.
/// `changes` is only populated for updates.
#[derive(Debug, Clone)]
pub struct Operation {
    kind: OperationKind,
    object: ObjectRef,
    snapshot: Option<Snapshot>,
    changes: Vec<FieldChange>,
}

impl Operation {
    pub fn insert(object: ObjectRef, snapshot: Snapshot) -> Self {
        Self {
            kind: OperationKind::Insert,
            object,
            snapshot: Some(snapshot),
            changes: Vec::new(),
        }
    }

    pub fn update(object: ObjectRef, snapshot: Snapshot, changes: Vec<FieldChange>) -> Self {
        Self {
            kind: OperationKind::Update,
            object,
            snapshot: Some(snapshot),
            changes,
        }
    }

    pub fn delete(object: ObjectRef) -> Self {
        Self {
            kind: OperationKind::Delete,
            object,
            snapshot: None,
            changes: Vec::new(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    pub fn key(&self) -> &ObjectKey {
        self.object.key()
    }

    pub fn entity_type(&self) -> &'static str {
        self.object.entity_type()
    }

    pub fn identity(&self) -> &Identity {
        self.object.identity()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    /// Whether this operation targets `object` (pointer identity).
    pub fn targets<T: Entity>(&self, object: &Shared<T>) -> bool {
        self.object.is(object)
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.kind, self.object.key())
    }
}
