use serde::{Deserialize, Serialize};

use changeset_core::{ObjectKey, ObjectRef};

use crate::Event;

/// Lifecycle transition reported by a change set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    /// An existing (loaded) object is now tracked.
    Register,
    /// A new object is now tracked and will be inserted.
    Add,
    /// A tracked object is scheduled for deletion.
    Remove,
}

impl LifecycleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleKind::Register => LifecycleEvent::REGISTER,
            LifecycleKind::Add => LifecycleEvent::ADD,
            LifecycleKind::Remove => LifecycleEvent::REMOVE,
        }
    }
}

impl core::fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event published by a change set; the payload is the object itself.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    kind: LifecycleKind,
    object: ObjectRef,
}

impl LifecycleEvent {
    pub const REGISTER: &'static str = "register";
    pub const ADD: &'static str = "add";
    pub const REMOVE: &'static str = "remove";

    pub fn new(kind: LifecycleKind, object: ObjectRef) -> Self {
        Self { kind, object }
    }

    pub fn register(object: ObjectRef) -> Self {
        Self::new(LifecycleKind::Register, object)
    }

    pub fn add(object: ObjectRef) -> Self {
        Self::new(LifecycleKind::Add, object)
    }

    pub fn remove(object: ObjectRef) -> Self {
        Self::new(LifecycleKind::Remove, object)
    }

    pub fn kind(&self) -> LifecycleKind {
        self.kind
    }

    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    pub fn key(&self) -> &ObjectKey {
        self.object.key()
    }
}

impl Event for LifecycleEvent {
    fn event_name(&self) -> &'static str {
        self.kind.as_str()
    }
}
