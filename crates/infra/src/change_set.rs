//! Change set: tracked objects, their baselines, and pending lifecycle transitions.
//!
//! ## Entry lifecycle
//!
//! ```text
//! register ──► Managed ──(commit)──► Managed (baseline refreshed)
//! add ───────► New ──────(commit)──► Managed
//! remove ────► Removed ──(commit)──► purged
//! ```
//!
//! ## Ordering
//!
//! Every entry carries the sequence number of its latest lifecycle transition (register,
//! add or remove). The commit plan is emitted in ascending sequence order: inserts follow
//! add order, deletes follow removal order, updates follow registration order.
//!
//! ## Events
//!
//! Each transition publishes exactly one [`LifecycleEvent`], after the change set has
//! released its internal borrows, so listeners may query the change set re-entrantly.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, warn};

use changeset_core::{EntityError, ObjectKey, ObjectRef, Snapshot};
use changeset_events::{EventBus, LifecycleEvent};

use crate::config::{DuplicateAdd, SessionConfig, TransientRemoval};
use crate::operation::{Operation, OperationKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChangeSetError {
    /// `register` was called for a key that is already tracked.
    #[error("{0} is already managed")]
    AlreadyManaged(ObjectKey),

    /// `add` was called for a key that is already tracked.
    #[error("{0} is already tracked")]
    DuplicateIdentity(ObjectKey),

    #[error("{0} is not managed")]
    NotManaged(ObjectKey),

    /// The key is tracked, but for a different instance than the one passed in.
    #[error("a different instance is managed for {0}")]
    StaleInstance(ObjectKey),

    #[error(transparent)]
    Entity(#[from] EntityError),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntryState {
    New,
    Managed,
    Removed,
}

#[derive(Debug)]
struct ManagedEntry {
    object: ObjectRef,
    /// Baseline for dirty checking; `None` until the object has been persisted once.
    original: Option<Snapshot>,
    state: EntryState,
    seq: u64,
}

impl ManagedEntry {
    fn is_transient(&self) -> bool {
        self.state == EntryState::Removed && self.original.is_none()
    }
}

pub struct ChangeSet {
    bus: Rc<dyn EventBus<LifecycleEvent>>,
    transient_removal: TransientRemoval,
    duplicate_add: DuplicateAdd,
    entries: RefCell<HashMap<ObjectKey, ManagedEntry>>,
    next_seq: Cell<u64>,
}

impl ChangeSet {
    pub fn new(bus: Rc<dyn EventBus<LifecycleEvent>>, config: &SessionConfig) -> Self {
        Self {
            bus,
            transient_removal: config.transient_removal,
            duplicate_add: config.duplicate_add,
            entries: RefCell::new(HashMap::new()),
            next_seq: Cell::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        seq
    }

    /// Track an object that already exists in the store, using its current field values
    /// as the baseline. Publishes `register`.
    pub fn register(&self, object: ObjectRef) -> Result<(), ChangeSetError> {
        let original = object.snapshot()?;

        {
            let mut entries = self.entries.borrow_mut();
            if entries.contains_key(object.key()) {
                return Err(ChangeSetError::AlreadyManaged(object.key().clone()));
            }
            let seq = self.next_seq();
            entries.insert(
                object.key().clone(),
                ManagedEntry {
                    object: object.clone(),
                    original: Some(original),
                    state: EntryState::Managed,
                    seq,
                },
            );
        }

        debug!(
            entity_type = object.entity_type(),
            identity = %object.identity(),
            "registered object"
        );
        self.bus.publish(&LifecycleEvent::register(object));
        Ok(())
    }

    /// Track a new object, to be inserted on the next commit. Publishes `add`.
    pub fn add(&self, object: ObjectRef) -> Result<(), ChangeSetError> {
        {
            let mut entries = self.entries.borrow_mut();
            if let Some(existing) = entries.get(object.key()) {
                if existing.is_transient() {
                    // Never persisted and already dropped from the plan.
                    debug!(identity = %object.identity(), "re-adding a discarded object");
                } else if existing.state == EntryState::New
                    && self.duplicate_add == DuplicateAdd::Replace
                {
                    warn!(
                        entity_type = object.entity_type(),
                        identity = %object.identity(),
                        "new object supersedes a pending insert with the same identity"
                    );
                } else {
                    return Err(ChangeSetError::DuplicateIdentity(object.key().clone()));
                }
            }
            let seq = self.next_seq();
            entries.insert(
                object.key().clone(),
                ManagedEntry {
                    object: object.clone(),
                    original: None,
                    state: EntryState::New,
                    seq,
                },
            );
        }

        debug!(
            entity_type = object.entity_type(),
            identity = %object.identity(),
            "added object"
        );
        self.bus.publish(&LifecycleEvent::add(object));
        Ok(())
    }

    /// Schedule a tracked object for deletion. Publishes `remove`.
    ///
    /// The entry stays in the change set until the next successful commit. Marking an
    /// already removed object again is a no-op and publishes nothing.
    pub fn mark_removed(&self, object: &ObjectRef) -> Result<(), ChangeSetError> {
        {
            let mut entries = self.entries.borrow_mut();
            let entry = entries
                .get_mut(object.key())
                .ok_or_else(|| ChangeSetError::NotManaged(object.key().clone()))?;
            if !entry.object.ptr_eq(object) {
                return Err(ChangeSetError::StaleInstance(object.key().clone()));
            }
            if entry.state == EntryState::Removed {
                debug!(identity = %object.identity(), "object already marked for removal");
                return Ok(());
            }
            entry.state = EntryState::Removed;
            entry.seq = self.next_seq();
        }

        debug!(
            entity_type = object.entity_type(),
            identity = %object.identity(),
            "marked object for removal"
        );
        self.bus.publish(&LifecycleEvent::remove(object.clone()));
        Ok(())
    }

    /// Compute the commit plan. Read-only: nothing changes until
    /// [`acknowledge_commit`](Self::acknowledge_commit).
    pub fn compute_operations(&self) -> Result<Vec<Operation>, ChangeSetError> {
        let entries = self.entries.borrow();
        let mut ordered: Vec<&ManagedEntry> = entries.values().collect();
        ordered.sort_by_key(|e| e.seq);

        let mut operations = Vec::new();
        for entry in ordered {
            match (entry.state, &entry.original) {
                (EntryState::New, _) | (EntryState::Managed, None) => {
                    operations.push(Operation::insert(
                        entry.object.clone(),
                        entry.object.snapshot()?,
                    ));
                }
                (EntryState::Managed, Some(original)) => {
                    let current = entry.object.snapshot()?;
                    let changes = original.diff(&current);
                    if !changes.is_empty() {
                        operations.push(Operation::update(entry.object.clone(), current, changes));
                    }
                }
                (EntryState::Removed, Some(_)) => {
                    operations.push(Operation::delete(entry.object.clone()));
                }
                (EntryState::Removed, None) => match self.transient_removal {
                    TransientRemoval::Discard => {}
                    TransientRemoval::Delete => {
                        operations.push(Operation::delete(entry.object.clone()));
                    }
                    TransientRemoval::InsertThenDelete => {
                        operations.push(Operation::insert(
                            entry.object.clone(),
                            entry.object.snapshot()?,
                        ));
                        operations.push(Operation::delete(entry.object.clone()));
                    }
                },
            }
        }

        Ok(operations)
    }

    /// Make a successfully committed plan the new baseline.
    ///
    /// Inserted and updated objects take the snapshot carried by their operation and
    /// become Managed, unless they were removed in the meantime. Deleted objects are
    /// purged, as are removed objects that were never persisted.
    pub fn acknowledge_commit(&self, operations: &[Operation]) {
        let mut entries = self.entries.borrow_mut();

        for op in operations {
            let Some(entry) = entries.get_mut(op.key()) else {
                continue;
            };
            if !entry.object.ptr_eq(op.object()) {
                continue;
            }

            match op.kind() {
                OperationKind::Insert | OperationKind::Update => {
                    entry.original = op.snapshot().cloned();
                    // Removed while the commit ran: the row now exists, so the delete
                    // stays pending for the next plan.
                    if entry.state != EntryState::Removed {
                        entry.state = EntryState::Managed;
                    }
                }
                OperationKind::Delete => {
                    entries.remove(op.key());
                }
            }
        }

        entries.retain(|_, e| !e.is_transient());
    }

    pub fn state_of(&self, key: &ObjectKey) -> Option<EntryState> {
        self.entries.borrow().get(key).map(|e| e.state)
    }

    pub fn is_managed(&self, key: &ObjectKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Tracked object for `key`, if any.
    pub fn get(&self, key: &ObjectKey) -> Option<ObjectRef> {
        self.entries.borrow().get(key).map(|e| e.object.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl core::fmt::Debug for ChangeSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChangeSet")
            .field("entries", &self.len())
            .field("transient_removal", &self.transient_removal)
            .field("duplicate_add", &self.duplicate_add)
            .finish()
    }
}
