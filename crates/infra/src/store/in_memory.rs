use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use changeset_core::{Identity, ObjectKey};

use crate::committer::Committer;
use crate::loader::{LoadError, ObjectLoader, Record};
use crate::operation::{Operation, OperationKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Insert of a key that already has a row.
    #[error("row already exists: {0}")]
    Conflict(ObjectKey),

    /// Update or delete of a key without a row.
    #[error("row does not exist: {0}")]
    Missing(ObjectKey),

    /// An insert/update arrived without the state to write.
    #[error("operation carries no state: {0}")]
    MissingState(ObjectKey),
}

/// A stored record with its write metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub record: Record,
    /// Starts at 1 on insert, +1 on every update.
    pub version: u64,
    pub written_at: DateTime<Utc>,
}

/// In-memory keyed record store.
///
/// Intended for tests/dev. Serves as both loader and committer: records written by a
/// commit can be loaded back by a later session.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: RefCell<HashMap<ObjectKey, StoredRow>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row directly, bypassing the commit path.
    pub fn seed(&self, entity_type: &'static str, identity: impl Into<Identity>, record: Record) {
        self.rows.borrow_mut().insert(
            ObjectKey::new(entity_type, identity),
            StoredRow {
                record,
                version: 1,
                written_at: Utc::now(),
            },
        );
    }

    pub fn row(&self, key: &ObjectKey) -> Option<StoredRow> {
        self.rows.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.rows.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    /// Committer writing into this store.
    pub fn committer(&self) -> StoreCommitter<'_> {
        StoreCommitter { store: self }
    }

    fn write(&self, operation: &Operation) -> Result<(), StoreError> {
        let key = operation.key().clone();
        let mut rows = self.rows.borrow_mut();

        match operation.kind() {
            OperationKind::Insert => {
                if rows.contains_key(&key) {
                    return Err(StoreError::Conflict(key));
                }
                let record = state_of(operation)?;
                rows.insert(
                    key,
                    StoredRow {
                        record,
                        version: 1,
                        written_at: Utc::now(),
                    },
                );
            }
            OperationKind::Update => {
                let record = state_of(operation)?;
                let row = rows.get_mut(&key).ok_or(StoreError::Missing(key))?;
                row.record = record;
                row.version += 1;
                row.written_at = Utc::now();
            }
            OperationKind::Delete => {
                rows.remove(&key).ok_or(StoreError::Missing(key))?;
            }
        }

        Ok(())
    }
}

fn state_of(operation: &Operation) -> Result<Record, StoreError> {
    operation
        .snapshot()
        .map(|s| s.clone().into_value())
        .ok_or_else(|| StoreError::MissingState(operation.key().clone()))
}

impl ObjectLoader for InMemoryStore {
    fn load(&self, entity_type: &'static str, identity: &Identity) -> Result<Record, LoadError> {
        self.rows
            .borrow()
            .get(&ObjectKey::new(entity_type, identity.clone()))
            .map(|row| row.record.clone())
            .ok_or_else(|| LoadError::not_found(entity_type, identity))
    }
}

/// Committer handle returned by [`InMemoryStore::committer`].
#[derive(Debug, Clone, Copy)]
pub struct StoreCommitter<'a> {
    store: &'a InMemoryStore,
}

impl Committer for StoreCommitter<'_> {
    type Error = StoreError;

    fn apply(&mut self, operation: &Operation) -> Result<(), Self::Error> {
        self.store.write(operation)
    }
}
