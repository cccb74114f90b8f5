//! Unit of work: turns the change set into one ordered batch and drives a committer.
//!
//! ## Commit protocol
//!
//! ```text
//! 1. Plan     ChangeSet::compute_operations()   (read-only)
//! 2. Apply    Committer::apply(op) for each op, in plan order, stop at first error
//! 3. Settle   ChangeSet::acknowledge_commit(ops) (only if every apply succeeded)
//! ```
//!
//! A commit is all-or-nothing from the change set's point of view: when the committer
//! fails, step 3 never runs and every pending insert, update and delete is still there
//! for a retry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{Span, debug, info, instrument, warn};

use changeset_core::ObjectKey;

use crate::change_set::{ChangeSet, ChangeSetError};
use crate::committer::Committer;
use crate::config::SessionConfig;
use crate::operation::{Operation, OperationKind};

#[derive(Debug, Error)]
pub enum UnitOfWorkError {
    /// The commit plan could not be computed (e.g. an object was mutably borrowed).
    #[error("failed to plan commit: {0}")]
    Plan(#[from] ChangeSetError),

    /// The committer rejected an operation; nothing was acknowledged.
    #[error("commit failed at operation {index} ({kind} {key}): {source}")]
    CommitFailed {
        index: usize,
        kind: OperationKind,
        key: ObjectKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub committed_at: DateTime<Utc>,
}

impl CommitSummary {
    fn from_operations(operations: &[Operation]) -> Self {
        let count = |kind| operations.iter().filter(|op| op.kind() == kind).count();
        Self {
            inserted: count(OperationKind::Insert),
            updated: count(OperationKind::Update),
            deleted: count(OperationKind::Delete),
            committed_at: Utc::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug)]
pub struct UnitOfWork {
    change_set: ChangeSet,
    log_operations: bool,
}

impl UnitOfWork {
    pub fn new(change_set: ChangeSet, config: &SessionConfig) -> Self {
        Self {
            change_set,
            log_operations: config.log_operations,
        }
    }

    pub fn change_set(&self) -> &ChangeSet {
        &self.change_set
    }

    /// The plan the next commit would execute (dry run).
    pub fn pending_operations(&self) -> Result<Vec<Operation>, ChangeSetError> {
        self.change_set.compute_operations()
    }

    pub fn has_pending_changes(&self) -> Result<bool, ChangeSetError> {
        Ok(!self.change_set.compute_operations()?.is_empty())
    }

    #[instrument(skip_all, fields(operations = tracing::field::Empty))]
    pub fn commit<C>(&self, committer: &mut C) -> Result<CommitSummary, UnitOfWorkError>
    where
        C: Committer + ?Sized,
    {
        let operations = self.change_set.compute_operations()?;
        Span::current().record("operations", operations.len());

        for (index, op) in operations.iter().enumerate() {
            if self.log_operations {
                debug!(index, kind = %op.kind(), key = %op.key(), "applying operation");
            }
            if let Err(err) = committer.apply(op) {
                warn!(index, kind = %op.kind(), key = %op.key(), error = %err, "commit failed");
                return Err(UnitOfWorkError::CommitFailed {
                    index,
                    kind: op.kind(),
                    key: op.key().clone(),
                    source: Box::new(err),
                });
            }
        }

        self.change_set.acknowledge_commit(&operations);

        let summary = CommitSummary::from_operations(&operations);
        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            deleted = summary.deleted,
            "commit completed"
        );
        Ok(summary)
    }
}
