//! Committer boundary: applies planned operations to a backing store.
//!
//! The unit of work calls [`Committer::apply`] once per operation, in plan order, and
//! stops at the first error. Operations applied before a failure are the committer's
//! own business to compensate or make idempotent; the change set keeps its pending state
//! so the whole plan can be retried.

use std::convert::Infallible;

use crate::operation::Operation;

pub trait Committer {
    type Error: std::error::Error + Send + Sync + 'static;

    fn apply(&mut self, operation: &Operation) -> Result<(), Self::Error>;
}

impl<C> Committer for &mut C
where
    C: Committer + ?Sized,
{
    type Error = C::Error;

    fn apply(&mut self, operation: &Operation) -> Result<(), Self::Error> {
        (**self).apply(operation)
    }
}

/// Committer that only records what it was asked to do.
///
/// The log accumulates across commits until [`clear`](Self::clear) is called.
#[derive(Debug, Default)]
pub struct LoggingCommitter {
    operations: Vec<Operation>,
}

impl LoggingCommitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applied operations, in the order they were submitted.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    pub fn take(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.operations)
    }
}

impl Committer for LoggingCommitter {
    type Error = Infallible;

    fn apply(&mut self, operation: &Operation) -> Result<(), Self::Error> {
        self.operations.push(operation.clone());
        Ok(())
    }
}
