//! Reference storage backend.
//!
//! Real backends live outside this crate; the in-memory store exists so that the
//! loader and committer boundaries can be exercised end to end in tests and demos.

pub mod in_memory;

pub use in_memory::{InMemoryStore, StoreCommitter, StoreError, StoredRow};
