//! Infrastructure layer: change tracking, identity map, unit of work, repositories.
//!
//! ## Components
//!
//! - `IdentityMap`: one live instance per `(type, identity)`
//! - `ChangeSet`: tracked objects, baselines, pending lifecycle transitions
//! - `IdentityMapSynchronizer`: mirrors change-set events into the identity map
//! - `UnitOfWork`: plans and drives a commit
//! - `ObjectRepository` / `ObjectManager`: per-type facade and its entry point
//! - `Session`: wires all of the above for one unit-of-work scope

pub mod change_set;
pub mod committer;
pub mod config;
pub mod identity_map;
pub mod loader;
pub mod object_manager;
pub mod operation;
pub mod repository;
pub mod session;
pub mod store;
pub mod synchronizer;
pub mod unit_of_work;

#[cfg(test)]
mod test_support;

pub use change_set::{ChangeSet, ChangeSetError, EntryState};
pub use committer::{Committer, LoggingCommitter};
pub use config::{ConfigError, DuplicateAdd, SessionConfig, TransientRemoval};
pub use identity_map::IdentityMap;
pub use loader::{FnLoader, GeneratingLoader, LoadError, ObjectLoader, Record};
pub use object_manager::{ObjectManager, ObjectRepositoryFactory, RepositoryFactory};
pub use operation::{Operation, OperationKind};
pub use repository::{ObjectRepository, RepositoryError};
pub use session::Session;
pub use store::{InMemoryStore, StoreCommitter, StoreError};
pub use synchronizer::IdentityMapSynchronizer;
pub use unit_of_work::{CommitSummary, UnitOfWork, UnitOfWorkError};
