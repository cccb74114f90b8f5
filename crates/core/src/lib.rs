//! `changeset-core`: building blocks for tracked objects.
//!
//! This crate contains the **pure** primitives (no lifecycle or persistence concerns):
//! identities, the [`Entity`] trait, field snapshots and type-erased object handles.

pub mod entity;
pub mod error;
pub mod id;
pub mod object;
pub mod snapshot;

pub use entity::Entity;
pub use error::{EntityError, EntityResult};
pub use id::{Identity, ObjectKey};
pub use object::{ObjectRef, Shared, WeakObjectRef, shared};
pub use snapshot::{FieldChange, Snapshot};
