//! Entity trait: identity + continuity across state changes.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{EntityError, EntityResult};
use crate::id::{Identity, ObjectKey};
use crate::snapshot::Snapshot;

/// An object whose lifecycle can be tracked.
///
/// The serde bounds are what makes dirty checking possible without reflection: the
/// serialized form of an entity is its field snapshot, and a raw record handed back by a
/// loader is decoded through `DeserializeOwned`.
pub trait Entity: Serialize + DeserializeOwned + 'static {
    /// Stable type name, used as the first half of every identity-map key.
    const ENTITY_TYPE: &'static str;

    /// Returns the entity identity.
    fn identity(&self) -> Identity;

    fn key(&self) -> ObjectKey {
        ObjectKey::new(Self::ENTITY_TYPE, self.identity())
    }

    /// Capture the current field values.
    fn snapshot(&self) -> EntityResult<Snapshot> {
        Snapshot::capture(Self::ENTITY_TYPE, self)
    }

    /// Build an entity from a raw record.
    fn from_record(record: serde_json::Value) -> EntityResult<Self> {
        serde_json::from_value(record).map_err(|e| EntityError::decode(Self::ENTITY_TYPE, e))
    }
}
