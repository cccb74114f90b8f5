//! Object loader boundary: fetches raw records on identity-map misses.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use changeset_core::{Identity, ObjectKey};

/// Raw record as produced by a loader; decoded by the repository into the entity type.
pub type Record = JsonValue;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("{0} not found")]
    NotFound(ObjectKey),

    #[error("loader backend failed: {0}")]
    Backend(String),
}

impl LoadError {
    pub fn not_found(entity_type: &'static str, identity: &Identity) -> Self {
        Self::NotFound(ObjectKey::new(entity_type, identity.clone()))
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

pub trait ObjectLoader {
    /// Fetch the record for `(entity_type, identity)`; `NotFound` if there is none.
    fn load(&self, entity_type: &'static str, identity: &Identity) -> Result<Record, LoadError>;
}

impl<L> ObjectLoader for Rc<L>
where
    L: ObjectLoader + ?Sized,
{
    fn load(&self, entity_type: &'static str, identity: &Identity) -> Result<Record, LoadError> {
        (**self).load(entity_type, identity)
    }
}

/// Loader backed by a closure.
pub struct FnLoader<F> {
    load: F,
}

impl<F> FnLoader<F>
where
    F: Fn(&'static str, &Identity) -> Result<Record, LoadError>,
{
    pub fn new(load: F) -> Self {
        Self { load }
    }
}

impl<F> ObjectLoader for FnLoader<F>
where
    F: Fn(&'static str, &Identity) -> Result<Record, LoadError>,
{
    fn load(&self, entity_type: &'static str, identity: &Identity) -> Result<Record, LoadError> {
        (self.load)(entity_type, identity)
    }
}

/// Loader that fabricates a record for any identity.
///
/// Every record is the configured template with the identity written into
/// `identity_field`. Useful for demos and tests that need "something that exists".
#[derive(Debug)]
pub struct GeneratingLoader {
    identity_field: String,
    template: Map<String, JsonValue>,
    loads: Cell<usize>,
}

impl GeneratingLoader {
    pub fn new(identity_field: impl Into<String>) -> Self {
        Self {
            identity_field: identity_field.into(),
            template: Map::new(),
            loads: Cell::new(0),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.template.insert(name.into(), value);
        self
    }

    /// Number of records produced so far.
    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl ObjectLoader for GeneratingLoader {
    fn load(&self, _entity_type: &'static str, identity: &Identity) -> Result<Record, LoadError> {
        let mut record = self.template.clone();
        let id = serde_json::to_value(identity).map_err(|e| LoadError::backend(e.to_string()))?;
        record.insert(self.identity_field.clone(), id);
        self.loads.set(self.loads.get() + 1);
        Ok(JsonValue::Object(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generating_loader_fills_in_the_identity() {
        let loader = GeneratingLoader::new("id").with_field("label", json!("generated"));

        let record = loader.load("widget", &Identity::from(9)).unwrap();
        assert_eq!(record, json!({"id": 9, "label": "generated"}));
        assert_eq!(loader.loads(), 1);
    }

    #[test]
    fn fn_loader_propagates_not_found() {
        let loader = FnLoader::new(|ty, id: &Identity| Err(LoadError::not_found(ty, id)));

        assert_eq!(
            loader.load("widget", &Identity::from(1)).unwrap_err(),
            LoadError::NotFound(ObjectKey::new("widget", 1))
        );
    }
}
