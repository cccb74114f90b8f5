//! Identity map: at most one live instance per `(type, identity)`.
//!
//! The map is a non-owning cache. It holds weak handles only, and its contents are
//! driven by the [`IdentityMapSynchronizer`](crate::synchronizer::IdentityMapSynchronizer)
//! rather than by the map itself: it never evicts on its own, except for dropping a
//! handle whose object no longer exists anywhere else.

use std::cell::RefCell;
use std::collections::HashMap;

use changeset_core::{Entity, Identity, ObjectKey, ObjectRef, Shared, WeakObjectRef};

#[derive(Debug, Default)]
pub struct IdentityMap {
    entries: RefCell<HashMap<ObjectKey, WeakObjectRef>>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, entity_type: &'static str, identity: &Identity) -> bool {
        self.get(entity_type, identity).is_some()
    }

    pub fn get(&self, entity_type: &'static str, identity: &Identity) -> Option<ObjectRef> {
        let key = ObjectKey::new(entity_type, identity.clone());
        let mut entries = self.entries.borrow_mut();

        match entries.get(&key).map(WeakObjectRef::upgrade) {
            Some(Some(object)) => Some(object),
            Some(None) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Typed lookup; `None` on a miss or if the cached object is of another type.
    pub fn get_typed<T: Entity>(&self, identity: &Identity) -> Option<Shared<T>> {
        self.get(T::ENTITY_TYPE, identity)
            .and_then(|object| object.downcast::<T>())
    }

    pub fn set(&self, entity_type: &'static str, identity: Identity, object: &ObjectRef) {
        self.entries
            .borrow_mut()
            .insert(ObjectKey::new(entity_type, identity), object.downgrade());
    }

    /// Insert `object` under its own key.
    pub fn insert(&self, object: &ObjectRef) {
        self.set(object.entity_type(), object.identity().clone(), object);
    }

    pub fn remove(&self, entity_type: &'static str, identity: &Identity) -> bool {
        self.entries
            .borrow_mut()
            .remove(&ObjectKey::new(entity_type, identity.clone()))
            .is_some()
    }

    /// Number of cached handles, dead ones included until they are next looked up.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Widget, widget};

    #[test]
    fn set_get_has_remove() {
        let map = IdentityMap::new();
        let w = widget(1, "a");
        let r = ObjectRef::new(&w).unwrap();
        let id = Identity::from(1);

        assert!(!map.has("widget", &id));
        map.set("widget", id.clone(), &r);

        assert!(map.has("widget", &id));
        assert!(map.get("widget", &id).unwrap().is(&w));
        assert!(!map.has("gadget", &id));

        assert!(map.remove("widget", &id));
        assert!(!map.remove("widget", &id));
        assert!(map.get("widget", &id).is_none());
    }

    #[test]
    fn typed_lookup_returns_the_same_instance() {
        let map = IdentityMap::new();
        let w = widget(7, "a");
        map.insert(&ObjectRef::new(&w).unwrap());

        let cached = map.get_typed::<Widget>(&Identity::from(7)).unwrap();
        assert!(std::rc::Rc::ptr_eq(&w, &cached));
    }

    #[test]
    fn does_not_keep_objects_alive() {
        let map = IdentityMap::new();
        let w = widget(1, "a");
        map.insert(&ObjectRef::new(&w).unwrap());
        assert_eq!(map.len(), 1);

        drop(w);
        assert!(!map.has("widget", &Identity::from(1)));
        assert!(map.is_empty());
    }
}
