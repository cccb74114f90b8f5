//! Shared object handles.
//!
//! Callers mutate managed objects directly, so every object handed out by the tracking
//! layer is a [`Shared`] handle (`Rc<RefCell<T>>`). Components that must hold objects of
//! many types at once (change set, identity map, committers) use the type-erased
//! [`ObjectRef`], which keeps pointer identity and can be downcast back to the typed
//! handle.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use crate::id::{Identity, ObjectKey};
use crate::snapshot::Snapshot;

/// Typed handle to a managed object.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wrap a value into a [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

trait ManagedCell {
    fn capture(&self) -> EntityResult<Snapshot>;
    fn current_identity(&self) -> EntityResult<Identity>;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Entity> ManagedCell for RefCell<T> {
    fn capture(&self) -> EntityResult<Snapshot> {
        let object = self.try_borrow().map_err(|_| EntityError::Borrowed {
            entity_type: T::ENTITY_TYPE,
        })?;
        object.snapshot()
    }

    fn current_identity(&self) -> EntityResult<Identity> {
        let object = self.try_borrow().map_err(|_| EntityError::Borrowed {
            entity_type: T::ENTITY_TYPE,
        })?;
        Ok(object.identity())
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Type-erased, reference-counted handle to a managed object.
///
/// The key is captured when the handle is created. Two `ObjectRef`s are the same object
/// iff they point to the same allocation (see [`ObjectRef::ptr_eq`]).
#[derive(Clone)]
pub struct ObjectRef {
    key: ObjectKey,
    cell: Rc<dyn ManagedCell>,
}

impl ObjectRef {
    pub fn new<T: Entity>(object: &Shared<T>) -> EntityResult<Self> {
        let identity = object
            .try_borrow()
            .map_err(|_| EntityError::Borrowed {
                entity_type: T::ENTITY_TYPE,
            })?
            .identity();
        let cell: Rc<dyn ManagedCell> = object.clone();
        Ok(Self {
            key: ObjectKey::new(T::ENTITY_TYPE, identity),
            cell,
        })
    }

    pub fn key(&self) -> &ObjectKey {
        &self.key
    }

    pub fn entity_type(&self) -> &'static str {
        self.key.entity_type()
    }

    pub fn identity(&self) -> &Identity {
        self.key.identity()
    }

    /// Identity as currently reported by the object (may differ from [`Self::identity`]
    /// if the caller reassigned it after the handle was created).
    pub fn current_identity(&self) -> EntityResult<Identity> {
        self.cell.current_identity()
    }

    /// Capture the object's current field values.
    pub fn snapshot(&self) -> EntityResult<Snapshot> {
        self.cell.capture()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.cell), Rc::as_ptr(&other.cell))
    }

    /// Whether this handle points at `object`.
    pub fn is<T: Entity>(&self, object: &Shared<T>) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.cell), Rc::as_ptr(object))
    }

    /// Recover the typed handle; `None` if the object is of another type.
    pub fn downcast<T: Entity>(&self) -> Option<Shared<T>> {
        self.cell.clone().into_any().downcast::<RefCell<T>>().ok()
    }

    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef {
            key: self.key.clone(),
            cell: Rc::downgrade(&self.cell),
        }
    }
}

impl core::fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectRef")
            .field("key", &self.key)
            .field("ptr", &Rc::as_ptr(&self.cell).cast::<()>())
            .finish()
    }
}

/// Non-owning counterpart of [`ObjectRef`].
#[derive(Clone)]
pub struct WeakObjectRef {
    key: ObjectKey,
    cell: Weak<dyn ManagedCell>,
}

impl WeakObjectRef {
    pub fn key(&self) -> &ObjectKey {
        &self.key
    }

    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.cell.upgrade().map(|cell| ObjectRef {
            key: self.key.clone(),
            cell,
        })
    }

    pub fn is_alive(&self) -> bool {
        self.cell.strong_count() > 0
    }
}

impl core::fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WeakObjectRef")
            .field("key", &self.key)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Note {
        id: i64,
        body: String,
    }

    impl Entity for Note {
        const ENTITY_TYPE: &'static str = "note";

        fn identity(&self) -> Identity {
            Identity::from(self.id)
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Tag {
        id: i64,
    }

    impl Entity for Tag {
        const ENTITY_TYPE: &'static str = "tag";

        fn identity(&self) -> Identity {
            Identity::from(self.id)
        }
    }

    fn note(id: i64) -> Shared<Note> {
        shared(Note {
            id,
            body: "hello".to_string(),
        })
    }

    #[test]
    fn keeps_pointer_identity() {
        let a = note(1);
        let b = note(1);
        let ra = ObjectRef::new(&a).unwrap();

        assert!(ra.is(&a));
        assert!(!ra.is(&b));
        assert!(ra.ptr_eq(&ra.clone()));
        assert!(!ra.ptr_eq(&ObjectRef::new(&b).unwrap()));
        assert_eq!(ra.key(), &ObjectKey::new("note", 1));
    }

    #[test]
    fn downcasts_to_the_original_handle() {
        let a = note(1);
        let r = ObjectRef::new(&a).unwrap();

        let back = r.downcast::<Note>().unwrap();
        assert!(Rc::ptr_eq(&a, &back));
        assert!(r.downcast::<Tag>().is_none());
    }

    #[test]
    fn snapshot_sees_mutations() {
        let a = note(1);
        let r = ObjectRef::new(&a).unwrap();
        let before = r.snapshot().unwrap();

        a.borrow_mut().body = "changed".to_string();

        let changes = before.diff(&r.snapshot().unwrap());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "body");
    }

    #[test]
    fn snapshot_fails_while_mutably_borrowed() {
        let a = note(1);
        let r = ObjectRef::new(&a).unwrap();
        let _guard = a.borrow_mut();

        assert_eq!(
            r.snapshot().unwrap_err(),
            EntityError::Borrowed { entity_type: "note" }
        );
    }

    #[test]
    fn weak_refs_do_not_keep_objects_alive() {
        let a = note(1);
        let weak = ObjectRef::new(&a).unwrap().downgrade();
        assert!(weak.upgrade().is_some());

        drop(a);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }
}
