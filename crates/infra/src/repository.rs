//! Per-type repository facade.
//!
//! A repository is where objects enter and leave the unit of work:
//!
//! - `get` resolves an identity through the identity map, falling back to the loader and
//!   registering whatever it loaded
//! - `add` schedules a new object for insertion
//! - `remove` schedules a tracked object for deletion
//!
//! Repositories never write to the identity map; the synchronizer does, in response to
//! the events the change set publishes.

use std::marker::PhantomData;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, trace};

use changeset_core::{Entity, EntityError, Identity, ObjectKey, ObjectRef, Shared, shared};

use crate::change_set::{ChangeSetError, EntryState};
use crate::identity_map::IdentityMap;
use crate::loader::{LoadError, ObjectLoader};
use crate::unit_of_work::UnitOfWork;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    ChangeSet(#[from] ChangeSetError),

    /// The identity is tracked but scheduled for deletion in this unit of work.
    #[error("{0} is scheduled for removal")]
    Removed(ObjectKey),

    /// The loader returned a record for another identity.
    #[error("loaded record for {expected} reports identity {found}")]
    IdentityMismatch { expected: ObjectKey, found: Identity },
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::Load(LoadError::NotFound(_)))
    }
}

pub struct ObjectRepository<T> {
    identity_map: Rc<IdentityMap>,
    loader: Rc<dyn ObjectLoader>,
    unit_of_work: Rc<UnitOfWork>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for ObjectRepository<T> {
    fn clone(&self) -> Self {
        Self {
            identity_map: self.identity_map.clone(),
            loader: self.loader.clone(),
            unit_of_work: self.unit_of_work.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> core::fmt::Debug for ObjectRepository<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectRepository")
            .field("entity", &core::any::type_name::<T>())
            .finish()
    }
}

impl<T: Entity> ObjectRepository<T> {
    pub fn new(
        identity_map: Rc<IdentityMap>,
        loader: Rc<dyn ObjectLoader>,
        unit_of_work: Rc<UnitOfWork>,
    ) -> Self {
        Self {
            identity_map,
            loader,
            unit_of_work,
            _entity: PhantomData,
        }
    }

    pub fn entity_type(&self) -> &'static str {
        T::ENTITY_TYPE
    }

    /// Resolve `identity` to its single in-memory instance.
    ///
    /// Identity-map hits return the cached instance without publishing anything. Misses
    /// load, decode and register the object (one `register` event). Load failures are
    /// returned before anything is registered.
    pub fn get(&self, identity: impl Into<Identity>) -> Result<Shared<T>, RepositoryError> {
        let identity = identity.into();

        if let Some(object) = self.identity_map.get_typed::<T>(&identity) {
            trace!(entity_type = T::ENTITY_TYPE, identity = %identity, "identity map hit");
            return Ok(object);
        }

        let key = ObjectKey::new(T::ENTITY_TYPE, identity.clone());
        if self.unit_of_work.change_set().state_of(&key) == Some(EntryState::Removed) {
            return Err(RepositoryError::Removed(key));
        }

        let record = self.loader.load(T::ENTITY_TYPE, &identity)?;
        let entity = T::from_record(record)?;
        let found = entity.identity();
        if found != identity {
            return Err(RepositoryError::IdentityMismatch {
                expected: key,
                found,
            });
        }

        let object = shared(entity);
        self.unit_of_work
            .change_set()
            .register(ObjectRef::new(&object)?)?;

        debug!(entity_type = T::ENTITY_TYPE, identity = %identity, "loaded object");
        Ok(object)
    }

    /// Schedule `object` for insertion.
    pub fn add(&self, object: &Shared<T>) -> Result<(), RepositoryError> {
        self.unit_of_work.change_set().add(ObjectRef::new(object)?)?;
        Ok(())
    }

    /// Wrap `value` into a shared handle and schedule it for insertion.
    pub fn create(&self, value: T) -> Result<Shared<T>, RepositoryError> {
        let object = shared(value);
        self.add(&object)?;
        Ok(object)
    }

    /// Schedule `object` for deletion on the next commit.
    pub fn remove(&self, object: &Shared<T>) -> Result<(), RepositoryError> {
        self.unit_of_work
            .change_set()
            .mark_removed(&ObjectRef::new(object)?)?;
        Ok(())
    }
}
