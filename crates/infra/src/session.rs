//! Session: the explicit context for one unit-of-work scope.
//!
//! Wires every collaborator exactly once, in dependency order:
//!
//! ```text
//! EventBus ─► ChangeSet ─► UnitOfWork ─┐
//!    │                                  ├─► ObjectRepositoryFactory ─► ObjectManager
//!    └─► IdentityMapSynchronizer ─► IdentityMap ┘
//! ```
//!
//! Nothing here is process-wide: two sessions share no state unless they share a loader
//! or a store.

use std::rc::Rc;

use tracing::debug;

use changeset_core::Entity;
use changeset_events::{EventBus, InMemoryEventBus, LifecycleEvent};

use crate::change_set::ChangeSet;
use crate::committer::Committer;
use crate::config::SessionConfig;
use crate::identity_map::IdentityMap;
use crate::loader::ObjectLoader;
use crate::object_manager::{ObjectManager, ObjectRepositoryFactory};
use crate::repository::ObjectRepository;
use crate::synchronizer::IdentityMapSynchronizer;
use crate::unit_of_work::{CommitSummary, UnitOfWork, UnitOfWorkError};

pub struct Session {
    config: SessionConfig,
    bus: Rc<InMemoryEventBus<LifecycleEvent>>,
    identity_map: Rc<IdentityMap>,
    unit_of_work: Rc<UnitOfWork>,
    object_manager: ObjectManager,
}

impl Session {
    pub fn new(loader: Rc<dyn ObjectLoader>, config: SessionConfig) -> Self {
        let bus: Rc<InMemoryEventBus<LifecycleEvent>> = Rc::new(InMemoryEventBus::new());
        let identity_map = Rc::new(IdentityMap::new());
        IdentityMapSynchronizer::new(identity_map.clone()).attach_to(&*bus);

        let change_set = ChangeSet::new(bus.clone(), &config);
        let unit_of_work = Rc::new(UnitOfWork::new(change_set, &config));
        let factory =
            ObjectRepositoryFactory::new(identity_map.clone(), loader, unit_of_work.clone());

        debug!(?config, "session opened");

        Self {
            config,
            bus,
            identity_map,
            unit_of_work,
            object_manager: ObjectManager::new(factory),
        }
    }

    pub fn with_defaults(loader: Rc<dyn ObjectLoader>) -> Self {
        Self::new(loader, SessionConfig::default())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The lifecycle bus; attach application listeners here.
    pub fn bus(&self) -> &dyn EventBus<LifecycleEvent> {
        &*self.bus
    }

    pub fn identity_map(&self) -> &IdentityMap {
        &self.identity_map
    }

    pub fn unit_of_work(&self) -> &UnitOfWork {
        &self.unit_of_work
    }

    pub fn object_manager(&self) -> &ObjectManager {
        &self.object_manager
    }

    pub fn repository<T: Entity>(&self) -> ObjectRepository<T> {
        self.object_manager.repository::<T>()
    }

    pub fn commit<C>(&self, committer: &mut C) -> Result<CommitSummary, UnitOfWorkError>
    where
        C: Committer + ?Sized,
    {
        self.unit_of_work.commit(committer)
    }
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("tracked", &self.unit_of_work.change_set().len())
            .field("cached", &self.identity_map.len())
            .finish()
    }
}
