//! Entry point handing out repositories per entity type.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use changeset_core::Entity;

use crate::identity_map::IdentityMap;
use crate::loader::ObjectLoader;
use crate::repository::ObjectRepository;
use crate::unit_of_work::UnitOfWork;

/// Builds repositories wired to shared collaborators.
pub trait RepositoryFactory {
    fn create<T: Entity>(&self) -> ObjectRepository<T>;
}

/// Factory wiring every repository to one identity map, loader and unit of work.
#[derive(Clone)]
pub struct ObjectRepositoryFactory {
    identity_map: Rc<IdentityMap>,
    loader: Rc<dyn ObjectLoader>,
    unit_of_work: Rc<UnitOfWork>,
}

impl ObjectRepositoryFactory {
    pub fn new(
        identity_map: Rc<IdentityMap>,
        loader: Rc<dyn ObjectLoader>,
        unit_of_work: Rc<UnitOfWork>,
    ) -> Self {
        Self {
            identity_map,
            loader,
            unit_of_work,
        }
    }
}

impl core::fmt::Debug for ObjectRepositoryFactory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectRepositoryFactory").finish_non_exhaustive()
    }
}

impl RepositoryFactory for ObjectRepositoryFactory {
    fn create<T: Entity>(&self) -> ObjectRepository<T> {
        ObjectRepository::new(
            self.identity_map.clone(),
            self.loader.clone(),
            self.unit_of_work.clone(),
        )
    }
}

/// Hands out one repository per entity type, creating it on first request.
pub struct ObjectManager<F = ObjectRepositoryFactory> {
    factory: F,
    repositories: RefCell<HashMap<TypeId, Box<dyn Any>>>,
}

impl<F: RepositoryFactory> ObjectManager<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            repositories: RefCell::new(HashMap::new()),
        }
    }

    pub fn repository<T: Entity>(&self) -> ObjectRepository<T> {
        let mut repositories = self.repositories.borrow_mut();
        let slot = repositories
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(self.factory.create::<T>()) as Box<dyn Any>);

        match slot.downcast_ref::<ObjectRepository<T>>() {
            Some(repository) => repository.clone(),
            None => self.factory.create::<T>(),
        }
    }

    /// Number of entity types a repository has been handed out for.
    pub fn repository_count(&self) -> usize {
        self.repositories.borrow().len()
    }
}

impl<F> core::fmt::Debug for ObjectManager<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectManager")
            .field("repositories", &self.repositories.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::change_set::ChangeSet;
    use crate::config::SessionConfig;
    use crate::loader::GeneratingLoader;
    use crate::synchronizer::IdentityMapSynchronizer;
    use crate::test_support::{Gadget, LifecycleBus, Widget};
    use changeset_events::InMemoryEventBus;

    fn manager() -> ObjectManager {
        let config = SessionConfig::default();
        let bus: LifecycleBus = Rc::new(InMemoryEventBus::new());
        let identity_map = Rc::new(IdentityMap::new());
        IdentityMapSynchronizer::new(identity_map.clone()).attach_to(&*bus);
        let unit_of_work = Rc::new(UnitOfWork::new(ChangeSet::new(bus, &config), &config));
        let loader = Rc::new(
            GeneratingLoader::new("id")
                .with_field("label", json!("gen"))
                .with_field("code", json!("fixed")),
        );
        ObjectManager::new(ObjectRepositoryFactory::new(identity_map, loader, unit_of_work))
    }

    #[test]
    fn repositories_share_one_identity_map() {
        let om = manager();

        let first = om.repository::<Widget>().get(1).unwrap();
        let second = om.repository::<Widget>().get(1).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(om.repository_count(), 1);
    }

    #[test]
    fn one_repository_per_entity_type() {
        let om = manager();

        assert_eq!(om.repository::<Widget>().entity_type(), "widget");
        assert_eq!(om.repository::<Gadget>().entity_type(), "gadget");
        assert_eq!(om.repository_count(), 2);
    }
}
