//! Keeps the identity map in step with change-set lifecycle events.

use std::rc::Rc;

use tracing::trace;

use changeset_events::{EventBus, LifecycleEvent, LifecycleKind, Listener, ListenerId};

use crate::identity_map::IdentityMap;

/// Mirrors lifecycle events into an [`IdentityMap`].
///
/// - `register` / `add`: the object is cached under its own key
/// - `remove`: the key is evicted immediately, not at commit time
///
/// This listener is the only writer of the identity map; repositories only read it.
#[derive(Debug, Clone)]
pub struct IdentityMapSynchronizer {
    identity_map: Rc<IdentityMap>,
}

impl IdentityMapSynchronizer {
    pub fn new(identity_map: Rc<IdentityMap>) -> Self {
        Self { identity_map }
    }

    /// Subscribe to the three lifecycle events on `bus`.
    pub fn attach_to<B>(self, bus: &B) -> [ListenerId; 3]
    where
        B: EventBus<LifecycleEvent> + ?Sized,
    {
        let listener: Rc<dyn Listener<LifecycleEvent>> = Rc::new(self);
        [
            bus.attach(LifecycleEvent::REGISTER, listener.clone()),
            bus.attach(LifecycleEvent::ADD, listener.clone()),
            bus.attach(LifecycleEvent::REMOVE, listener),
        ]
    }
}

impl Listener<LifecycleEvent> for IdentityMapSynchronizer {
    fn on_event(&self, event: &LifecycleEvent) {
        let object = event.object();
        match event.kind() {
            LifecycleKind::Register | LifecycleKind::Add => {
                self.identity_map.insert(object);
            }
            LifecycleKind::Remove => {
                self.identity_map
                    .remove(object.entity_type(), object.identity());
            }
        }
        trace!(event = %event.kind(), key = %object.key(), "identity map synchronized");
    }
}
