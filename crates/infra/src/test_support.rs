//! Fixtures shared by the unit tests of this crate.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use changeset_core::{Entity, Identity, ObjectRef, Shared, shared};
use changeset_events::{EventBus, InMemoryEventBus, LifecycleEvent, Listener};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: i64,
    pub label: String,
    #[serde(default)]
    pub weight: u32,
}

impl Entity for Widget {
    const ENTITY_TYPE: &'static str = "widget";

    fn identity(&self) -> Identity {
        Identity::from(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gadget {
    pub code: String,
}

impl Entity for Gadget {
    const ENTITY_TYPE: &'static str = "gadget";

    fn identity(&self) -> Identity {
        Identity::from(self.code.as_str())
    }
}

pub fn widget(id: i64, label: &str) -> Shared<Widget> {
    shared(Widget {
        id,
        label: label.to_string(),
        weight: 0,
    })
}

pub fn object(w: &Shared<Widget>) -> ObjectRef {
    ObjectRef::new(w).unwrap()
}

pub type LifecycleBus = Rc<InMemoryEventBus<LifecycleEvent>>;

/// Records `"<event>:<key>"` for every lifecycle event published on `bus`.
pub fn record_events(bus: &LifecycleBus) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let listener: Rc<dyn Listener<LifecycleEvent>> = Rc::new(move |e: &LifecycleEvent| {
        sink.borrow_mut().push(format!("{}:{}", e.kind(), e.key()))
    });
    bus.attach_all(listener);
    log
}
