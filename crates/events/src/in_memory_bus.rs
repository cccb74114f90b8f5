//! In-memory event bus.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::bus::{EventBus, ListenerId};
use crate::{Event, Listener};

struct Subscriber<E: Event> {
    id: ListenerId,
    event_name: Option<&'static str>,
    listener: Rc<dyn Listener<E>>,
}

impl<E: Event> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            event_name: self.event_name,
            listener: self.listener.clone(),
        }
    }
}

/// In-memory pub/sub bus.
///
/// - No IO / no async
/// - Direct fan-out in subscription order
/// - Listeners attached while an event is being delivered only see later events
pub struct InMemoryEventBus<E: Event> {
    subscribers: RefCell<Vec<Subscriber<E>>>,
    next_id: Cell<u64>,
}

impl<E: Event> InMemoryEventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attached listeners (named and catch-all).
    pub fn listener_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    fn push(&self, event_name: Option<&'static str>, listener: Rc<dyn Listener<E>>) -> ListenerId {
        let id = ListenerId::new(self.next_id.get());
        self.next_id.set(id.as_u64() + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            event_name,
            listener,
        });
        id
    }
}

impl<E: Event> Default for InMemoryEventBus<E> {
    fn default() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }
}

impl<E: Event> core::fmt::Debug for InMemoryEventBus<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<E: Event> EventBus<E> for InMemoryEventBus<E> {
    fn attach(&self, event_name: &'static str, listener: Rc<dyn Listener<E>>) -> ListenerId {
        self.push(Some(event_name), listener)
    }

    fn attach_all(&self, listener: Rc<dyn Listener<E>>) -> ListenerId {
        self.push(None, listener)
    }

    fn detach(&self, id: ListenerId) -> bool {
        let mut subs = self.subscribers.borrow_mut();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    fn publish(&self, event: &E) -> usize {
        let name = event.event_name();

        // Release the borrow before dispatch so listeners may attach/detach.
        let matching: Vec<Subscriber<E>> = self
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.event_name.is_none_or(|n| n == name))
            .cloned()
            .collect();

        trace!(event = name, listeners = matching.len(), "publishing event");

        for sub in &matching {
            sub.listener.on_event(event);
        }

        matching.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Ping(&'static str);

    impl Event for Ping {
        fn event_name(&self) -> &'static str {
            self.0
        }
    }

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> Rc<dyn Listener<Ping>> {
        let log = log.clone();
        Rc::new(move |e: &Ping| log.borrow_mut().push(format!("{tag}:{}", e.0)))
    }

    #[test]
    fn delivers_to_matching_listeners_in_subscription_order() {
        let bus = InMemoryEventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        bus.attach("a", recorder(&log, "first"));
        bus.attach_all(recorder(&log, "all"));
        bus.attach("b", recorder(&log, "only-b"));
        bus.attach("a", recorder(&log, "last"));

        assert_eq!(bus.publish(&Ping("a")), 3);
        assert_eq!(bus.publish(&Ping("b")), 2);

        assert_eq!(
            *log.borrow(),
            vec!["first:a", "all:a", "last:a", "all:b", "only-b:b"]
        );
    }

    #[test]
    fn publish_without_listeners_is_a_no_op() {
        let bus: InMemoryEventBus<Ping> = InMemoryEventBus::new();
        assert_eq!(bus.publish(&Ping("a")), 0);
    }

    #[test]
    fn detached_listeners_stop_receiving() {
        let bus = InMemoryEventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let id = bus.attach("a", recorder(&log, "x"));
        bus.publish(&Ping("a"));
        assert!(bus.detach(id));
        assert!(!bus.detach(id));
        bus.publish(&Ping("a"));

        assert_eq!(log.borrow().len(), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn listeners_may_attach_during_delivery() {
        let bus = Rc::new(InMemoryEventBus::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_bus = bus.clone();
        let inner_log = log.clone();
        bus.attach(
            "a",
            Rc::new(move |_: &Ping| {
                inner_bus.attach("a", recorder(&inner_log, "late"));
            }),
        );

        assert_eq!(bus.publish(&Ping("a")), 1);
        assert!(log.borrow().is_empty());
        assert_eq!(bus.publish(&Ping("a")), 2);
        assert_eq!(*log.borrow(), vec!["late:a"]);
    }
}
