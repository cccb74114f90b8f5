//! Event publishing/subscription abstraction (mechanics only).
//!
//! This module provides the **event bus pattern** - a pub/sub mechanism for distributing
//! events to listeners that must stay in step with the publisher (the identity map
//! synchronizer being the main one).
//!
//! ## Delivery Guarantees
//!
//! Unlike a broker-backed bus, delivery here is part of the publishing operation:
//!
//! - **Synchronous**: every matching listener has run before `publish` returns
//! - **Ordered**: listeners run in subscription order, regardless of whether they were
//!   attached to one event name or to all events
//! - **Exactly once** per matching listener per `publish` call
//! - **No queueing, no batching, no persistence**
//!
//! Consumers can therefore rely on event cardinality: one `publish` is one callback.

use std::rc::Rc;

use crate::{Event, Listener};

/// Handle returned by `attach`, used to detach a listener again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Domain-agnostic, synchronous event bus.
///
/// ## Architecture Role
///
/// ```text
/// ChangeSet (register/add/remove) → EventBus (publish) → Listeners
///                                                          ├─ IdentityMapSynchronizer
///                                                          └─ application listeners
/// ```
///
/// ## Thread Safety
///
/// Buses are single-threaded (`Rc` listeners, no locking). One bus serves one unit-of-work
/// scope.
pub trait EventBus<E: Event> {
    /// Subscribe `listener` to events named `event_name`.
    fn attach(&self, event_name: &'static str, listener: Rc<dyn Listener<E>>) -> ListenerId;

    /// Subscribe `listener` to every event.
    fn attach_all(&self, listener: Rc<dyn Listener<E>>) -> ListenerId;

    /// Remove a listener. Returns `false` if it was not attached.
    fn detach(&self, id: ListenerId) -> bool;

    /// Deliver `event` to every matching listener; returns how many were invoked.
    fn publish(&self, event: &E) -> usize;
}

impl<E, B> EventBus<E> for Rc<B>
where
    E: Event,
    B: EventBus<E> + ?Sized,
{
    fn attach(&self, event_name: &'static str, listener: Rc<dyn Listener<E>>) -> ListenerId {
        (**self).attach(event_name, listener)
    }

    fn attach_all(&self, listener: Rc<dyn Listener<E>>) -> ListenerId {
        (**self).attach_all(listener)
    }

    fn detach(&self, id: ListenerId) -> bool {
        (**self).detach(id)
    }

    fn publish(&self, event: &E) -> usize {
        (**self).publish(event)
    }
}
