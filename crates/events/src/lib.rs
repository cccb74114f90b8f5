//! `changeset-events`: synchronous publish/subscribe and the lifecycle event catalogue.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod lifecycle;
pub mod listener;

pub use bus::{EventBus, ListenerId};
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
pub use lifecycle::{LifecycleEvent, LifecycleKind};
pub use listener::Listener;
