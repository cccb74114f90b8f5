use crate::Event;

/// Receives events from a bus.
///
/// Listeners are invoked synchronously, on the publishing thread, before `publish`
/// returns. They take `&self`; listeners that keep state use interior mutability.
///
/// ## Re-entrancy
///
/// A listener may call back into the component that published the event (for example
/// to query it), as long as the publisher has released its own borrows before
/// publishing. Publishers in this workspace always do.
pub trait Listener<E: Event> {
    fn on_event(&self, event: &E);
}

impl<E, F> Listener<E> for F
where
    E: Event,
    F: Fn(&E),
{
    fn on_event(&self, event: &E) {
        self(event)
    }
}
