/// A domain-agnostic event.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **named** (listeners subscribe by name)
/// - delivered **synchronously** by the bus that publishes them
pub trait Event: Clone + core::fmt::Debug + 'static {
    /// Stable event name used for routing (e.g. "register").
    fn event_name(&self) -> &'static str;
}
