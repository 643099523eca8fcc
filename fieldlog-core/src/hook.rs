//! Ordered event mutators.
//!
//! Hooks run exactly once per event that survived the level and sampler
//! gates, in registration order, strictly after all user-supplied fields and
//! strictly before the message field is appended. Hook-contributed fields
//! therefore always land between the context/event fields and the message.

use crate::event::Event;
use crate::level::Level;

/// An observer/mutator invoked on every enabled, sampled event.
///
/// A hook may append additional fields to the event; it receives the message
/// text for inspection but cannot alter or suppress it.
pub trait Hook: Send + Sync {
    /// Observe and optionally extend `event` before its message is appended.
    fn run(&self, event: &mut Event, level: Level, message: &str);
}

/// Closures with the right shape are hooks.
impl<F> Hook for F
where
    F: Fn(&mut Event, Level, &str) + Send + Sync,
{
    fn run(&self, event: &mut Event, level: Level, message: &str) {
        self(event, level, message)
    }
}
