//! Outbound application events.
//!
//! The [`Controller`](super::controller::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::app::actuator::LogicalState;
use crate::app::interval::BlinkInterval;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// A pin was opened and its starting state read back.
    Initialized { pin: u32, state: LogicalState },

    /// The blink interval for a pin is known.
    IntervalResolved { pin: u32, interval: BlinkInterval },

    /// A pin was toggled.  `iteration` counts from 1.
    Toggled {
        pin: u32,
        state: LogicalState,
        iteration: u32,
    },

    /// All blink loops have stopped.
    RunFinished { cancelled: bool },
}
