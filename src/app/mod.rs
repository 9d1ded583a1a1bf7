//! Application core: domain logic behind port traits.
//!
//! The actuator state machine, interval rules, cancellation and the
//! controller that composes them.  All interaction with hardware and the
//! network happens through the traits in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod actuator;
pub mod cancel;
pub mod controller;
pub mod events;
pub mod interval;
pub mod ports;
