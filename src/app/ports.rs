//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Actuator / Controller (domain)
//! ```
//!
//! Driven adapters (GPIO, HTTP, event sinks) implement these traits.  The
//! [`Controller`](super::controller::Controller) consumes them via
//! generics, so the domain core never touches hardware or sockets directly.

use embedded_hal::digital::StatefulOutputPin;

use crate::app::interval::BlinkInterval;
use crate::error::HardwareError;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Opens pins for exclusive output use.
///
/// The returned handle owns the pin: reading it back goes through
/// `StatefulOutputPin::is_set_high`, writing through `OutputPin`, and
/// dropping it closes the pin.
pub trait GpioPort {
    type Pin: StatefulOutputPin;

    /// Open `pin_id` and configure it as an output without changing its
    /// current level.
    fn open_output(&mut self, pin_id: u32) -> Result<Self::Pin, HardwareError>;
}

// ───────────────────────────────────────────────────────────────
// Delay port (driven adapter: remote service → domain)
// ───────────────────────────────────────────────────────────────

/// Supplies the blink interval for one LED.
///
/// Infallible by contract: implementations absorb every failure and
/// answer with their fallback.  Called once per LED per run, possibly
/// from several threads at once.
pub trait DelayPort {
    fn fetch_interval(&self, pin_id: u32) -> BlinkInterval;

    /// Interval used when no fetch is attempted (e.g. the run was
    /// cancelled before the request went out).
    fn fallback_interval(&self) -> BlinkInterval {
        BlinkInterval::default()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
