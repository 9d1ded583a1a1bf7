//! GPIO pin assignments for the InternetLed board.
//!
//! Single source of truth for the default wiring.  The runtime pin list
//! lives in [`SystemConfig`](crate::config::SystemConfig) and can be
//! overridden from the config file or the command line; these constants
//! only seed its defaults.

// ---------------------------------------------------------------------------
// Status LEDs (discrete, one resistor each, cathode to the GPIO)
// ---------------------------------------------------------------------------

/// First LED.  Wired active-low: the pin sinks current when driven LOW.
pub const LED_A_GPIO: u32 = 23;
/// Second LED, same wiring as [`LED_A_GPIO`].
pub const LED_B_GPIO: u32 = 18;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Upper bound on simultaneously driven LEDs.  Also sizes the executor's
/// task table and the config's fixed-capacity pin list.
pub const MAX_ACTUATORS: usize = 8;
