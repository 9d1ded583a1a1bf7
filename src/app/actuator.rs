//! LED actuator: one GPIO, one logical on/off state.
//!
//! ```text
//!   Uninitialized ──initialize()──▶ Ready { On ⇄ Off }
//!         ▲                              │
//!         └──────── release() / drop ────┘
//! ```
//!
//! The actuator owns its pin handle exclusively once opened.  The logical
//! state is derived from the physical drive level exactly once, at
//! `initialize()`, through the configured [`Polarity`]; after that it only
//! changes through [`Actuator::set_state`] / [`Actuator::toggle`].

use core::fmt;

use embedded_hal::digital::{PinState, StatefulOutputPin};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::app::ports::GpioPort;
use crate::error::HardwareError;

/// Logical LED state, independent of wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalState {
    On,
    #[default]
    Off,
}

impl LogicalState {
    pub const fn complement(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

impl fmt::Display for LogicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "ON"),
            Self::Off => write!(f, "OFF"),
        }
    }
}

/// How the LED is wired: which physical level lights it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// GPIO sinks the LED current: LOW = on.
    #[default]
    ActiveLow,
    /// GPIO sources the LED current: HIGH = on.
    ActiveHigh,
}

impl Polarity {
    /// Physical level that realises `state`.
    pub const fn level_for(self, state: LogicalState) -> PinState {
        match (self, state) {
            (Self::ActiveLow, LogicalState::On) | (Self::ActiveHigh, LogicalState::Off) => {
                PinState::Low
            }
            (Self::ActiveLow, LogicalState::Off) | (Self::ActiveHigh, LogicalState::On) => {
                PinState::High
            }
        }
    }

    /// Logical state implied by a physical level.
    pub const fn state_for(self, level: PinState) -> LogicalState {
        match (self, level) {
            (Self::ActiveLow, PinState::Low) | (Self::ActiveHigh, PinState::High) => {
                LogicalState::On
            }
            (Self::ActiveLow, PinState::High) | (Self::ActiveHigh, PinState::Low) => {
                LogicalState::Off
            }
        }
    }
}

/// A single LED behind a GPIO output.
pub struct Actuator<P> {
    pin_id: u32,
    polarity: Polarity,
    state: LogicalState,
    pin: Option<P>,
}

impl<P: StatefulOutputPin> Actuator<P> {
    /// Record the pin and wiring.  No hardware is touched.
    pub const fn new(pin_id: u32, polarity: Polarity) -> Self {
        Self {
            pin_id,
            polarity,
            state: LogicalState::Off,
            pin: None,
        }
    }

    /// Open the pin in output mode and derive the logical state from its
    /// current drive level.
    ///
    /// On an already-initialized actuator the existing handle is reused
    /// and the state is re-derived.  On failure the actuator stays
    /// uninitialized and no handle is kept.
    pub fn initialize<G>(&mut self, gpio: &mut G) -> Result<LogicalState, HardwareError>
    where
        G: GpioPort<Pin = P>,
    {
        let mut pin = match self.pin.take() {
            Some(pin) => pin,
            None => gpio.open_output(self.pin_id)?,
        };

        let high = pin
            .is_set_high()
            .map_err(|_| HardwareError::Read(self.pin_id))?;
        let level = PinState::from(high);

        self.state = self.polarity.state_for(level);
        self.pin = Some(pin);
        debug!(
            "GPIO{}: initialized, level={:?} -> {}",
            self.pin_id, level, self.state
        );
        Ok(self.state)
    }

    /// Drive the pin to the level for `state`.
    ///
    /// Returns `Ok(false)` without touching anything when the actuator was
    /// never initialized.  A failed write leaves the logical state as it was.
    pub fn set_state(&mut self, state: LogicalState) -> Result<bool, HardwareError> {
        let Some(pin) = self.pin.as_mut() else {
            debug!("GPIO{}: set_state({}) ignored, not initialized", self.pin_id, state);
            return Ok(false);
        };

        let level = self.polarity.level_for(state);
        pin.set_state(level)
            .map_err(|_| HardwareError::Write(self.pin_id))?;

        debug!("GPIO{}: {} ({:?})", self.pin_id, state, level);
        self.state = state;
        Ok(true)
    }

    /// Flip the logical state: one physical write when initialized.
    pub fn toggle(&mut self) -> Result<bool, HardwareError> {
        self.set_state(self.state.complement())
    }

    /// Close the pin handle and return to the uninitialized phase.
    pub fn release(&mut self) {
        if self.pin.take().is_some() {
            debug!("GPIO{}: released", self.pin_id);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.pin.is_some()
    }
}

impl<P> Actuator<P> {
    pub fn pin_id(&self) -> u32 {
        self.pin_id
    }

    pub fn state(&self) -> LogicalState {
        self.state
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }
}
