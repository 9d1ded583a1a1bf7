//! Simulated GPIO bank for hosts and tests.
//!
//! Implements [`GpioPort`] with in-memory lines.  Pins are opened in
//! exclusive mode: a second `open_output` on a pin whose handle is still
//! alive fails with [`HardwareError::Busy`].  Lines remember their level
//! across close/reopen like real output latches do.
//!
//! The bank is shared through `Rc<RefCell<..>>` so a test can inspect
//! levels and write counts while handles are out.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin, PinState, StatefulOutputPin};
use log::trace;

use crate::app::ports::GpioPort;
use crate::error::HardwareError;

/// Highest GPIO number on an ESP32-S3.
pub const SIM_MAX_PIN: u32 = 48;

#[derive(Debug, Clone, Copy)]
struct SimLine {
    level: PinState,
    open: bool,
    writes: u32,
}

#[derive(Debug)]
struct SimBank {
    lines: BTreeMap<u32, SimLine>,
    power_on: PinState,
    max_pin: u32,
}

impl SimBank {
    fn line(&mut self, pin: u32) -> &mut SimLine {
        let power_on = self.power_on;
        self.lines.entry(pin).or_insert(SimLine {
            level: power_on,
            open: false,
            writes: 0,
        })
    }
}

/// In-memory GPIO controller.  Cloning yields another view of the same bank.
#[derive(Debug, Clone)]
pub struct SimGpio {
    bank: Rc<RefCell<SimBank>>,
}

impl SimGpio {
    /// Every untouched line reads `power_on` when first opened.
    pub fn new(power_on: PinState) -> Self {
        Self {
            bank: Rc::new(RefCell::new(SimBank {
                lines: BTreeMap::new(),
                power_on,
                max_pin: SIM_MAX_PIN,
            })),
        }
    }

    /// Pins above `max_pin` fail to open.
    pub fn with_max_pin(self, max_pin: u32) -> Self {
        self.bank.borrow_mut().max_pin = max_pin;
        self
    }

    /// Preset a line's level, e.g. a LED left lit by a previous run.
    pub fn set_level(&self, pin: u32, level: PinState) {
        self.bank.borrow_mut().line(pin).level = level;
    }

    pub fn level(&self, pin: u32) -> Option<PinState> {
        self.bank.borrow().lines.get(&pin).map(|l| l.level)
    }

    pub fn is_open(&self, pin: u32) -> bool {
        self.bank.borrow().lines.get(&pin).is_some_and(|l| l.open)
    }

    pub fn writes(&self, pin: u32) -> u32 {
        self.bank.borrow().lines.get(&pin).map_or(0, |l| l.writes)
    }

    pub fn open_count(&self) -> usize {
        self.bank.borrow().lines.values().filter(|l| l.open).count()
    }
}

impl GpioPort for SimGpio {
    type Pin = SimPin;

    fn open_output(&mut self, pin_id: u32) -> Result<SimPin, HardwareError> {
        let mut bank = self.bank.borrow_mut();
        if pin_id > bank.max_pin {
            return Err(HardwareError::Open(pin_id));
        }
        let line = bank.line(pin_id);
        if line.open {
            return Err(HardwareError::Busy(pin_id));
        }
        line.open = true;
        trace!("sim GPIO{}: opened, level={:?}", pin_id, line.level);

        Ok(SimPin {
            pin: pin_id,
            bank: Rc::clone(&self.bank),
        })
    }
}

/// Exclusive handle to one simulated line.  Closes on drop.
#[derive(Debug)]
pub struct SimPin {
    pin: u32,
    bank: Rc<RefCell<SimBank>>,
}

impl SimPin {
    fn drive(&mut self, level: PinState) {
        let mut bank = self.bank.borrow_mut();
        let line = bank.line(self.pin);
        line.level = level;
        line.writes += 1;
        trace!("sim GPIO{}: {:?}", self.pin, level);
    }

    fn read(&self) -> PinState {
        self.bank.borrow_mut().line(self.pin).level
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(PinState::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(PinState::High);
        Ok(())
    }
}

impl StatefulOutputPin for SimPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read() == PinState::High)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read() == PinState::Low)
    }
}

impl Drop for SimPin {
    fn drop(&mut self) {
        if let Ok(mut bank) = self.bank.try_borrow_mut() {
            bank.line(self.pin).open = false;
            trace!("sim GPIO{}: closed", self.pin);
        }
    }
}
