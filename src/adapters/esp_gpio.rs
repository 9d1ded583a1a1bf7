//! ESP-IDF GPIO adapter.
//!
//! Implements [`GpioPort`] with raw `esp_idf_svc::sys` GPIO calls.  Pins
//! are configured in INPUT_OUTPUT mode so that `gpio_get_level` returns
//! the level the pin is currently driving; plain OUTPUT mode reads 0.
//!
//! Exclusive ownership is tracked in a process-wide bitmask.  Dropping an
//! [`EspPin`] resets the pin to its power-on configuration.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin, StatefulOutputPin};
use esp_idf_svc::sys::*;
use log::{info, warn};

use crate::app::ports::GpioPort;
use crate::error::HardwareError;

/// Highest GPIO number on the ESP32-S3.
const MAX_GPIO: u32 = 48;

/// Bit `n` set while GPIO `n` is held by an [`EspPin`].
static OPEN_PINS: AtomicU64 = AtomicU64::new(0);

/// Raw `esp_err_t` from a failed level write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EspPinError(pub i32);

impl fmt::Display for EspPinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio rc={}", self.0)
    }
}

impl embedded_hal::digital::Error for EspPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// The chip's GPIO matrix.
pub struct EspGpio;

impl EspGpio {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EspGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for EspGpio {
    type Pin = EspPin;

    fn open_output(&mut self, pin_id: u32) -> Result<EspPin, HardwareError> {
        if pin_id > MAX_GPIO {
            return Err(HardwareError::Open(pin_id));
        }
        let bit = 1u64 << pin_id;
        if OPEN_PINS.fetch_or(bit, Ordering::AcqRel) & bit != 0 {
            return Err(HardwareError::Busy(pin_id));
        }

        let cfg = gpio_config_t {
            pin_bit_mask: bit,
            mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            ..Default::default()
        };
        // SAFETY: gpio_config only touches the pin named in the mask,
        // which this process now owns exclusively via OPEN_PINS.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            OPEN_PINS.fetch_and(!bit, Ordering::AcqRel);
            return Err(HardwareError::Configure(pin_id));
        }

        info!("GPIO{}: configured as output", pin_id);
        Ok(EspPin { pin: pin_id as i32 })
    }
}

/// Exclusive handle to one GPIO.
pub struct EspPin {
    pin: i32,
}

impl EspPin {
    fn write(&mut self, level: u32) -> Result<(), EspPinError> {
        // SAFETY: the pin was configured by open_output and is owned by self.
        let ret = unsafe { gpio_set_level(self.pin, level) };
        if ret != ESP_OK as i32 {
            return Err(EspPinError(ret));
        }
        Ok(())
    }

    fn read(&self) -> bool {
        // SAFETY: register read on a pin in INPUT_OUTPUT mode.
        (unsafe { gpio_get_level(self.pin) }) != 0
    }
}

impl ErrorType for EspPin {
    type Error = EspPinError;
}

impl OutputPin for EspPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(0)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(1)
    }
}

impl StatefulOutputPin for EspPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.read())
    }
}

impl Drop for EspPin {
    fn drop(&mut self) {
        // SAFETY: returns the pin to its default state; we still own it.
        let ret = unsafe { gpio_reset_pin(self.pin) };
        if ret != ESP_OK as i32 {
            warn!("GPIO{}: reset failed (rc={})", self.pin, ret);
        }
        OPEN_PINS.fetch_and(!(1u64 << self.pin), Ordering::AcqRel);
    }
}
