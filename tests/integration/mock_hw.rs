//! Mock adapters for integration tests.
//!
//! Records every pin call so tests can assert on the full command
//! history without touching real GPIO registers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin, StatefulOutputPin};
use internet_led::app::cancel::CancelToken;
use internet_led::app::events::AppEvent;
use internet_led::app::interval::BlinkInterval;
use internet_led::app::ports::{DelayPort, EventSink, GpioPort};
use internet_led::error::HardwareError;

// ── Pin call record ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCall {
    Open(u32),
    Write { pin: u32, high: bool },
    Close(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl embedded_hal::digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Default)]
struct Bus {
    calls: Vec<PinCall>,
    levels: HashMap<u32, bool>,
    open: HashMap<u32, bool>,
    fail_open: Vec<u32>,
    /// Fail the write that would be the n-th (1-based) on this pin.
    fail_write_at: HashMap<u32, u32>,
    writes: HashMap<u32, u32>,
}

// ── MockGpio ──────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockGpio {
    bus: Rc<RefCell<Bus>>,
}

#[allow(dead_code)]
impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level a pin reads back when first opened (default LOW).
    pub fn preset(&self, pin: u32, high: bool) {
        self.bus.borrow_mut().levels.insert(pin, high);
    }

    pub fn fail_open(&self, pin: u32) {
        self.bus.borrow_mut().fail_open.push(pin);
    }

    pub fn fail_write_at(&self, pin: u32, nth: u32) {
        self.bus.borrow_mut().fail_write_at.insert(pin, nth);
    }

    pub fn calls(&self) -> Vec<PinCall> {
        self.bus.borrow().calls.clone()
    }

    /// Pins written, in call order.
    pub fn write_order(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PinCall::Write { pin, .. } => Some(pin),
                _ => None,
            })
            .collect()
    }

    pub fn writes(&self, pin: u32) -> u32 {
        self.bus.borrow().writes.get(&pin).copied().unwrap_or(0)
    }

    pub fn level(&self, pin: u32) -> bool {
        self.bus.borrow().levels.get(&pin).copied().unwrap_or(false)
    }

    pub fn all_closed(&self) -> bool {
        self.bus.borrow().open.values().all(|open| !open)
    }
}

impl GpioPort for MockGpio {
    type Pin = MockPin;

    fn open_output(&mut self, pin_id: u32) -> Result<MockPin, HardwareError> {
        let mut bus = self.bus.borrow_mut();
        if bus.fail_open.contains(&pin_id) {
            return Err(HardwareError::Open(pin_id));
        }
        if bus.open.get(&pin_id).copied().unwrap_or(false) {
            return Err(HardwareError::Busy(pin_id));
        }
        bus.open.insert(pin_id, true);
        bus.calls.push(PinCall::Open(pin_id));
        Ok(MockPin {
            pin: pin_id,
            bus: Rc::clone(&self.bus),
        })
    }
}

pub struct MockPin {
    pin: u32,
    bus: Rc<RefCell<Bus>>,
}

impl MockPin {
    fn write(&mut self, high: bool) -> Result<(), MockPinError> {
        let mut bus = self.bus.borrow_mut();
        let n = bus.writes.get(&self.pin).copied().unwrap_or(0) + 1;
        if bus.fail_write_at.get(&self.pin) == Some(&n) {
            return Err(MockPinError);
        }
        bus.writes.insert(self.pin, n);
        bus.levels.insert(self.pin, high);
        bus.calls.push(PinCall::Write {
            pin: self.pin,
            high,
        });
        Ok(())
    }

    fn read(&self) -> bool {
        self.bus.borrow().levels.get(&self.pin).copied().unwrap_or(false)
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), MockPinError> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), MockPinError> {
        self.write(true)
    }
}

impl StatefulOutputPin for MockPin {
    fn is_set_high(&mut self) -> Result<bool, MockPinError> {
        Ok(self.read())
    }

    fn is_set_low(&mut self) -> Result<bool, MockPinError> {
        Ok(!self.read())
    }
}

impl Drop for MockPin {
    fn drop(&mut self) {
        let mut bus = self.bus.borrow_mut();
        bus.open.insert(self.pin, false);
        bus.calls.push(PinCall::Close(self.pin));
    }
}

// ── FixedDelay ────────────────────────────────────────────────

/// DelayPort answering a fixed interval per pin (default for unknown pins).
pub struct FixedDelay {
    default: BlinkInterval,
    per_pin: HashMap<u32, BlinkInterval>,
    fetches: AtomicUsize,
}

#[allow(dead_code)]
impl FixedDelay {
    pub fn new(ms: u32) -> Self {
        Self {
            default: BlinkInterval::from_millis(ms).unwrap(),
            per_pin: HashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_pin(mut self, pin: u32, ms: u32) -> Self {
        self.per_pin.insert(pin, BlinkInterval::from_millis(ms).unwrap());
        self
    }

    /// Number of `fetch_interval` calls answered so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DelayPort for FixedDelay {
    fn fetch_interval(&self, pin_id: u32) -> BlinkInterval {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.per_pin.get(&pin_id).copied().unwrap_or(self.default)
    }

    fn fallback_interval(&self) -> BlinkInterval {
        self.default
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
    /// Raise this token once `cancel_after` toggles have been seen.
    cancel: Option<(CancelToken, usize)>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after(token: CancelToken, toggles: usize) -> Self {
        Self {
            events: Vec::new(),
            cancel: Some((token, toggles)),
        }
    }

    pub fn toggles(&self) -> Vec<(u32, u32)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Toggled { pin, iteration, .. } => Some((*pin, *iteration)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
        if let Some((token, after)) = &self.cancel {
            if self.toggles().len() >= *after {
                token.cancel();
            }
        }
    }
}
