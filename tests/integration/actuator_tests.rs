//! Integration tests: Actuator lifecycle against the recording GPIO mock.

use internet_led::app::actuator::{Actuator, LogicalState, Polarity};
use internet_led::error::HardwareError;

use crate::mock_hw::{MockGpio, MockPin, PinCall};

#[test]
fn initialize_derives_state_for_both_polarities() {
    for (polarity, high, expected) in [
        (Polarity::ActiveLow, false, LogicalState::On),
        (Polarity::ActiveLow, true, LogicalState::Off),
        (Polarity::ActiveHigh, false, LogicalState::Off),
        (Polarity::ActiveHigh, true, LogicalState::On),
    ] {
        let mut gpio = MockGpio::new();
        gpio.preset(9, high);
        let mut led = Actuator::new(9, polarity);
        assert_eq!(led.initialize(&mut gpio), Ok(expected));
        assert_eq!(led.state(), expected);
        assert!(gpio.write_order().is_empty(), "initialize must not write");
    }
}

#[test]
fn double_toggle_restores_state_with_two_writes() {
    let mut gpio = MockGpio::new();
    let mut led = Actuator::new(23, Polarity::ActiveLow);
    led.initialize(&mut gpio).unwrap();
    let before = led.state();

    led.toggle().unwrap();
    led.toggle().unwrap();

    assert_eq!(led.state(), before);
    assert_eq!(gpio.writes(23), 2);
}

#[test]
fn set_state_writes_the_mapped_level() {
    let mut gpio = MockGpio::new();
    let mut led = Actuator::new(4, Polarity::ActiveHigh);
    led.initialize(&mut gpio).unwrap();

    assert_eq!(led.set_state(LogicalState::On), Ok(true));
    assert!(gpio.level(4));
    assert_eq!(led.set_state(LogicalState::Off), Ok(true));
    assert!(!gpio.level(4));
}

#[test]
fn uninitialized_actuator_leaves_hardware_untouched() {
    let gpio = MockGpio::new();
    let mut led: Actuator<MockPin> = Actuator::new(4, Polarity::ActiveLow);

    assert_eq!(led.set_state(LogicalState::On), Ok(false));
    assert_eq!(led.toggle(), Ok(false));
    assert!(gpio.calls().is_empty());
}

#[test]
fn failed_write_keeps_previous_state() {
    let mut gpio = MockGpio::new();
    gpio.fail_write_at(8, 1);
    let mut led = Actuator::new(8, Polarity::ActiveLow);
    let initial = led.initialize(&mut gpio).unwrap();

    assert_eq!(led.toggle(), Err(HardwareError::Write(8)));
    assert_eq!(led.state(), initial);
}

#[test]
fn open_failure_leaves_actuator_uninitialized() {
    let mut gpio = MockGpio::new();
    gpio.fail_open(8);
    let mut led = Actuator::new(8, Polarity::ActiveLow);

    assert_eq!(led.initialize(&mut gpio), Err(HardwareError::Open(8)));
    assert!(!led.is_initialized());
}

#[test]
fn drop_closes_the_handle() {
    let mut gpio = MockGpio::new();
    {
        let mut led = Actuator::new(12, Polarity::ActiveLow);
        led.initialize(&mut gpio).unwrap();
        led.toggle().unwrap();
    }
    // Reads LOW (active-low: On), so the toggle drives Off = HIGH.
    assert_eq!(
        gpio.calls(),
        vec![
            PinCall::Open(12),
            PinCall::Write {
                pin: 12,
                high: true
            },
            PinCall::Close(12)
        ]
    );
    assert!(gpio.all_closed());
}
