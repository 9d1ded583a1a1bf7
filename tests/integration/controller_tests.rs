//! Integration tests: Controller → Actuators → GPIO, against mock adapters.

use std::time::{Duration, Instant};

use internet_led::app::actuator::{LogicalState, Polarity};
use internet_led::app::controller::Controller;
use internet_led::app::events::AppEvent;
use internet_led::error::{Error, HardwareError};

use crate::mock_hw::{FixedDelay, MockGpio, PinCall, RecordingSink};

fn controller(delay: FixedDelay) -> Controller<FixedDelay> {
    Controller::new(delay, Polarity::ActiveLow).with_cancel_poll(Duration::from_millis(2))
}

#[test]
fn four_iterations_toggle_in_construction_order() {
    let mut gpio = MockGpio::new();
    let mut sink = RecordingSink::new();
    let ctl = controller(FixedDelay::new(10));

    let start = Instant::now();
    let report = ctl.run(&mut gpio, &mut sink, &[23, 18], 4).unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(40), "finished too early: {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1040), "finished too late: {:?}", elapsed);

    assert_eq!(gpio.write_order(), vec![23, 18, 23, 18, 23, 18, 23, 18]);
    assert_eq!(
        sink.toggles(),
        vec![(23, 1), (18, 1), (23, 2), (18, 2), (23, 3), (18, 3), (23, 4), (18, 4)]
    );
    assert!(!report.cancelled);
    assert_eq!(report.total_toggles(), 8);
    assert_eq!(report.actuators[0].pin, 23);
    assert_eq!(report.actuators[1].pin, 18);
    assert!(gpio.all_closed());
}

#[test]
fn cancellation_stops_within_one_toggle() {
    let mut gpio = MockGpio::new();
    let ctl = controller(FixedDelay::new(10));
    let mut sink = RecordingSink::cancelling_after(ctl.cancel_token(), 2);

    let report = ctl.run(&mut gpio, &mut sink, &[23], 10).unwrap();

    assert!(report.cancelled);
    assert!(report.actuators[0].toggles >= 2);
    assert!(report.actuators[0].toggles <= 3);
    assert!(gpio.writes(23) <= 3);
    assert!(gpio.all_closed());
    assert_eq!(sink.events.last(), Some(&AppEvent::RunFinished { cancelled: true }));
}

#[test]
fn cancelled_before_start_never_writes() {
    let mut gpio = MockGpio::new();
    let mut sink = RecordingSink::new();
    let ctl = controller(FixedDelay::new(10));
    ctl.cancel_token().cancel();

    let report = ctl.run(&mut gpio, &mut sink, &[1, 2], 5).unwrap();

    assert!(report.cancelled);
    assert_eq!(report.total_toggles(), 0);
    assert!(gpio.write_order().is_empty());
    assert!(gpio.all_closed());
    assert_eq!(ctl.fetcher().fetches(), 0, "no request once cancelled");
    assert!(report.actuators.iter().all(|a| a.interval.millis() == 10));
}

#[test]
fn raised_token_stays_raised_until_reset() {
    let mut gpio = MockGpio::new();
    let mut sink = RecordingSink::new();
    let ctl = controller(FixedDelay::new(1));
    ctl.cancel_token().cancel();

    let report = ctl.run(&mut gpio, &mut sink, &[7], 3).unwrap();
    assert!(report.cancelled);

    let report = ctl.run(&mut gpio, &mut sink, &[7], 3).unwrap();
    assert!(report.cancelled, "a later run still sees the raised token");
    assert_eq!(report.total_toggles(), 0);

    ctl.cancel_token().reset();
    let report = ctl.run(&mut gpio, &mut sink, &[7], 3).unwrap();
    assert!(!report.cancelled);
    assert_eq!(report.total_toggles(), 3);
    assert!(gpio.all_closed());
}

#[test]
fn open_failure_aborts_and_releases_earlier_pins() {
    let mut gpio = MockGpio::new();
    gpio.fail_open(18);
    let mut sink = RecordingSink::new();
    let ctl = controller(FixedDelay::new(10));

    let err = ctl.run(&mut gpio, &mut sink, &[23, 18], 4).unwrap_err();

    assert_eq!(err, Error::Hardware(HardwareError::Open(18)));
    assert_eq!(gpio.calls(), vec![PinCall::Open(23), PinCall::Close(23)]);
    assert!(sink.toggles().is_empty());
}

#[test]
fn write_failure_stops_every_loop() {
    let mut gpio = MockGpio::new();
    gpio.fail_write_at(6, 2);
    let mut sink = RecordingSink::new();
    let ctl = controller(FixedDelay::new(5));

    let err = ctl.run(&mut gpio, &mut sink, &[5, 6], 10).unwrap_err();

    assert_eq!(err, Error::Hardware(HardwareError::Write(6)));
    assert_eq!(gpio.writes(5), 2);
    assert_eq!(gpio.writes(6), 1);
    assert!(gpio.all_closed());
}

#[test]
fn distinct_intervals_run_independently() {
    let mut gpio = MockGpio::new();
    let mut sink = RecordingSink::new();
    let ctl = controller(FixedDelay::new(10).with_pin(2, 30));

    let report = ctl.run(&mut gpio, &mut sink, &[1, 2], 3).unwrap();

    assert_eq!(report.actuators[0].interval.millis(), 10);
    assert_eq!(report.actuators[1].interval.millis(), 30);
    assert_eq!(report.actuators[0].toggles, 3);
    assert_eq!(report.actuators[1].toggles, 3);

    let resolved: Vec<_> = sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::IntervalResolved { .. }))
        .collect();
    assert_eq!(resolved.len(), 2);
    assert!(gpio.all_closed());
}

#[test]
fn initial_state_follows_the_pin() {
    let mut gpio = MockGpio::new();
    gpio.preset(23, true);
    let mut sink = RecordingSink::new();
    let ctl = controller(FixedDelay::new(1));

    let report = ctl.run(&mut gpio, &mut sink, &[23], 3).unwrap();

    assert_eq!(
        sink.events[0],
        AppEvent::Initialized {
            pin: 23,
            state: LogicalState::Off
        }
    );
    // Off -> On -> Off -> On, active-low: ends driven LOW.
    assert_eq!(report.actuators[0].final_state, LogicalState::On);
    assert!(!gpio.level(23));
}

#[test]
fn zero_iterations_only_initializes() {
    let mut gpio = MockGpio::new();
    let mut sink = RecordingSink::new();
    let ctl = controller(FixedDelay::new(10));

    let report = ctl.run(&mut gpio, &mut sink, &[3], 0).unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.total_toggles(), 0);
    assert_eq!(gpio.calls(), vec![PinCall::Open(3), PinCall::Close(3)]);
}

#[test]
fn invalid_pin_lists_are_rejected_before_touching_hardware() {
    let mut gpio = MockGpio::new();
    let mut sink = RecordingSink::new();
    let ctl = controller(FixedDelay::new(10));

    assert!(matches!(ctl.run(&mut gpio, &mut sink, &[], 1), Err(Error::Config(_))));
    assert!(matches!(ctl.run(&mut gpio, &mut sink, &[4, 4], 1), Err(Error::Config(_))));
    assert!(gpio.calls().is_empty());
}
