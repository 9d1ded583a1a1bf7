//! Blink controller: the composition root of a run.
//!
//! [`Controller`] opens every LED, resolves one interval per LED, then
//! drives bounded blink loops until the iteration budget is spent or the
//! [`CancelToken`] is raised.  Hardware, network and logging are reached
//! only through port traits.
//!
//! ```text
//!  GpioPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!               │        Controller        │
//!  DelayPort ──▶│ init · fetch · blink loop│
//!               └──────────────────────────┘
//! ```
//!
//! ## Scheduling
//!
//! Fetches are blocking HTTP calls, so they run concurrently on scoped
//! threads.  The blink phase runs on a single-threaded `edge-executor`
//! with `async-io-mini` timers.  LEDs that share an interval form one
//! cadence group driven by one task (toggled in construction order);
//! groups with different intervals run as independent tasks.

use core::cell::{Cell, RefCell};
use core::time::Duration;

use edge_executor::LocalExecutor;
use embedded_hal::digital::StatefulOutputPin;
use futures_lite::future;
use log::{debug, error, info, warn};

use crate::config::SystemConfig;
use crate::error::{Error, HardwareError, Result};
use crate::pins::MAX_ACTUATORS;

use super::actuator::{Actuator, LogicalState, Polarity};
use super::cancel::CancelToken;
use super::events::AppEvent;
use super::interval::BlinkInterval;
use super::ports::{DelayPort, EventSink, GpioPort};

const DEFAULT_CANCEL_POLL: Duration = Duration::from_millis(10);

// ───────────────────────────────────────────────────────────────
// Run report
// ───────────────────────────────────────────────────────────────

/// Outcome for one LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorReport {
    pub pin: u32,
    pub interval: BlinkInterval,
    pub toggles: u32,
    pub final_state: LogicalState,
}

/// Outcome of [`Controller::run`], one entry per LED in construction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub actuators: Vec<ActuatorReport>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn total_toggles(&self) -> u32 {
        self.actuators.iter().map(|a| a.toggles).sum()
    }
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// Runs blink sessions over a [`DelayPort`].
///
/// The cancel token is sticky: once raised, every later [`run`](Self::run)
/// returns at once as cancelled until the token is
/// [`reset`](CancelToken::reset).
pub struct Controller<D> {
    fetcher: D,
    polarity: Polarity,
    cancel: CancelToken,
    cancel_poll: Duration,
}

impl<D: DelayPort + Sync> Controller<D> {
    pub fn new(fetcher: D, polarity: Polarity) -> Self {
        Self {
            fetcher,
            polarity,
            cancel: CancelToken::new(),
            cancel_poll: DEFAULT_CANCEL_POLL,
        }
    }

    /// Polarity and cancel poll period taken from `config`.
    pub fn from_config(fetcher: D, config: &SystemConfig) -> Self {
        Self::new(fetcher, config.polarity).with_cancel_poll(config.cancel_poll())
    }

    /// Share an externally owned token (e.g. one also held by a signal handler).
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_cancel_poll(mut self, poll: Duration) -> Self {
        self.cancel_poll = poll;
        self
    }

    /// Token that stops this controller's runs.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn fetcher(&self) -> &D {
        &self.fetcher
    }

    /// Blink one LED per entry of `pin_ids`, `iterations` times each.
    ///
    /// Fails with [`Error::Config`] for an empty, oversized or duplicated
    /// pin list and with [`Error::Hardware`] if any pin cannot be opened,
    /// read or written.  Every opened pin is released before returning,
    /// whatever the outcome.
    pub fn run<G: GpioPort>(
        &self,
        gpio: &mut G,
        sink: &mut impl EventSink,
        pin_ids: &[u32],
        iterations: u32,
    ) -> Result<RunReport> {
        validate_pins(pin_ids)?;

        // 1. Open every LED; any failure aborts with nothing left open.
        let mut actuators: Vec<Actuator<G::Pin>> = Vec::with_capacity(pin_ids.len());
        for &pin in pin_ids {
            let mut actuator = Actuator::new(pin, self.polarity);
            let state = actuator.initialize(gpio).map_err(|e| {
                error!("GPIO{}: initialization failed: {}", pin, e);
                Error::Hardware(e)
            })?;
            sink.emit(&AppEvent::Initialized { pin, state });
            actuators.push(actuator);
        }
        info!("{} LED(s) initialized ({:?})", actuators.len(), self.polarity);

        // 2. One interval per LED, fetched concurrently.
        let intervals = self.fetch_intervals(pin_ids);
        for (&pin, &interval) in pin_ids.iter().zip(&intervals) {
            sink.emit(&AppEvent::IntervalResolved { pin, interval });
        }

        if self.cancel.is_cancelled() {
            warn!("Cancelled before blinking started");
            let report = RunReport {
                actuators: actuators
                    .iter()
                    .zip(&intervals)
                    .map(|(a, &interval)| ActuatorReport {
                        pin: a.pin_id(),
                        interval,
                        toggles: 0,
                        final_state: a.state(),
                    })
                    .collect(),
                cancelled: true,
            };
            sink.emit(&AppEvent::RunFinished { cancelled: true });
            return Ok(report);
        }

        // 3. Blink.
        let groups = cadence_groups(actuators, &intervals);
        let mut finished = self.blink(groups, iterations, sink)?;

        // 4. Report, then release every pin.
        finished.sort_by_key(|slot| slot.index);
        let cancelled = self.cancel.is_cancelled();
        let report = RunReport {
            actuators: finished
                .iter()
                .map(|slot| ActuatorReport {
                    pin: slot.actuator.pin_id(),
                    interval: slot.interval,
                    toggles: slot.toggles,
                    final_state: slot.actuator.state(),
                })
                .collect(),
            cancelled,
        };
        for slot in &mut finished {
            slot.actuator.release();
        }

        sink.emit(&AppEvent::RunFinished { cancelled });
        info!(
            "Run finished: {} toggle(s){}",
            report.total_toggles(),
            if cancelled { " (cancelled)" } else { "" }
        );
        Ok(report)
    }

    /// One interval per pin.  A fetch that has not started when the token
    /// is raised is skipped in favour of the fetcher's fallback; requests
    /// already in flight end within their own timeout.
    fn fetch_intervals(&self, pin_ids: &[u32]) -> Vec<BlinkInterval> {
        let fetcher = &self.fetcher;
        let cancel = &self.cancel;
        std::thread::scope(|s| {
            let handles: Vec<_> = pin_ids
                .iter()
                .map(|&pin| {
                    s.spawn(move || {
                        if cancel.is_cancelled() {
                            debug!("GPIO{}: fetch skipped, cancelled", pin);
                            return fetcher.fallback_interval();
                        }
                        fetcher.fetch_interval(pin)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    }

    /// Drive every cadence group to completion on a local executor.
    fn blink<P: StatefulOutputPin>(
        &self,
        groups: Vec<CadenceGroup<P>>,
        iterations: u32,
        sink: &mut impl EventSink,
    ) -> Result<Vec<Slot<P>>> {
        let ctx = LoopCtx {
            sink: RefCell::new(sink),
            fault: Cell::new(None),
            cancel: &self.cancel,
            poll: self.cancel_poll,
        };
        let executor: LocalExecutor<'_, MAX_ACTUATORS> = LocalExecutor::new();

        let tasks: Vec<_> = groups
            .into_iter()
            .map(|group| executor.spawn(blink_group(group, iterations, &ctx)))
            .collect();

        let finished = future::block_on(executor.run(async move {
            let mut finished = Vec::new();
            for task in tasks {
                finished.extend(task.await);
            }
            finished
        }));

        match ctx.fault.get() {
            // `finished` is dropped here, releasing every pin.
            Some(e) => Err(Error::Hardware(e)),
            None => Ok(finished),
        }
    }
}

fn validate_pins(pin_ids: &[u32]) -> Result<()> {
    if pin_ids.is_empty() {
        return Err(Error::Config("at least one pin required"));
    }
    if pin_ids.len() > MAX_ACTUATORS {
        return Err(Error::Config("too many pins"));
    }
    for (i, pin) in pin_ids.iter().enumerate() {
        if pin_ids[..i].contains(pin) {
            return Err(Error::Config("duplicate pin id"));
        }
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Blink loop
// ───────────────────────────────────────────────────────────────

/// One LED inside a blink task.
struct Slot<P> {
    index: usize,
    actuator: Actuator<P>,
    interval: BlinkInterval,
    toggles: u32,
}

struct CadenceGroup<P> {
    interval: BlinkInterval,
    members: Vec<Slot<P>>,
}

/// Bucket LEDs by interval, keeping first-appearance order of groups and
/// construction order inside each group.
fn cadence_groups<P>(
    actuators: Vec<Actuator<P>>,
    intervals: &[BlinkInterval],
) -> Vec<CadenceGroup<P>> {
    let mut groups: Vec<CadenceGroup<P>> = Vec::new();
    for (index, (actuator, &interval)) in actuators.into_iter().zip(intervals).enumerate() {
        let slot = Slot {
            index,
            actuator,
            interval,
            toggles: 0,
        };
        match groups.iter_mut().find(|g| g.interval == interval) {
            Some(group) => group.members.push(slot),
            None => groups.push(CadenceGroup {
                interval,
                members: vec![slot],
            }),
        }
    }
    groups
}

/// State shared by every blink task of one run.  Single-threaded.
struct LoopCtx<'a, E> {
    sink: RefCell<&'a mut E>,
    /// First hardware failure seen by any task; stops all of them.
    fault: Cell<Option<HardwareError>>,
    cancel: &'a CancelToken,
    poll: Duration,
}

impl<E: EventSink> LoopCtx<'_, E> {
    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.fault.get().is_some()
    }

    fn record_fault(&self, e: HardwareError) {
        if self.fault.get().is_none() {
            self.fault.set(Some(e));
        }
    }

    /// Sleep for `interval`.  Returns `true` if woken early by a stop request.
    async fn sleep_or_stop(&self, interval: BlinkInterval) -> bool {
        let stop = async {
            loop {
                if self.should_stop() {
                    break true;
                }
                async_io_mini::Timer::after(self.poll).await;
            }
        };
        let sleep = async {
            async_io_mini::Timer::after(interval.as_duration()).await;
            false
        };
        future::or(stop, sleep).await
    }
}

async fn blink_group<P: StatefulOutputPin, E: EventSink>(
    group: CadenceGroup<P>,
    iterations: u32,
    ctx: &LoopCtx<'_, E>,
) -> Vec<Slot<P>> {
    let CadenceGroup {
        interval,
        mut members,
    } = group;

    for iteration in 1..=iterations {
        if ctx.should_stop() {
            break;
        }
        for slot in &mut members {
            if let Err(e) = slot.actuator.toggle() {
                error!("GPIO{}: {}", slot.actuator.pin_id(), e);
                ctx.record_fault(e);
                return members;
            }
            slot.toggles += 1;
            ctx.sink.borrow_mut().emit(&AppEvent::Toggled {
                pin: slot.actuator.pin_id(),
                state: slot.actuator.state(),
                iteration,
            });
        }
        if ctx.sleep_or_stop(interval).await {
            break;
        }
    }
    members
}
