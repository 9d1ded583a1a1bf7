//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (UART on the board, stderr on a host).

use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one tagged line.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Initialized { pin, state } => {
                info!("INIT  | GPIO{} | state={}", pin, state);
            }
            AppEvent::IntervalResolved { pin, interval } => {
                info!("DELAY | GPIO{} | interval={}", pin, interval);
            }
            AppEvent::Toggled {
                pin,
                state,
                iteration,
            } => {
                // One line per toggle is too chatty at info.
                debug!("BLINK | GPIO{} | #{} -> {}", pin, iteration, state);
            }
            AppEvent::RunFinished { cancelled } => {
                info!("DONE  | cancelled={}", cancelled);
            }
        }
    }
}
