//! Cooperative cancellation for blink loops.
//!
//! A [`CancelToken`] is a shared flag.  Sleeping loops notice it by
//! polling on a reactor timer, so the stop latency is bounded by the
//! poll period rather than by the (possibly long) blink interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

/// Cloneable, thread-safe stop request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request every holder of this token to stop.  Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Lower the flag so the holders can run again.  A raised token stays
    /// raised until this is called.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Resolve once cancellation has been requested, checking every `poll`.
    pub async fn cancelled(&self, poll: Duration) {
        while !self.is_cancelled() {
            async_io_mini::Timer::after(poll).await;
        }
    }
}
