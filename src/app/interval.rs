//! Blink interval and the remote-body parsing rules.

use core::fmt;
use core::num::NonZeroU32;
use core::time::Duration;

use log::debug;

use crate::config::DEFAULT_FALLBACK_DELAY_MS;
use crate::error::FetchError;

/// Time between two toggles of one LED.  Always at least 1 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlinkInterval(NonZeroU32);

impl BlinkInterval {
    /// `None` for zero.
    pub const fn from_millis(ms: u32) -> Option<Self> {
        match NonZeroU32::new(ms) {
            Some(ms) => Some(Self(ms)),
            None => None,
        }
    }

    pub const fn millis(self) -> u32 {
        self.0.get()
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(u64::from(self.0.get()))
    }

    /// Parse an endpoint response body.
    ///
    /// Accepts a decimal integer with optional sign and surrounding
    /// whitespace.  Zero and negatives parse but are rejected as
    /// [`FetchError::NotPositive`]; anything else is [`FetchError::Parse`].
    pub fn parse(body: &str) -> Result<Self, FetchError> {
        let value: i64 = body.trim().parse().map_err(|_| FetchError::Parse)?;
        if value <= 0 {
            return Err(FetchError::NotPositive);
        }
        let ms = u32::try_from(value).map_err(|_| FetchError::Parse)?;
        Self::from_millis(ms).ok_or(FetchError::NotPositive)
    }

    /// Collapse a fetch outcome at the fetcher boundary.
    pub fn or_fallback(outcome: Result<Self, FetchError>, fallback: Self) -> Self {
        match outcome {
            Ok(interval) => interval,
            Err(e) => {
                debug!("delay fetch failed ({}), using fallback {}", e, fallback);
                fallback
            }
        }
    }
}

impl Default for BlinkInterval {
    fn default() -> Self {
        Self::from_millis(DEFAULT_FALLBACK_DELAY_MS).unwrap_or(Self(NonZeroU32::MIN))
    }
}

impl fmt::Display for BlinkInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
