//! Unified error types for the InternetLed controller.
//!
//! Two failure families exist and they are handled very differently:
//!
//! - [`HardwareError`] is fatal.  It propagates out of the actuator,
//!   through the controller, and ends the run.
//! - [`FetchError`] never leaves the delay fetcher.  Every variant is
//!   converted into the configured fallback interval at that boundary.
//!
//! All variants are `Copy` so they can be passed through async tasks
//! and event payloads without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible controller operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A pin could not be opened, configured, read, or written.
    Hardware(HardwareError),
    /// The run was requested with invalid parameters.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

/// Pin-level failure.  Each variant carries the GPIO number involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// The pin does not exist or the driver refused to open it.
    Open(u32),
    /// The pin opened but could not be put into output mode.
    Configure(u32),
    /// Reading back the drive level failed.
    Read(u32),
    /// Driving the pin failed.
    Write(u32),
    /// The pin is already held open by another owner.
    Busy(u32),
}

impl HardwareError {
    /// GPIO number the failure refers to.
    pub const fn pin(self) -> u32 {
        match self {
            Self::Open(p) | Self::Configure(p) | Self::Read(p) | Self::Write(p) | Self::Busy(p) => p,
        }
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(p) => write!(f, "GPIO{p} open failed"),
            Self::Configure(p) => write!(f, "GPIO{p} output mode config failed"),
            Self::Read(p) => write!(f, "GPIO{p} read failed"),
            Self::Write(p) => write!(f, "GPIO{p} write failed"),
            Self::Busy(p) => write!(f, "GPIO{p} already in use"),
        }
    }
}

impl std::error::Error for HardwareError {}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Fetch errors
// ---------------------------------------------------------------------------

/// Why a remote interval could not be used.  Never surfaced past the
/// fetcher; see [`DelayPort`](crate::app::ports::DelayPort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// The endpoint is not a usable `http://` URL.
    InvalidUrl,
    /// Connection refused, DNS failure, reset, etc.
    Network,
    /// No complete response within the configured timeout.
    Timeout,
    /// Server answered with a non-success status.
    Status(u16),
    /// The response body could not be read as text.
    Body,
    /// The body is not a decimal integer.
    Parse,
    /// The body parsed but is zero or negative.
    NotPositive,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl => write!(f, "invalid endpoint URL"),
            Self::Network => write!(f, "network error"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Status(code) => write!(f, "HTTP status {code}"),
            Self::Body => write!(f, "unreadable response body"),
            Self::Parse => write!(f, "body is not an integer"),
            Self::NotPositive => write!(f, "interval must be positive"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
