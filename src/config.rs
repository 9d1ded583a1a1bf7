//! System configuration parameters
//!
//! All tunable parameters for the InternetLed controller.
//! Values come from [`Default`], optionally overlaid by a JSON config file
//! and then by command-line flags (see `main.rs`).

use core::fmt;
use core::time::Duration;

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::app::actuator::Polarity;
use crate::pins::{LED_A_GPIO, LED_B_GPIO, MAX_ACTUATORS};

/// Blink delay used when the endpoint cannot supply one.
pub const DEFAULT_FALLBACK_DELAY_MS: u32 = 1000;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Hardware ---
    /// GPIO numbers to drive, one LED each, in construction order
    pub led_pins: Vec<u32, MAX_ACTUATORS>,
    /// Mapping between logical On/Off and the physical level
    pub polarity: Polarity,

    // --- Network ---
    /// Station SSID; empty means the network is already up (host builds)
    pub wifi_ssid: heapless::String<32>,
    /// WPA2 passphrase, or empty for an open network
    pub wifi_password: heapless::String<64>,

    // --- Remote interval ---
    /// Plain `http://` URL returning the blink delay in milliseconds as
    /// text.  The HTTP client carries no TLS stack, so `https://` is rejected.
    pub endpoint: String,
    /// Delay used whenever the endpoint fails (milliseconds)
    pub fallback_delay_ms: u32,
    /// Upper bound on a single fetch (milliseconds)
    pub fetch_timeout_ms: u32,

    // --- Loop ---
    /// Number of toggles per LED before the run ends
    pub iterations: u32,
    /// How often a sleeping blink loop checks for cancellation (milliseconds)
    pub cancel_poll_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut led_pins = Vec::new();
        // Capacity is MAX_ACTUATORS (>= 2); these pushes cannot fail.
        let _ = led_pins.push(LED_A_GPIO);
        let _ = led_pins.push(LED_B_GPIO);

        Self {
            led_pins,
            polarity: Polarity::ActiveLow,

            wifi_ssid: build_env_str(option_env!("INTERNET_LED_WIFI_SSID")),
            wifi_password: build_env_str(option_env!("INTERNET_LED_WIFI_PASSWORD")),

            endpoint: "http://adafruitsample.azurewebsites.net/TimeApi".into(),
            fallback_delay_ms: DEFAULT_FALLBACK_DELAY_MS,
            fetch_timeout_ms: 5_000,

            iterations: 100,
            cancel_poll_ms: 10,
        }
    }
}

/// Credentials baked in at build time; oversized values are dropped.
fn build_env_str<const N: usize>(value: Option<&str>) -> heapless::String<N> {
    value
        .and_then(|v| heapless::String::try_from(v).ok())
        .unwrap_or_default()
}

impl SystemConfig {
    /// Parse a JSON document.  Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)
    }

    /// Pretty JSON rendering, used for `--print-config`.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|_| ConfigError::Corrupted)
    }

    /// Reject values the controller cannot run with.  Never clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.led_pins.is_empty() {
            return Err(ConfigError::ValidationFailed("led_pins: at least one pin required"));
        }
        for (i, pin) in self.led_pins.iter().enumerate() {
            if self.led_pins[..i].contains(pin) {
                return Err(ConfigError::ValidationFailed("led_pins: duplicate pin"));
            }
        }
        if !self.endpoint.starts_with("http://") {
            return Err(ConfigError::ValidationFailed("endpoint: must be a plain http:// URL"));
        }
        if !self.wifi_ssid.is_empty() {
            if !self.wifi_ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
                return Err(ConfigError::ValidationFailed("wifi_ssid: printable ASCII only"));
            }
            if !self.wifi_password.is_empty() && self.wifi_password.len() < 8 {
                return Err(ConfigError::ValidationFailed("wifi_password: 8-64 bytes or empty"));
            }
        }
        if self.fallback_delay_ms == 0 {
            return Err(ConfigError::ValidationFailed("fallback_delay_ms: must be > 0"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("fetch_timeout_ms: must be > 0"));
        }
        if self.cancel_poll_ms == 0 {
            return Err(ConfigError::ValidationFailed("cancel_poll_ms: must be > 0"));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.fetch_timeout_ms))
    }

    pub fn cancel_poll(&self) -> Duration {
        Duration::from_millis(u64::from(self.cancel_poll_ms))
    }
}

/// Errors from loading or validating a [`SystemConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not valid JSON for this schema.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// More pins were supplied than [`MAX_ACTUATORS`].
    TooManyPins,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::TooManyPins => write!(f, "at most {} LEDs supported", MAX_ACTUATORS),
        }
    }
}

impl std::error::Error for ConfigError {}
