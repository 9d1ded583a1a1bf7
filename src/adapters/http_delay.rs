//! HTTP delay fetcher adapter.
//!
//! Implements [`DelayPort`] with a single plain-text GET per call:
//!
//! ```text
//!   GET <endpoint>  ──▶  200 "250\n"  ──▶  250 ms
//!                   ──▶  anything else ──▶  fallback
//! ```
//!
//! One attempt, no retries, no cache.  The raw outcome is available as
//! [`HttpDelayFetcher::try_fetch`]; [`HttpDelayFetcher::fetch`] applies
//! the fallback and can never fail.

use core::time::Duration;
use std::io;

use log::debug;

use crate::app::interval::BlinkInterval;
use crate::app::ports::DelayPort;
use crate::config::SystemConfig;
use crate::error::FetchError;

/// Where to ask, how long to wait, and what to use instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub fallback: BlinkInterval,
}

impl FetchConfig {
    pub fn from_system(config: &SystemConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout: config.fetch_timeout(),
            fallback: BlinkInterval::from_millis(config.fallback_delay_ms).unwrap_or_default(),
        }
    }
}

pub struct HttpDelayFetcher {
    config: FetchConfig,
    agent: ureq::Agent,
}

impl HttpDelayFetcher {
    pub fn new(config: FetchConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(FetchConfig::from_system(config))
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// One GET, no fallback applied.
    pub fn try_fetch(&self) -> Result<BlinkInterval, FetchError> {
        debug!("GET {}", self.config.endpoint);
        let body = match self.agent.get(&self.config.endpoint).call() {
            Ok(response) => response.into_string().map_err(|e| {
                if is_timeout(&e) {
                    FetchError::Timeout
                } else {
                    FetchError::Body
                }
            })?,
            Err(ureq::Error::Status(code, _)) => return Err(FetchError::Status(code)),
            Err(ureq::Error::Transport(t)) => return Err(classify_transport(&t)),
        };
        debug!("response body: [{}]", body.trim());
        BlinkInterval::parse(&body)
    }

    /// One GET; any failure yields the configured fallback.
    pub fn fetch(&self) -> BlinkInterval {
        BlinkInterval::or_fallback(self.try_fetch(), self.config.fallback)
    }
}

impl DelayPort for HttpDelayFetcher {
    fn fetch_interval(&self, pin_id: u32) -> BlinkInterval {
        let interval = self.fetch();
        debug!("GPIO{}: fetched interval {}", pin_id, interval);
        interval
    }

    fn fallback_interval(&self) -> BlinkInterval {
        self.config.fallback
    }
}

/// One-shot fetch without keeping a fetcher around.
pub fn fetch(endpoint: &str, timeout: Duration, fallback: BlinkInterval) -> BlinkInterval {
    HttpDelayFetcher::new(FetchConfig {
        endpoint: endpoint.into(),
        timeout,
        fallback,
    })
    .fetch()
}

fn classify_transport(t: &ureq::Transport) -> FetchError {
    match t.kind() {
        ureq::ErrorKind::InvalidUrl | ureq::ErrorKind::UnknownScheme => FetchError::InvalidUrl,
        ureq::ErrorKind::Io => {
            let timed_out = std::error::Error::source(t)
                .and_then(|s| s.downcast_ref::<io::Error>())
                .is_some_and(is_timeout);
            if timed_out {
                FetchError::Timeout
            } else {
                FetchError::Network
            }
        }
        _ => FetchError::Network,
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}
