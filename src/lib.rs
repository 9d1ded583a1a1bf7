//! InternetLed library.
//!
//! Blinks one or more GPIO LEDs at a cadence fetched once from a web
//! endpoint.  The domain core lives in [`app`]; hardware, HTTP and
//! logging are adapters in [`adapters`].  ESP-IDF-specific code is
//! guarded by `#[cfg(target_os = "espidf")]` so the whole crate builds
//! and tests on a host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod pins;
