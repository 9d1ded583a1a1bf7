//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements | Connects to               |
//! |--------------|------------|---------------------------|
//! | `esp_gpio`   | GpioPort   | ESP-IDF GPIO matrix       |
//! | `sim_gpio`   | GpioPort   | In-memory lines (host)    |
//! | `http_delay` | DelayPort  | Plain-text HTTP endpoint  |
//! | `log_sink`   | EventSink  | `log` facade              |
//! | `wifi`       | (none)     | Station network bring-up  |

#[cfg(target_os = "espidf")]
pub mod esp_gpio;
pub mod http_delay;
pub mod log_sink;
pub mod sim_gpio;
pub mod wifi;
