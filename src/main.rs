//! InternetLed: main entry point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  EspGpio / SimGpio   HttpDelayFetcher   LogEventSink         │
//! │  (GpioPort)          (DelayPort)        (EventSink)          │
//! │  WifiAdapter: station bring-up before the first fetch        │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Controller: Actuators · cadence groups · CancelToken  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration precedence: built-in defaults < JSON file (`--config`)
//! < flags / `INTERNET_LED_*` environment variables.  Board builds take no
//! argv, so WiFi credentials come from `INTERNET_LED_WIFI_SSID` /
//! `INTERNET_LED_WIFI_PASSWORD` at build time.
#![deny(unused_must_use)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use embedded_hal::digital::PinState;
use log::{info, warn};

use internet_led::adapters::http_delay::HttpDelayFetcher;
use internet_led::adapters::log_sink::LogEventSink;
use internet_led::adapters::wifi::WifiAdapter;
use internet_led::app::actuator::Polarity;
use internet_led::app::controller::Controller;
use internet_led::config::{ConfigError, SystemConfig};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file; missing fields keep their defaults
    #[arg(short, long, env = "INTERNET_LED_CONFIG")]
    config: Option<PathBuf>,

    /// GPIO to drive (repeat or comma-separate for several LEDs)
    #[arg(short, long = "pin", env = "INTERNET_LED_PINS", value_delimiter = ',')]
    pins: Vec<u32>,

    /// WiFi network to join before fetching (board builds)
    #[arg(long, env = "INTERNET_LED_WIFI_SSID")]
    wifi_ssid: Option<String>,

    #[arg(long, env = "INTERNET_LED_WIFI_PASSWORD", hide_env_values = true)]
    wifi_password: Option<String>,

    /// Plain http:// URL answering the blink delay in milliseconds
    #[arg(long, env = "INTERNET_LED_ENDPOINT")]
    endpoint: Option<String>,

    /// Delay used when the endpoint fails (ms)
    #[arg(long, env = "INTERNET_LED_FALLBACK_MS")]
    fallback_ms: Option<u32>,

    /// Fetch timeout (ms)
    #[arg(long, env = "INTERNET_LED_TIMEOUT_MS")]
    timeout_ms: Option<u32>,

    /// Toggles per LED
    #[arg(short = 'n', long, env = "INTERNET_LED_ITERATIONS")]
    iterations: Option<u32>,

    /// Which physical level lights the LED
    #[arg(long, value_enum, env = "INTERNET_LED_POLARITY")]
    polarity: Option<PolarityArg>,

    /// Power-on level of the simulated pins (host builds only)
    #[arg(long, value_enum, default_value = "high")]
    sim_initial_level: LevelArg,

    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolarityArg {
    ActiveLow,
    ActiveHigh,
}

impl From<PolarityArg> for Polarity {
    fn from(p: PolarityArg) -> Self {
        match p {
            PolarityArg::ActiveLow => Self::ActiveLow,
            PolarityArg::ActiveHigh => Self::ActiveHigh,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LevelArg {
    Low,
    High,
}

impl From<LevelArg> for PinState {
    fn from(l: LevelArg) -> Self {
        match l {
            LevelArg::Low => Self::Low,
            LevelArg::High => Self::High,
        }
    }
}

fn load_config(args: &Args) -> Result<SystemConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SystemConfig::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SystemConfig::default(),
    };

    if !args.pins.is_empty() {
        config.led_pins =
            heapless::Vec::from_slice(&args.pins).map_err(|()| ConfigError::TooManyPins)?;
    }
    if let Some(ssid) = &args.wifi_ssid {
        config.wifi_ssid = heapless::String::try_from(ssid.as_str())
            .map_err(|()| ConfigError::ValidationFailed("wifi_ssid: at most 32 bytes"))?;
    }
    if let Some(password) = &args.wifi_password {
        config.wifi_password = heapless::String::try_from(password.as_str())
            .map_err(|()| ConfigError::ValidationFailed("wifi_password: 8-64 bytes or empty"))?;
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint.clone_from(endpoint);
    }
    if let Some(ms) = args.fallback_ms {
        config.fallback_delay_ms = ms;
    }
    if let Some(ms) = args.timeout_ms {
        config.fetch_timeout_ms = ms;
    }
    if let Some(n) = args.iterations {
        config.iterations = n;
    }
    if let Some(p) = args.polarity {
        config.polarity = p.into();
    }
    Ok(config)
}

/// Join the configured network.  Without credentials the existing network
/// is used; a failed join is logged and the run continues on fallback delays.
fn bring_up_network(config: &SystemConfig) -> Option<WifiAdapter> {
    if config.wifi_ssid.is_empty() {
        info!("No WiFi credentials; using the existing network");
        return None;
    }
    let mut wifi = match WifiAdapter::from_config(config) {
        Ok(wifi) => wifi,
        Err(e) => {
            warn!("WiFi: {}; delays will fall back", e);
            return None;
        }
    };
    match wifi.connect() {
        Ok(()) => Some(wifi),
        Err(e) => {
            warn!("WiFi: {}; delays will fall back", e);
            None
        }
    }
}

fn main() -> Result<()> {
    // ── 1. Platform bootstrap + logging ───────────────────────
    #[cfg(target_os = "espidf")]
    let args = {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
        // No argv on the board: defaults only.
        Args::parse_from(["internet-led"])
    };

    #[cfg(not(target_os = "espidf"))]
    let args = {
        let args = Args::parse();
        simple_logger::SimpleLogger::new()
            .with_level(args.log_level)
            .init()?;
        args
    };

    info!("InternetLed v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config(&args)?;
    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }
    config.validate()?;
    info!(
        "LEDs {:?} ({:?}), endpoint {}, fallback {}ms, {} iteration(s)",
        config.led_pins.as_slice(),
        config.polarity,
        config.endpoint,
        config.fallback_delay_ms,
        config.iterations
    );

    // ── 3. Network ────────────────────────────────────────────
    // Held until the run ends; dropping it stops the station.
    let _wifi = bring_up_network(&config);

    // ── 4. Adapters ───────────────────────────────────────────
    #[cfg(target_os = "espidf")]
    let mut gpio = internet_led::adapters::esp_gpio::EspGpio::new();
    #[cfg(not(target_os = "espidf"))]
    let mut gpio = internet_led::adapters::sim_gpio::SimGpio::new(args.sim_initial_level.into());

    let mut sink = LogEventSink::new();
    let controller = Controller::from_config(HttpDelayFetcher::from_config(&config), &config);

    // ── 5. Run ────────────────────────────────────────────────
    let report = controller
        .run(&mut gpio, &mut sink, &config.led_pins, config.iterations)
        .context("blink run aborted")?;

    for led in &report.actuators {
        info!(
            "GPIO{}: {} toggle(s) every {}, left {}",
            led.pin, led.toggles, led.interval, led.final_state
        );
    }
    Ok(())
}
