//! WiFi station-mode adapter.
//!
//! Brings the network up before the delay endpoint is queried.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: ESP-IDF WiFi driver via `esp_idf_svc::wifi`,
//!   blocking until the station interface has an address.
//! - **all other targets**: the OS owns networking; `connect()` only
//!   records the credentials it was given.
//!
//! A failed connection is not fatal for a run: fetches fall back to the
//! configured delay, exactly as for any other network failure.

use core::fmt;
use log::{info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::peripherals::Peripherals,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

use crate::config::SystemConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl std::error::Error for WifiError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    Failed,
}

fn validate_ssid(ssid: &str) -> Result<(), WifiError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(WifiError::InvalidSsid);
    }
    if !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return Err(WifiError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), WifiError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    /// Kept alive for the whole run; dropping it stops the station.
    #[cfg(target_os = "espidf")]
    driver: Option<BlockingWifi<EspWifi<'static>>>,
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            #[cfg(target_os = "espidf")]
            driver: None,
        }
    }

    /// Adapter loaded with the configured credentials.
    pub fn from_config(config: &SystemConfig) -> Result<Self, WifiError> {
        let mut wifi = Self::new();
        wifi.set_credentials(&config.wifi_ssid, &config.wifi_password)?;
        Ok(wifi)
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), WifiError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|()| WifiError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|()| WifiError::InvalidPassword)?;
        Ok(())
    }

    /// Join the configured network and wait until it is usable.
    pub fn connect(&mut self) -> Result<(), WifiError> {
        if self.ssid.is_empty() {
            return Err(WifiError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(WifiError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connected;
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: connection failed: {}", e);
                self.state = WifiState::Failed;
                Err(e)
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        info!("WiFi: disconnected");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), WifiError> {
        let esp = |step: &'static str| {
            move |e: esp_idf_svc::sys::EspError| {
                warn!("WiFi(espidf): {} failed: {}", step, e);
                WifiError::ConnectionFailed
            }
        };

        let peripherals = Peripherals::take().map_err(esp("peripherals"))?;
        let sysloop = EspSystemEventLoop::take().map_err(esp("event loop"))?;
        let nvs = EspDefaultNvsPartition::take().map_err(esp("nvs"))?;

        let driver = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))
            .map_err(esp("driver"))?;
        let mut wifi = BlockingWifi::wrap(driver, sysloop).map_err(esp("wrap"))?;

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| WifiError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        }))
        .map_err(esp("configuration"))?;

        wifi.start().map_err(esp("start"))?;
        wifi.connect().map_err(esp("connect"))?;
        wifi.wait_netif_up().map_err(esp("netif"))?;

        self.driver = Some(wifi);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), WifiError> {
        info!("WiFi(host): '{}' is managed by the OS, nothing to do", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Some(mut wifi) = self.driver.take() {
            if let Err(e) = wifi.disconnect() {
                warn!("WiFi(espidf): disconnect failed: {}", e);
            }
            let _ = wifi.stop();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {}
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}
