pub mod env;
pub use env::ProxyEnv;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_VAR: &str = "RTOUCH_CONFIG";

/// Config file used when RTOUCH_CONFIG is unset
pub const DEFAULT_CONFIG_PATH: &str = "rtouch.toml";

/// Complete RTOUCH configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RtouchConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl RtouchConfig {
    /// Reject values that would stall the proxy or the polling loop
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.upstream.request_timeout_seconds > 0,
            "upstream.request_timeout_seconds must be greater than 0"
        );
        ensure!(
            self.dashboard.poll_interval_ms > 0,
            "dashboard.poll_interval_ms must be greater than 0"
        );
        Ok(())
    }
}

/// Proxy server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the built single-page app (index.html + assets)
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("client/build")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Upstream hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Hub REST API root (states at {base_url}/states)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://supervisor/core/api".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Dashboard (client side) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Base URL of the RTOUCH proxy
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    /// How often the store refreshes entity states (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Delay between a dispatched action and its follow-up refresh (milliseconds)
    #[serde(default = "default_refresh_delay")]
    pub refresh_delay_ms: u64,
    /// Directory for persisted dashboard state (role mapping, tile order)
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    /// Press duration that turns a tap into a long-press (milliseconds)
    #[serde(default = "default_long_press")]
    pub long_press_ms: u64,
    /// Pointer travel required before a mouse drag starts
    #[serde(default = "default_drag_distance")]
    pub drag_distance: f64,
    /// Press duration required before a touch drag starts (milliseconds)
    #[serde(default = "default_touch_delay")]
    pub touch_delay_ms: u64,
    /// Jitter allowed during the touch delay
    #[serde(default = "default_touch_tolerance")]
    pub touch_tolerance: f64,
    /// Code sent with alarm_disarm
    #[serde(default = "default_alarm_code")]
    pub alarm_code: String,
}

fn default_proxy_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_poll_interval() -> u64 {
    3000
}

fn default_refresh_delay() -> u64 {
    250
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".rtouch")
}

fn default_long_press() -> u64 {
    600
}

fn default_drag_distance() -> f64 {
    10.0
}

fn default_touch_delay() -> u64 {
    250
}

fn default_touch_tolerance() -> f64 {
    5.0
}

fn default_alarm_code() -> String {
    "1234".to_string()
}

impl DashboardConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            poll_interval_ms: default_poll_interval(),
            refresh_delay_ms: default_refresh_delay(),
            storage_dir: default_storage_dir(),
            long_press_ms: default_long_press(),
            drag_distance: default_drag_distance(),
            touch_delay_ms: default_touch_delay(),
            touch_tolerance: default_touch_tolerance(),
            alarm_code: default_alarm_code(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<RtouchConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: RtouchConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

/// Load configuration from RTOUCH_CONFIG (or rtouch.toml)
///
/// A missing file yields the defaults; an unreadable or invalid file is an error.
pub fn load_from_env() -> Result<RtouchConfig> {
    let path = std::env::var(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    if !path.exists() {
        return Ok(RtouchConfig::default());
    }
    load_config(&path)
}
