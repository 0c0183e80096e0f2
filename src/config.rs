// src/config.rs
//! Configuration management with platform-specific defaults

use crate::error::{ClockSyncError, Result};
use crate::gps::data::{SerialPort, DEFAULT_BAUDRATE, DEFAULT_MAX_LINES};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Directory searched for serial devices
    pub device_dir: String,
    /// Device name prefixes that identify a serial GPS candidate
    pub port_prefixes: Vec<String>,
    /// Explicit ports; discovery is skipped when non-empty
    pub ports: Vec<String>,
    pub baudrate: u32,
    pub read_timeout_secs: u64,
    pub max_lines: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl SyncConfig {
    /// Get platform-specific default configuration
    pub fn platform_default() -> Self {
        Self {
            device_dir: Self::default_device_dir().to_string(),
            port_prefixes: Self::default_prefixes()
                .iter()
                .map(|p| p.to_string())
                .collect(),
            ports: Vec::new(),
            baudrate: DEFAULT_BAUDRATE,
            read_timeout_secs: 2,
            max_lines: DEFAULT_MAX_LINES,
        }
    }

    #[cfg(target_os = "macos")]
    fn default_prefixes() -> &'static [&'static str] {
        &["cu.usbserial", "cu.usbmodem"]
    }

    #[cfg(windows)]
    fn default_prefixes() -> &'static [&'static str] {
        &["COM"]
    }

    #[cfg(not(any(target_os = "macos", windows)))]
    fn default_prefixes() -> &'static [&'static str] {
        &["ttyUSB", "ttyACM"]
    }

    #[cfg(windows)]
    fn default_device_dir() -> &'static str {
        ""
    }

    #[cfg(not(windows))]
    fn default_device_dir() -> &'static str {
        "/dev"
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the platform defaults. Values are not validated
    /// here; call `validate` once command-line overrides are applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::get_config_path() {
                Ok(p) => p,
                Err(_) => return Ok(Self::platform_default()),
            },
        };

        if !config_path.exists() {
            tracing::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::platform_default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            ClockSyncError::Config(format!(
                "Failed to read config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            ClockSyncError::Config(format!(
                "Failed to parse config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        Ok(config)
    }

    /// Default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        #[cfg(windows)]
        let base = std::env::var("APPDATA")
            .map_err(|_| ClockSyncError::Config("APPDATA environment variable not set".to_string()))?;

        #[cfg(not(windows))]
        let base = std::env::var("HOME")
            .map(|home| format!("{}/.config", home))
            .map_err(|_| ClockSyncError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(base).join("gps-clock-sync").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.baudrate == 0 {
            return Err(ClockSyncError::Config("baudrate must be non-zero".to_string()));
        }
        if self.read_timeout_secs == 0 {
            return Err(ClockSyncError::Config(
                "read_timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.max_lines == 0 {
            return Err(ClockSyncError::Config("max_lines must be non-zero".to_string()));
        }
        if self.ports.is_empty() && self.port_prefixes.is_empty() {
            return Err(ClockSyncError::Config(
                "no ports given and no port_prefixes to discover with".to_string(),
            ));
        }
        Ok(())
    }

    /// Update serial line settings
    pub fn update_serial(&mut self, baudrate: u32, read_timeout_secs: u64, max_lines: usize) {
        self.baudrate = baudrate;
        self.read_timeout_secs = read_timeout_secs;
        self.max_lines = max_lines;
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Port description carrying this config's line settings
    pub fn serial_port(&self, path: impl Into<String>) -> SerialPort {
        SerialPort::new(path)
            .with_baudrate(self.baudrate)
            .with_read_timeout(self.read_timeout())
            .with_max_lines(self.max_lines)
    }
}
