// src/error.rs
//! Error types for the GPS clock sync

use std::fmt;

pub type Result<T> = std::result::Result<T, ClockSyncError>;

#[derive(Debug)]
pub enum ClockSyncError {
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Config(String),
    /// No device path matched the serial naming convention
    NoDevicesFound,
    /// Lines on one port ran out without an active fix; the scan moves on
    NoFixOnPort { port: String, reason: String },
    /// Every candidate port was scanned without an active fix
    NoValidFix { ports_scanned: usize },
    MalformedTimestamp(String),
    ClockSetFailed(String),
    InsufficientPrivilege,
    Other(String),
}

impl ClockSyncError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Per-port failures are swallowed by the scan loop
    pub fn is_per_port(&self) -> bool {
        matches!(self, ClockSyncError::NoFixOnPort { .. })
    }
}

impl fmt::Display for ClockSyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockSyncError::Io(e) => write!(f, "IO error: {}", e),
            ClockSyncError::Serial(e) => write!(f, "Serial error: {}", e),
            ClockSyncError::Json(e) => write!(f, "JSON error: {}", e),
            ClockSyncError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ClockSyncError::NoDevicesFound => {
                write!(f, "No serial devices found matching the naming convention")
            }
            ClockSyncError::NoFixOnPort { port, reason } => {
                write!(f, "No GPS fix on {}: {}", port, reason)
            }
            ClockSyncError::NoValidFix { ports_scanned } => write!(
                f,
                "No valid GPS fix found after scanning {} port(s)",
                ports_scanned
            ),
            ClockSyncError::MalformedTimestamp(msg) => write!(f, "Malformed timestamp: {}", msg),
            ClockSyncError::ClockSetFailed(msg) => write!(f, "Failed to set system clock: {}", msg),
            ClockSyncError::InsufficientPrivilege => write!(
                f,
                "Setting the system clock requires root. Re-run with sudo (or use --dry-run)"
            ),
            ClockSyncError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for ClockSyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClockSyncError::Io(e) => Some(e),
            ClockSyncError::Serial(e) => Some(e),
            ClockSyncError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClockSyncError {
    fn from(error: std::io::Error) -> Self {
        ClockSyncError::Io(error)
    }
}

impl From<tokio_serial::Error> for ClockSyncError {
    fn from(error: tokio_serial::Error) -> Self {
        ClockSyncError::Serial(error)
    }
}

impl From<serde_json::Error> for ClockSyncError {
    fn from(error: serde_json::Error) -> Self {
        ClockSyncError::Json(error)
    }
}

impl From<anyhow::Error> for ClockSyncError {
    fn from(error: anyhow::Error) -> Self {
        ClockSyncError::Other(error.to_string())
    }
}
