// src/lib.rs
//! GPS Clock Sync Library
//!
//! Finds an attached serial GPS receiver reporting an active GPRMC fix and
//! sets the system UTC clock from it.

pub mod clock;
pub mod config;
pub mod error;
pub mod extractor;
pub mod gps;
pub mod logging;
pub mod sync;

// Re-export main types for convenience
pub use clock::{apply_clock, ClockSetter, DryRunClock, SystemClock};
pub use config::SyncConfig;
pub use error::{ClockSyncError, Result};
pub use extractor::{discover_ports, extract_fix, scan_port};
pub use gps::{derive_timestamp, FixResult, GpsTimestamp, SerialPort};
pub use sync::{ClockSync, SyncOutcome, SyncPhase};
