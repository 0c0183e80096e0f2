// src/gps/mod.rs
//! GPS data handling and parsing

pub mod data;
pub mod nmea;

pub use data::{FixResult, GpsTimestamp, SerialPort};
pub use nmea::derive_timestamp;
