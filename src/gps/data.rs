// src/gps/data.rs
//! Serial port, fix and timestamp data structures

use chrono::{NaiveDate, NaiveDateTime};
use std::{fmt, time::Duration};

/// NMEA-0183 standard rate
pub const DEFAULT_BAUDRATE: u32 = 4800;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_LINES: usize = 100;

/// A candidate serial device and how to read it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPort {
    pub path: String,
    pub baudrate: u32,
    pub read_timeout: Duration,
    pub max_lines: usize,
}

impl SerialPort {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baudrate: DEFAULT_BAUDRATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_lines: DEFAULT_MAX_LINES,
        }
    }

    pub fn with_baudrate(mut self, baudrate: u32) -> Self {
        self.baudrate = baudrate;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }
}

/// A GPRMC sentence picked up while scanning a port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixResult {
    pub port: String,
    pub raw_sentence: String,
    /// Status field was `A`
    pub active: bool,
    /// `hhmmss` with any fractional seconds removed
    pub time_field: String,
    /// `ddmmyy`
    pub date_field: String,
}

/// `(first, second, third)` two-digit groups of a six-digit field
pub(crate) fn split_pairs(field: &str) -> Option<(&str, &str, &str)> {
    if field.len() != 6 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((&field[0..2], &field[2..4], &field[4..6]))
}

/// UTC timestamp taken from a GPRMC sentence.
///
/// Components are kept as the two-digit strings received on the wire so the
/// rendered form matches the sentence exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpsTimestamp {
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
    pub minute: String,
    pub second: String,
}

impl GpsTimestamp {
    /// Calendar value for the clock call, `None` if the fields do not form a real date
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(
            self.year.parse().ok()?,
            self.month.parse().ok()?,
            self.day.parse().ok()?,
        )?;
        date.and_hms_opt(
            self.hour.parse().ok()?,
            self.minute.parse().ok()?,
            self.second.parse().ok()?,
        )
    }
}

impl fmt::Display for GpsTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{} {}:{}:{}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn stamp(y: &str, mo: &str, d: &str, h: &str, mi: &str, s: &str) -> GpsTimestamp {
        GpsTimestamp {
            year: y.into(),
            month: mo.into(),
            day: d.into(),
            hour: h.into(),
            minute: mi.into(),
            second: s.into(),
        }
    }

    #[test]
    fn test_serial_port_defaults() {
        let port = SerialPort::new("/dev/ttyUSB0");
        assert_eq!(port.baudrate, 4800);
        assert_eq!(port.read_timeout, Duration::from_secs(2));
        assert_eq!(port.max_lines, 100);
    }

    #[test]
    fn test_split_pairs() {
        assert_eq!(split_pairs("123519"), Some(("12", "35", "19")));
        assert_eq!(split_pairs("2303a4"), None);
        assert_eq!(split_pairs("12351"), None);
    }

    #[test]
    fn test_timestamp_display() {
        let ts = stamp("2094", "03", "23", "12", "35", "19");
        assert_eq!(ts.to_string(), "2094-03-23 12:35:19");
    }

    #[test]
    fn test_to_naive() {
        let dt = stamp("2024", "02", "29", "23", "59", "58").to_naive().unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 2, 29));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (23, 59, 58));
    }

    #[test]
    fn test_to_naive_rejects_impossible_dates() {
        assert!(stamp("2023", "02", "29", "00", "00", "00").to_naive().is_none());
        assert!(stamp("2023", "13", "01", "00", "00", "00").to_naive().is_none());
        assert!(stamp("2023", "01", "01", "24", "00", "00").to_naive().is_none());
    }
}
