// src/gps/nmea.rs
//! GPRMC sentence recognition and timestamp derivation

use super::data::{split_pairs, FixResult, GpsTimestamp};
use crate::error::{ClockSyncError, Result};

/// Sentence type accepted as a time source
pub const GPRMC: &str = "GPRMC";

/// Anything shorter cannot carry the date field
pub const MIN_GPRMC_FIELDS: usize = 10;

const TIME_FIELD: usize = 1;
const STATUS_FIELD: usize = 2;
const DATE_FIELD: usize = 9;

/// A raw NMEA line split into its comma-separated fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NmeaSentence<'a> {
    fields: Vec<&'a str>,
}

impl<'a> NmeaSentence<'a> {
    pub fn parse(line: &'a str) -> Self {
        Self {
            fields: line.split(',').collect(),
        }
    }

    pub fn fields(&self) -> &[&'a str] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.fields.get(index).copied()
    }

    /// Talker and sentence id without the leading `$`
    pub fn sentence_type(&self) -> &'a str {
        let first = self.fields.first().copied().unwrap_or_default();
        first.strip_prefix('$').unwrap_or(first)
    }

    /// GPRMC with enough fields to hold a date
    pub fn is_gprmc(&self) -> bool {
        self.sentence_type() == GPRMC && self.fields.len() >= MIN_GPRMC_FIELDS
    }

    /// Status field is `A` (active)
    pub fn has_active_fix(&self) -> bool {
        self.field(STATUS_FIELD) == Some("A")
    }
}

/// What a single line read from a port amounts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Not a GPRMC sentence
    Ignored,
    /// GPRMC with a void (or missing) status
    NoFix,
    Fix(FixResult),
}

/// Classify one line received on `port`
pub fn classify_line(port: &str, line: &str) -> LineOutcome {
    let sentence = NmeaSentence::parse(line);
    if !sentence.is_gprmc() {
        return LineOutcome::Ignored;
    }
    if !sentence.has_active_fix() {
        return LineOutcome::NoFix;
    }

    LineOutcome::Fix(FixResult {
        port: port.to_string(),
        raw_sentence: line.to_string(),
        active: true,
        time_field: strip_fraction(sentence.field(TIME_FIELD).unwrap_or_default()).to_string(),
        date_field: sentence.field(DATE_FIELD).unwrap_or_default().to_string(),
    })
}

/// Build the UTC timestamp carried by a fix.
///
/// The raw sentence is split again rather than trusting the cached fields.
/// The year is the literal `20` + `yy`, so `94` becomes `2094`.
pub fn derive_timestamp(fix: &FixResult) -> Result<GpsTimestamp> {
    let sentence = NmeaSentence::parse(&fix.raw_sentence);
    if sentence.fields().len() < MIN_GPRMC_FIELDS {
        return Err(ClockSyncError::MalformedTimestamp(format!(
            "sentence has {} fields, need at least {}",
            sentence.fields().len(),
            MIN_GPRMC_FIELDS
        )));
    }

    let time = strip_fraction(sentence.field(TIME_FIELD).unwrap_or_default());
    let date = sentence.field(DATE_FIELD).unwrap_or_default();

    let (hour, minute, second) = split_pairs(time)
        .ok_or_else(|| malformed("time", time))?;
    let (day, month, yy) = split_pairs(date)
        .ok_or_else(|| malformed("date", date))?;

    let timestamp = GpsTimestamp {
        year: format!("20{}", yy),
        month: month.to_string(),
        day: day.to_string(),
        hour: hour.to_string(),
        minute: minute.to_string(),
        second: second.to_string(),
    };

    if timestamp.to_naive().is_none() {
        return Err(ClockSyncError::MalformedTimestamp(format!(
            "{} is not a valid calendar time",
            timestamp
        )));
    }

    Ok(timestamp)
}

fn strip_fraction(time: &str) -> &str {
    time.split('.').next().unwrap_or(time)
}

fn malformed(name: &str, value: &str) -> ClockSyncError {
    ClockSyncError::MalformedTimestamp(format!(
        "{} field '{}' is not 6 digits",
        name, value
    ))
}
