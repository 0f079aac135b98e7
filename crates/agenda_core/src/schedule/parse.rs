//! Parser for user-facing date and time strings.
//!
//! Accepted shapes are strictly `DD/MM/YYYY` and `HH:MM` (24h, zero padded).
//! Shape is checked before chrono parsing so `1/1/24` style input is
//! rejected instead of being read leniently.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const TIME_FORMAT: &str = "%H:%M";

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid date regex"));
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}:\d{2}$").expect("valid time regex"));

/// Input string could not be read as a date or time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    /// Logical field name (`date`, `start_time`, ...).
    pub field: &'static str,
    pub value: String,
    /// Human-readable expected shape.
    pub expected: &'static str,
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {}: `{}` (expected {})",
            self.field, self.value, self.expected
        )
    }
}

impl Error for FormatError {}

/// Parses a `DD/MM/YYYY` calendar date.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, FormatError> {
    let trimmed = value.trim();
    let invalid = || FormatError {
        field,
        value: trimmed.to_string(),
        expected: "DD/MM/YYYY",
    };
    if !DATE_RE.is_match(trimmed) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| invalid())
}

/// Parses an `HH:MM` wall-clock time.
pub fn parse_time(field: &'static str, value: &str) -> Result<NaiveTime, FormatError> {
    let trimmed = value.trim();
    let invalid = || FormatError {
        field,
        value: trimmed.to_string(),
        expected: "HH:MM",
    };
    if !TIME_RE.is_match(trimmed) {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT).map_err(|_| invalid())
}

/// Combines a date string and a time string into one date-time.
pub fn parse_date_time(date: &str, time: &str) -> Result<NaiveDateTime, FormatError> {
    let date = parse_date("date", date)?;
    let time = parse_time("start_time", time)?;
    Ok(date.and_time(time))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}
