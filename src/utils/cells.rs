use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use crate::error::AttendanceError;

/// Formats accepted for dates coming out of a worksheet. Log sheets use ISO,
/// form responses use US-style dates.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

const TIME_FORMATS: [&str; 6] = [
    "%H:%M:%S",
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
    "%Y-%m-%d %H:%M:%S",
];

/// ===============================
/// Sheet cell -> String
/// ===============================
///
/// Spreadsheets hand back whatever the cell holds. Everything is stored as
/// text, with nulls as empty cells and integral numbers without a fraction
/// (grade `3.0` and `"3"` are the same grade).
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64() {
                normalize_number(f)
            } else {
                n.to_string()
            }
        }
        other => other.to_string(),
    }
}

/// Canonical text for a grade cell.
pub fn normalize_grade(raw: &str) -> String {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => normalize_number(f),
        _ => raw.to_string(),
    }
}

fn normalize_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AttendanceError> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            // form timestamps sometimes land in the date column
            raw.split_whitespace()
                .next()
                .and_then(|d| DATE_FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(d, fmt).ok()))
        })
        .ok_or_else(|| AttendanceError::Parse(format!("invalid date '{}'", raw)))
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, AttendanceError> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| AttendanceError::Parse(format!("invalid time '{}'", raw)))
}

/// Empty cells are `None`; anything else must parse.
pub fn parse_optional_date(raw: &str) -> Result<Option<NaiveDate>, AttendanceError> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        parse_date(raw).map(Some)
    }
}

pub fn parse_optional_time(raw: &str) -> Result<Option<NaiveTime>, AttendanceError> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        parse_time(raw).map(Some)
    }
}
