//! Typed cell values.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Serializer};

/// Largest integer an f64 represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// The value of a single worksheet cell, as inferred by the reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    /// No value
    #[default]
    Empty,
    /// Boolean cell (`t="b"`)
    Bool(bool),
    /// Numeric cell without a date/time number format
    Number(f64),
    /// Text from the shared string table, an inline string or a formula result
    Text(String),
    /// Serial number under a date or datetime format
    DateTime(NaiveDateTime),
    /// Serial number under a time-only format
    Time(NaiveTime),
    /// Error cell such as `#DIV/0!` or `#N/A`
    Error(String),
}

impl CellValue {
    /// Whether the cell holds no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Text used when the value becomes a column header.
    ///
    /// Empty cells yield `None`; the caller assigns a positional name.
    pub fn to_header(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Bool(true) => Some("TRUE".to_string()),
            CellValue::Bool(false) => Some("FALSE".to_string()),
            CellValue::Number(n) => Some(match as_integer(*n) {
                Some(i) => i.to_string(),
                None => n.to_string(),
            }),
            CellValue::Text(s) => Some(s.clone()),
            CellValue::DateTime(dt) => Some(format_datetime(dt)),
            CellValue::Time(t) => Some(format_time(t)),
            CellValue::Error(code) => Some(code.clone()),
        }
    }
}

/// The integer value of `n` if it is integral and exactly representable.
fn as_integer(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Some(n as i64)
    } else {
        None
    }
}

/// ISO-8601 datetime, with milliseconds only when present.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

/// ISO-8601 time of day, with milliseconds only when present.
pub fn format_time(t: &NaiveTime) -> String {
    if t.nanosecond() == 0 {
        t.format("%H:%M:%S").to_string()
    } else {
        t.format("%H:%M:%S%.3f").to_string()
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty | CellValue::Error(_) => serializer.serialize_none(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Number(n) => match as_integer(*n) {
                Some(i) => serializer.serialize_i64(i),
                None if n.is_finite() => serializer.serialize_f64(*n),
                None => serializer.serialize_none(),
            },
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::DateTime(dt) => serializer.serialize_str(&format_datetime(dt)),
            CellValue::Time(t) => serializer.serialize_str(&format_time(t)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}
