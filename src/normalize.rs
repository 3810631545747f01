use crate::csv_reader::RawRow;
use chrono::Datelike;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A normalized cell value. Coercion happens exactly once, here, so the
/// numeric rules stay unit-testable in isolation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Coerce raw cell text. A value becomes numeric iff the entire trimmed
    /// string parses as a finite base-10 number (negative and decimal forms
    /// included); empty cells are `Missing`; everything else stays text.
    pub fn from_raw(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Read this value as a declared metric. Missing and non-numeric cells
    /// fall back to zero: charting requires a drawable value.
    pub fn as_metric(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => Ok(()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Missing => serializer.serialize_none(),
        }
    }
}

/// A row after normalization: lower-cased keys, coerced values, and a
/// derived `year` when a parseable `date` field exists without one.
pub type NormalizedRow = HashMap<String, Value>;

/// Canonicalize decoded rows. Extra fields pass through untouched; nothing
/// is rejected here; field presence is the synthesizer's concern.
pub fn normalize_rows(rows: &[RawRow]) -> Vec<NormalizedRow> {
    rows.iter().map(normalize_row).collect()
}

fn normalize_row(raw: &RawRow) -> NormalizedRow {
    let mut row: NormalizedRow = raw
        .iter()
        .map(|(key, value)| (key.to_lowercase(), Value::from_raw(value)))
        .collect();

    if !row.contains_key("year") {
        if let Some(year) = row.get("date").and_then(derive_year) {
            row.insert("year".to_string(), Value::Number(year as f64));
        }
    }

    row
}

/// Extract the calendar year from a date-shaped value. An unparseable date
/// yields no year at all rather than a fabricated one.
fn derive_year(date: &Value) -> Option<i32> {
    match date {
        Value::Text(s) => {
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
                return Some(dt.year());
            }
            for format in ["%Y-%m-%d", "%Y/%m/%d"] {
                if let Ok(d) = chrono::NaiveDate::parse_from_str(s, format) {
                    return Some(d.year());
                }
            }
            None
        }
        // A bare four-digit number in a date column is already a year.
        Value::Number(n) if n.fract() == 0.0 && (1000.0..=9999.0).contains(n) => Some(*n as i32),
        _ => None,
    }
}
