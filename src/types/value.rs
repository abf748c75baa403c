//! Scalar cell values held in a [Dataset](crate::dataset::Dataset).
//!
//! Values are loosely typed: CSV fields and JSON record members are mapped onto one of four
//! variants at ingestion time. Analytics later coerce them to numbers or timestamps on demand,
//! treating anything that fails to coerce as missing.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

/// A numeric cell value.
/// This is an alias of the Number type from serde_json, which keeps integers as integers and
/// guarantees that floating point numbers are finite.
pub type Number = serde_json::Number;

/// CSV field contents that are read as null.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "N/A", "NA", "n/a", "NaN", "-NaN", "nan", "-nan", "NULL", "null", "None", "<NA>",
];

/// Naive date-time formats accepted for dates. These are interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date formats accepted for dates.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// A single scalar in a dataset.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer or finite floating point number
    Number(Number),
    /// Anything else
    String(String),
}

impl Value {
    /// Build a value from a raw CSV field.
    ///
    /// Empty fields and the usual NA markers become [Value::Null], boolean literals become
    /// [Value::Bool], integers and finite floats become [Value::Number] and everything else is
    /// kept as a string.
    pub fn from_csv_field(field: &str) -> Self {
        if NULL_TOKENS.contains(&field) {
            return Value::Null;
        }
        match field {
            "true" | "True" | "TRUE" => return Value::Bool(true),
            "false" | "False" | "FALSE" => return Value::Bool(false),
            _ => (),
        }
        let trimmed = field.trim();
        if let Ok(int) = trimmed.parse::<i64>() {
            return Value::Number(int.into());
        }
        if let Some(number) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
        Value::String(field.to_string())
    }

    /// Coerce the value to a float.
    ///
    /// Booleans count as 1 and 0 and strings are parsed after trimming whitespace. Returns `None`
    /// when the value is missing or cannot be read as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
        }
    }

    /// Coerce the value to a UTC timestamp.
    ///
    /// Only strings are considered. RFC 3339 timestamps are converted to UTC, naive date-times
    /// and plain dates are taken to be UTC already.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::String(s) => parse_timestamp(s.trim()),
            _ => None,
        }
    }

    /// Total ordering used when sorting output rows by a value.
    ///
    /// Booleans sort before numbers, numbers before strings, and nulls last.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => {
                let a = a.as_f64().unwrap_or(f64::NAN);
                let b = b.as_f64().unwrap_or(f64::NAN);
                a.total_cmp(&b)
            }
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Null => 3,
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<serde_json::Value> for Value {
    /// Convert a JSON record member. Arrays and objects are kept as their JSON text.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            other => Value::String(other.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats become [Value::Null].
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}
