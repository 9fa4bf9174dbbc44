//! SQL value type shared by the dialect layer and the queriers
//!
//! Values travel alongside SQL text carrying neutral `?` markers. The dialect
//! never inlines them; drivers bind them positionally.

use crate::models::field::FieldType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Generic SQL value for parameter binding and single-row results
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    /// NULL headed for a column of known kind, so strictly typed drivers
    /// can declare the parameter type
    TypedNull(FieldType),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Bytes(Vec<u8>),
    Json(JsonValue),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null | SqlValue::TypedNull(_))
    }

    /// Attach the column kind to a bare NULL; other values pass through
    pub fn typed_for(self, kind: FieldType) -> Self {
        match self {
            SqlValue::Null => SqlValue::TypedNull(kind),
            other => other,
        }
    }

    /// True for NULL and numeric zero, the values an auto field carries
    /// when the database is expected to generate the key
    pub fn is_unset_key(&self) -> bool {
        match self {
            SqlValue::Null | SqlValue::TypedNull(_) => true,
            SqlValue::Int(i) => *i == 0,
            SqlValue::UInt(u) => *u == 0,
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::Int(i) => Some(*i != 0),
            SqlValue::UInt(u) => Some(*u != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            SqlValue::UInt(u) => i64::try_from(*u).ok(),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            SqlValue::Double(f) if f.fract() == 0.0 => Some(*f as i64),
            SqlValue::Decimal(d) => d.to_string().parse().ok(),
            SqlValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Textual form used when a value is spliced into a LIKE pattern
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Null | SqlValue::TypedNull(_) | SqlValue::Bytes(_) => None,
            SqlValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null | SqlValue::TypedNull(_) => JsonValue::Null,
            SqlValue::Bool(b) => JsonValue::Bool(*b),
            SqlValue::Int(i) => JsonValue::from(*i),
            SqlValue::UInt(u) => JsonValue::from(*u),
            SqlValue::Double(f) => JsonValue::from(*f),
            SqlValue::Decimal(d) => JsonValue::String(d.to_string()),
            SqlValue::String(s) => JsonValue::String(s.clone()),
            SqlValue::Bytes(b) => JsonValue::Array(b.iter().map(|x| JsonValue::from(*x)).collect()),
            SqlValue::Json(j) => j.clone(),
            SqlValue::Date(d) => JsonValue::String(d.to_string()),
            SqlValue::DateTime(dt) => JsonValue::String(dt.to_string()),
            SqlValue::Timestamp(ts) => JsonValue::String(ts.to_rfc3339()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null | SqlValue::TypedNull(_) => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::UInt(u) => write!(f, "{}", u),
            SqlValue::Double(v) => write!(f, "{}", v),
            SqlValue::Decimal(d) => write!(f, "{}", d),
            SqlValue::String(s) => write!(f, "{}", s),
            SqlValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            SqlValue::Json(j) => write!(f, "{}", j),
            SqlValue::Date(d) => write!(f, "{}", d),
            SqlValue::DateTime(dt) => write!(f, "{}", dt),
            SqlValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::UInt(u64::from(v))
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::UInt(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Double(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::String(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::String(s.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(s: &String) -> Self {
        SqlValue::String(s.clone())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(v: JsonValue) -> Self {
        SqlValue::Json(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => SqlValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_key_detection() {
        assert!(SqlValue::Null.is_unset_key());
        assert!(SqlValue::Int(0).is_unset_key());
        assert!(SqlValue::UInt(0).is_unset_key());
        assert!(!SqlValue::Int(42).is_unset_key());
        assert!(!SqlValue::from("0").is_unset_key());
    }

    #[test]
    fn test_as_i64_conversions() {
        assert_eq!(SqlValue::Int(7).as_i64(), Some(7));
        assert_eq!(SqlValue::UInt(u64::MAX).as_i64(), None);
        assert_eq!(SqlValue::from(" 12 ").as_i64(), Some(12));
        assert_eq!(SqlValue::Double(3.0).as_i64(), Some(3));
        assert_eq!(SqlValue::Double(3.5).as_i64(), None);
    }

    #[test]
    fn test_text_for_patterns() {
        assert_eq!(SqlValue::from("abc").as_text().as_deref(), Some("abc"));
        assert_eq!(SqlValue::Int(5).as_text().as_deref(), Some("5"));
        assert_eq!(SqlValue::Null.as_text(), None);
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<i64> = None;
        assert!(SqlValue::from(none).is_null());
        assert_eq!(SqlValue::from(Some(3i64)), SqlValue::Int(3));
    }

    #[test]
    fn test_typed_null_stays_null() {
        let typed = SqlValue::Null.typed_for(FieldType::Integer);
        assert_eq!(typed, SqlValue::TypedNull(FieldType::Integer));
        assert!(typed.is_null());
        assert!(typed.is_unset_key());
        assert_eq!(typed.to_json(), JsonValue::Null);
        assert_eq!(typed.to_string(), "NULL");

        // Non-null values are untouched
        assert_eq!(SqlValue::Int(4).typed_for(FieldType::Integer), SqlValue::Int(4));
    }
}
