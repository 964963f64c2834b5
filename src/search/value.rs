//! Scalar values used as search terms, term-filter values and range bounds

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// A comparable scalar
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// False only for NaN or infinite floats, which have no JSON form
    pub fn is_finite(&self) -> bool {
        match self {
            FieldValue::Float(f) => f.is_finite(),
            _ => true,
        }
    }

    /// JSON form sent to the engine
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }

    /// Compare against a value found in a stored document.
    ///
    /// Returns `None` when the two are not comparable (e.g. text against a number).
    pub(crate) fn compare_json(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Integer(a), Value::Number(b)) => (*a as f64).partial_cmp(&b.as_f64()?),
            (FieldValue::Float(a), Value::Number(b)) => a.partial_cmp(&b.as_f64()?),
            (FieldValue::Boolean(a), Value::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), Value::String(b)) => Some(a.cmp(&parse_date(b)?)),
            (FieldValue::Text(a), Value::String(b)) => match (parse_date(a), parse_date(b)) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => Some(a.as_str().cmp(b.as_str())),
            },
            _ => None,
        }
    }

    /// Exact (unanalyzed) equality against a stored value
    pub(crate) fn matches_json(&self, other: &Value) -> bool {
        self.compare_json(other) == Some(Ordering::Equal)
    }
}

/// RFC 3339, or a date / date-time without offset read as UTC (`2024-03-01`
/// is midnight)
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(raw) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Text(value.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Date(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_to_json() {
        assert_eq!(FieldValue::from("rust").to_json(), json!("rust"));
        assert_eq!(FieldValue::from(42).to_json(), json!(42));
        assert_eq!(FieldValue::from(true).to_json(), json!(true));
        assert_eq!(FieldValue::Float(f64::NAN).to_json(), Value::Null);

        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(FieldValue::from(date).to_json(), json!("2024-03-01T12:00:00Z"));
    }

    #[test]
    fn test_date_comparison_across_offsets() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let value = FieldValue::from(date);

        assert_eq!(
            value.compare_json(&json!("2024-03-01T13:00:00+01:00")),
            Some(Ordering::Equal)
        );
        assert_eq!(
            value.compare_json(&json!("2024-03-02T00:00:00Z")),
            Some(Ordering::Less)
        );
        assert_eq!(value.compare_json(&json!("not a date")), None);
    }

    #[test]
    fn test_text_dates_compare_chronologically() {
        let value = FieldValue::from("2024-03-01T12:00:00Z");
        assert_eq!(
            value.compare_json(&json!("2024-03-01T11:00:00-02:00")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_date_only_text_is_midnight_utc() {
        let value = FieldValue::from("2024-03-01");
        assert_eq!(
            value.compare_json(&json!("2024-03-01T00:00:00Z")),
            Some(Ordering::Equal)
        );
        assert_eq!(
            value.compare_json(&json!("2024-03-01T09:30:00")),
            Some(Ordering::Less)
        );
        assert_eq!(
            FieldValue::from("2024-02-29T23:59:59").compare_json(&json!("2024-03-01")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_mismatched_types_never_match() {
        assert!(!FieldValue::from("1").matches_json(&json!(1)));
        assert!(FieldValue::from(1).matches_json(&json!(1.0)));
    }
}
