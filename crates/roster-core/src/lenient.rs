//! Forgiving conversions from loosely-typed JSON.
//!
//! Stored documents and form input may carry numbers as strings, floats
//! where integers are expected, or empty strings for "not given". These
//! helpers coerce instead of failing.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

/// Deserialise an optional field, treating `null`, a missing value and an
/// empty (or all-whitespace) string alike as `None`.
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: FromStr,
  T::Err: fmt::Display,
{
  let raw = Option::<String>::deserialize(deserializer)?;
  match raw.as_deref().map(str::trim) {
    None | Some("") => Ok(None),
    Some(s) => s.parse().map(Some).map_err(de::Error::custom),
  }
}

/// Non-empty trimmed text, or `None`. Numbers are rendered as text.
pub(crate) fn text(v: Option<&Value>) -> Option<String> {
  let s = match v? {
    Value::String(s) => s.trim().to_owned(),
    Value::Number(n) => n.to_string(),
    Value::Bool(b) => b.to_string(),
    _ => return None,
  };
  (!s.is_empty()).then_some(s)
}

/// A finite number from a JSON number or a numeric string.
pub(crate) fn number(v: Option<&Value>) -> Option<f64> {
  let n = match v? {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  n.is_finite().then_some(n)
}

/// A non-negative whole amount; fractional parts are dropped.
pub(crate) fn amount(v: Option<&Value>) -> Option<u64> {
  number(v).filter(|n| *n >= 0.0).map(|n| n.floor() as u64)
}

/// An integer, only when the value has no fractional part.
pub(crate) fn integer(v: Option<&Value>) -> Option<i64> {
  number(v).filter(|n| n.fract() == 0.0).map(|n| n as i64)
}

pub(crate) fn boolean(v: Option<&Value>) -> Option<bool> {
  match v? {
    Value::Bool(b) => Some(*b),
    Value::String(s) => match s.trim() {
      "true" => Some(true),
      "false" => Some(false),
      _ => None,
    },
    _ => None,
  }
}

/// A calendar date from `YYYY-MM-DD`, also accepting a full RFC 3339
/// timestamp (its date part is taken).
pub(crate) fn date(v: Option<&Value>) -> Option<NaiveDate> {
  let s = text(v)?;
  let head = s.get(..10).unwrap_or(s.as_str());
  NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

pub(crate) fn timestamp(v: Option<&Value>) -> Option<DateTime<Utc>> {
  let s = text(v)?;
  DateTime::parse_from_rfc3339(&s)
    .ok()
    .map(|dt| dt.with_timezone(&Utc))
}
