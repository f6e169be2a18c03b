//! Typed property value with JCR-style coercion.
//!
//! Every `Value` keeps its raw source (text, timestamp, binary or nothing)
//! plus a `PropertyType` tag. Accessors coerce on demand; an incompatible
//! request fails with `Error::ValueFormat` at the accessor, never at
//! construction time.
//!
//! | Source      | string | long/double/decimal  | boolean   | date              | binary |
//! |-------------|--------|----------------------|-----------|-------------------|--------|
//! | text        | as is  | if numeric           | `"true"`  | numeric or parsed | utf-8  |
//! | timestamp   | ISO    | epoch millis         | error     | as is             | error  |
//! | binary      | lossy  | error                | error     | error             | as is  |
//! | null        | `None` | zero                 | `false`   | `None`            | `None` |
//!
//! Booleans, numbers and references are stored as text and go through the
//! text path.

use std::fmt;
use std::io::Cursor;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{Decimal, Node};
use crate::{Error, Result};

// ============================================================================
// PropertyType
// ============================================================================

/// Type tag of a value or property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PropertyType {
    #[default]
    Undefined,
    String,
    Binary,
    Long,
    Double,
    Decimal,
    Date,
    Boolean,
    Reference,
}

impl PropertyType {
    /// JCR type name (`"String"`, `"Long"`, ..., `"undefined"`).
    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::Undefined => "undefined",
            PropertyType::String => "String",
            PropertyType::Binary => "Binary",
            PropertyType::Long => "Long",
            PropertyType::Double => "Double",
            PropertyType::Decimal => "Decimal",
            PropertyType::Date => "Date",
            PropertyType::Boolean => "Boolean",
            PropertyType::Reference => "Reference",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Binary
// ============================================================================

/// Immutable byte content of a binary value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Binary(Vec<u8>);

impl Binary {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn size(&self) -> usize { self.0.len() }
    pub fn as_bytes(&self) -> &[u8] { &self.0 }

    /// Fresh reader over the content; each call starts at offset 0.
    pub fn stream(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.0.clone())
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

// ============================================================================
// Value
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Source {
    Null,
    Text(String),
    Date(DateTime<FixedOffset>),
    Binary(Binary),
}

/// Immutable typed scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    source: Source,
    kind: PropertyType,
}

impl Value {
    /// The "no value" value.
    pub fn null() -> Self {
        Self { source: Source::Null, kind: PropertyType::Undefined }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self { source: Source::Text(s.into()), kind: PropertyType::String }
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self { source: Source::Binary(Binary::new(bytes)), kind: PropertyType::Binary }
    }

    pub fn date<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        Self { source: Source::Date(dt.fixed_offset()), kind: PropertyType::Date }
    }

    /// Reference to `node`, stored as its identifier at the time of the call.
    pub fn reference(node: &Node) -> Self {
        Self { source: Source::Text(node.identifier()), kind: PropertyType::Reference }
    }

    /// Re-tag the value. Coercion still follows the raw source.
    pub fn with_type(mut self, kind: PropertyType) -> Self {
        self.kind = kind;
        self
    }

    pub fn property_type(&self) -> PropertyType { self.kind }
    pub fn type_name(&self) -> &'static str { self.kind.name() }
    pub fn is_null(&self) -> bool { matches!(self.source, Source::Null) }

    fn format_error(&self, expected: &str) -> Error {
        Error::ValueFormat {
            expected: expected.into(),
            got: match &self.source {
                Source::Text(s) => format!("{} {s:?}", self.kind),
                _ => self.kind.to_string(),
            },
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Text form. `None` only for the null value.
    pub fn get_string(&self) -> Option<String> {
        match &self.source {
            Source::Null => None,
            Source::Text(s) => Some(s.clone()),
            Source::Date(dt) => Some(format_date(dt)),
            Source::Binary(b) => Some(b.to_string()),
        }
    }

    /// Integer form; numeric text is rounded half up (`-2.5` → `-2`) and
    /// saturates at the `i64` bounds.
    pub fn get_long(&self) -> Result<i64> {
        match &self.source {
            Source::Null => Ok(0),
            Source::Text(s) => parse_number(s)
                .map(round_half_up)
                .ok_or_else(|| self.format_error("Long")),
            Source::Date(dt) => Ok(dt.timestamp_millis()),
            Source::Binary(_) => Err(self.format_error("Long")),
        }
    }

    pub fn get_double(&self) -> Result<f64> {
        match &self.source {
            Source::Null => Ok(0.0),
            Source::Text(s) => parse_number(s).ok_or_else(|| self.format_error("Double")),
            Source::Date(dt) => Ok(dt.timestamp_millis() as f64),
            Source::Binary(_) => Err(self.format_error("Double")),
        }
    }

    pub fn get_decimal(&self) -> Result<Decimal> {
        match &self.source {
            Source::Null => Ok(Decimal::ZERO),
            Source::Text(s) => s.trim().parse().map_err(|_| self.format_error("Decimal")),
            Source::Date(dt) => Ok(Decimal::from(dt.timestamp_millis())),
            Source::Binary(_) => Err(self.format_error("Decimal")),
        }
    }

    /// Boolean literal parse: anything other than `true` (any case) is `false`.
    pub fn get_boolean(&self) -> Result<bool> {
        match &self.source {
            Source::Null => Ok(false),
            Source::Text(s) => Ok(s.trim().eq_ignore_ascii_case("true")),
            Source::Date(_) | Source::Binary(_) => Err(self.format_error("Boolean")),
        }
    }

    /// Timestamp form. Numeric text is read as epoch milliseconds and wins
    /// over a textual date parse.
    pub fn get_date(&self) -> Result<Option<DateTime<FixedOffset>>> {
        match &self.source {
            Source::Null => Ok(None),
            Source::Text(s) => {
                if let Some(n) = parse_number(s) {
                    return Utc
                        .timestamp_millis_opt(round_half_up(n))
                        .single()
                        .map(|dt| Some(dt.fixed_offset()))
                        .ok_or_else(|| self.format_error("Date"));
                }
                parse_date(s).map(Some).ok_or_else(|| self.format_error("Date"))
            }
            Source::Date(dt) => Ok(Some(*dt)),
            Source::Binary(_) => Err(self.format_error("Date")),
        }
    }

    pub fn get_binary(&self) -> Result<Option<Binary>> {
        match &self.source {
            Source::Null => Ok(None),
            Source::Text(s) => Ok(Some(Binary::new(s.as_bytes()))),
            Source::Binary(b) => Ok(Some(b.clone())),
            Source::Date(_) => Err(self.format_error("Binary")),
        }
    }

    pub fn get_stream(&self) -> Result<Option<Cursor<Vec<u8>>>> {
        Ok(self.get_binary()?.map(|b| b.stream()))
    }
}

/// Numeric text → f64. Any finite float literal counts; `NaN`/`inf` do not.
fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn round_half_up(n: f64) -> i64 {
    (n + 0.5).floor() as i64
}

/// ISO-8601 timestamps: full RFC 3339, offset-less date-times (UTC) and plain dates.
pub(crate) fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let t = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().fixed_offset())
}

/// Canonical text form of a timestamp, e.g. `2024-03-01T10:00:00.000Z`.
pub fn format_date(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<&str> for Value { fn from(v: &str) -> Self { Value::string(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::string(v) } }
impl From<&String> for Value { fn from(v: &String) -> Self { Value::string(v.as_str()) } }
impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::string(v.to_string()).with_type(PropertyType::Boolean) }
}
impl From<i32> for Value { fn from(v: i32) -> Self { Value::from(v as i64) } }
impl From<i64> for Value {
    fn from(v: i64) -> Self { Value::string(v.to_string()).with_type(PropertyType::Long) }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::string(v.to_string()).with_type(PropertyType::Double) }
}
impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self { Value::string(v.to_string()).with_type(PropertyType::Decimal) }
}
impl From<DateTime<Utc>> for Value { fn from(v: DateTime<Utc>) -> Self { Value::date(v) } }
impl From<DateTime<FixedOffset>> for Value { fn from(v: DateTime<FixedOffset>) -> Self { Value::date(v) } }
impl From<Binary> for Value {
    fn from(v: Binary) -> Self { Self { source: Source::Binary(v), kind: PropertyType::Binary } }
}
impl From<&Node> for Value { fn from(v: &Node) -> Self { Value::reference(v) } }
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or_else(Value::null) }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get_string() {
            Some(s) => f.write_str(&s),
            None => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn assert_format_error<T: fmt::Debug>(r: Result<T>) {
        assert!(matches!(r, Err(Error::ValueFormat { .. })), "expected ValueFormat, got {r:?}");
    }

    #[test]
    fn test_numeric_text() {
        let v = Value::from("5.9");
        assert_eq!(v.get_string().as_deref(), Some("5.9"));
        assert_eq!(v.get_long().unwrap(), 6);
        assert_eq!(v.get_double().unwrap(), 5.9);
        assert_eq!(v.get_decimal().unwrap(), "5.9".parse::<Decimal>().unwrap());
        assert!(!v.get_boolean().unwrap());
    }

    #[test]
    fn test_non_numeric_text() {
        let v = Value::from("abc");
        assert_eq!(v.get_string().as_deref(), Some("abc"));
        assert_format_error(v.get_long());
        assert_format_error(v.get_double());
        assert_format_error(v.get_decimal());
        assert_format_error(v.get_date());
        assert!(!v.get_boolean().unwrap());
    }

    #[test]
    fn test_special_floats_are_not_numeric() {
        assert_format_error(Value::from("NaN").get_double());
        assert_format_error(Value::from("inf").get_long());
    }

    #[test]
    fn test_boolean_goes_through_text() {
        let v = Value::from(true);
        assert_eq!(v.property_type(), PropertyType::Boolean);
        assert_eq!(v.get_string().as_deref(), Some("true"));
        assert!(v.get_boolean().unwrap());
        assert_format_error(v.get_long());
        assert!(Value::from("TRUE").get_boolean().unwrap());
    }

    #[test]
    fn test_text_date_parse() {
        let v = Value::from("2024-03-01T10:00:00.000+01:00");
        let dt = v.get_date().unwrap().unwrap();
        assert_eq!(dt.timestamp_millis(), 1_709_283_600_000);

        let d = Value::from("2024-03-01").get_date().unwrap().unwrap();
        assert_eq!(format_date(&d), "2024-03-01T00:00:00.000Z");
    }

    #[test]
    fn test_numeric_text_date_uses_millis() {
        let v = Value::from("1000.4");
        let dt = v.get_date().unwrap().unwrap();
        assert_eq!(dt.timestamp_millis(), 1000);
    }

    #[test]
    fn test_timestamp_input() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let v = Value::from(dt);
        assert_eq!(v.get_string().as_deref(), Some("2024-03-01T10:00:00.000Z"));
        assert_eq!(v.get_long().unwrap(), dt.timestamp_millis());
        assert_eq!(v.get_double().unwrap(), dt.timestamp_millis() as f64);
        assert_eq!(v.get_decimal().unwrap(), Decimal::from(dt.timestamp_millis()));
        assert_eq!(v.get_date().unwrap().unwrap(), dt.fixed_offset());
        assert_format_error(v.get_boolean());
        assert_format_error(v.get_binary());
    }

    #[test]
    fn test_binary_input() {
        let v = Value::binary(b"hello".to_vec());
        assert_eq!(v.get_string().as_deref(), Some("hello"));
        assert_eq!(v.get_binary().unwrap().unwrap().size(), 5);

        let mut out = String::new();
        v.get_stream().unwrap().unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");

        assert_format_error(v.get_long());
        assert_format_error(v.get_double());
        assert_format_error(v.get_decimal());
        assert_format_error(v.get_date());
        assert_format_error(v.get_boolean());
    }

    #[test]
    fn test_null_defaults() {
        let v = Value::null();
        assert!(v.is_null());
        assert_eq!(v.get_string(), None);
        assert_eq!(v.get_long().unwrap(), 0);
        assert_eq!(v.get_double().unwrap(), 0.0);
        assert_eq!(v.get_decimal().unwrap(), Decimal::ZERO);
        assert!(!v.get_boolean().unwrap());
        assert_eq!(v.get_date().unwrap(), None);
        assert_eq!(v.get_binary().unwrap(), None);
        assert_eq!(Value::from(None::<&str>), Value::null());
    }

    #[test]
    fn test_rounding_is_half_up() {
        assert_eq!(Value::from("-2.5").get_long().unwrap(), -2);
        assert_eq!(Value::from("2.5").get_long().unwrap(), 3);
        assert_eq!(Value::from("-2.6").get_long().unwrap(), -3);
        assert_eq!(Value::from("-0.4").get_long().unwrap(), 0);
    }

    #[test]
    fn test_extreme_numbers_stay_numeric() {
        for v in [1e-30f64, 1e300, f64::MAX, f64::MIN_POSITIVE, -f64::MAX] {
            let value = Value::from(v);
            assert_eq!(value.get_double().unwrap(), v, "{v:e}");
            assert_eq!(value.get_decimal().unwrap(), Decimal::from_f64(v).unwrap());
        }
        assert_eq!(Value::from(f64::MAX).get_long().unwrap(), i64::MAX);
        assert_eq!(Value::from(1e-30f64).get_long().unwrap(), 0);
        assert_format_error(Value::from(f64::MAX).get_date());

        let exp = Value::from("1e-30");
        assert_eq!(exp.get_double().unwrap(), 1e-30);
        assert_eq!(exp.get_decimal().unwrap().to_string(), "1e-30");

        let wide = Value::from("0.12345678901234567890123456789");
        assert!(wide.get_double().is_ok());
        assert_eq!(wide.get_decimal().unwrap().to_string(), "0.12345678901234567890123456789");

        let huge = "9".repeat(45);
        assert_eq!(Value::from(huge.as_str()).get_long().unwrap(), i64::MAX);
        assert_eq!(Value::from(huge.as_str()).get_decimal().unwrap().to_string(), huge);
    }

    #[test]
    fn test_numbers_via_text() {
        let v = Value::from(42i64);
        assert_eq!(v.property_type(), PropertyType::Long);
        assert_eq!(v.get_string().as_deref(), Some("42"));
        assert_eq!(v.get_double().unwrap(), 42.0);

        let d = Value::from(2.5f64);
        assert_eq!(d.get_long().unwrap(), 3);
        assert_eq!(d.type_name(), "Double");
    }
}
