//! End-to-end tests for value coercion through properties.

use chrono::{TimeZone, Utc};
use jcr_mock::mock::{mock_node, mock_value, stub_property, stub_property_values};
use jcr_mock::{context, Decimal, Error, PropertyType, Value};
use pretty_assertions::assert_eq;

fn is_format_error<T>(r: jcr_mock::Result<T>) -> bool {
    matches!(r, Err(Error::ValueFormat { .. }))
}

#[test]
fn test_mock_value_numeric_text() {
    let v = mock_value("5.9");
    assert_eq!(v.get_string().as_deref(), Some("5.9"));
    assert_eq!(v.get_long().unwrap(), 6);
    assert_eq!(v.get_double().unwrap(), 5.9);
    assert_eq!(v.get_decimal().unwrap(), "5.9".parse::<Decimal>().unwrap());
}

#[test]
fn test_mock_value_plain_text() {
    let v = mock_value("abc");
    assert_eq!(v.get_string().as_deref(), Some("abc"));
    assert!(is_format_error(v.get_long()));
    assert!(is_format_error(v.get_double()));
    assert!(is_format_error(v.get_decimal()));
    assert!(is_format_error(v.get_date()));
    assert!(!v.get_boolean().unwrap());
}

#[test]
fn test_mock_value_extreme_magnitudes() {
    for text in ["1e-30", "1.5E+300", "-2.5e-7", "0.000000000000000000000000000001"] {
        let v = mock_value(text);
        let expected: f64 = text.parse().unwrap();
        assert_eq!(v.get_double().unwrap(), expected, "{text}");
        assert_eq!(v.get_decimal().unwrap(), text.parse::<Decimal>().unwrap(), "{text}");
    }

    let max = mock_value(f64::MAX);
    assert_eq!(max.property_type(), PropertyType::Double);
    assert_eq!(max.get_double().unwrap(), f64::MAX);
    assert_eq!(max.get_long().unwrap(), i64::MAX);
    assert_eq!(max.get_decimal().unwrap().to_f64(), f64::MAX);

    let long_digits = format!("{}.{}", "7".repeat(40), "3".repeat(35));
    let v = mock_value(long_digits.as_str());
    assert!(v.get_double().unwrap() > 7e39);
    assert_eq!(v.get_decimal().unwrap().to_string(), long_digits);
}

#[test]
fn test_mock_value_rounds_half_up() {
    assert_eq!(mock_value("-2.5").get_long().unwrap(), -2);
    assert_eq!(mock_value("2.5").get_long().unwrap(), 3);
    assert_eq!(mock_value(-0.5f64).get_long().unwrap(), 0);
}

#[test]
fn test_property_round_trip_and_types() {
    context::reset();
    let when = Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap();
    let n = mock_node(
        "typed",
        &[
            &stub_property("text", "v"),
            &stub_property("flag", true),
            &stub_property("count", 42i64),
            &stub_property("ratio", 0.25f64),
            &stub_property("when", when),
            &stub_property("blob", Value::binary(vec![0u8, 1, 2])),
            &stub_property_values("multi", ["1", "2", "3"]),
        ],
    )
    .unwrap();

    let get = |name: &str| n.get_property(name).unwrap();
    assert_eq!(get("text").get_string().as_deref(), Some("v"));
    assert_eq!(get("flag").property_type(), PropertyType::Boolean);
    assert!(get("flag").get_boolean().unwrap());
    assert_eq!(get("count").get_double().unwrap(), 42.0);
    assert_eq!(get("ratio").get_string().as_deref(), Some("0.25"));
    assert_eq!(get("when").get_long().unwrap(), when.timestamp_millis());
    assert_eq!(get("when").get_string().as_deref(), Some("2025-01-15T08:30:00.000Z"));
    assert!(is_format_error(get("when").get_boolean()));
    assert_eq!(get("blob").get_binary().unwrap().unwrap().as_bytes(), &[0, 1, 2]);
    assert!(is_format_error(get("blob").get_long()));

    let multi = get("multi");
    assert!(multi.is_multiple());
    assert_eq!(
        multi.get_values().iter().map(|v| v.get_long().unwrap()).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(multi.get_value().get_string().as_deref(), Some("1"));
    context::reset();
}

#[test]
fn test_missing_value_defaults() {
    context::reset();
    let n = mock_node("empty", &[&stub_property_values("none", Vec::<Value>::new())]).unwrap();
    let p = n.get_property("none").unwrap();
    assert!(p.get_values().is_empty());
    assert!(!p.is_multiple());
    assert_eq!(p.get_string(), None);
    assert_eq!(p.get_long().unwrap(), 0);
    assert!(!p.get_boolean().unwrap());
    assert_eq!(p.get_date().unwrap(), None);
    context::reset();
}

#[test]
fn test_numeric_text_date_wins_over_textual_parse() {
    let v = mock_value("20240301");
    assert_eq!(v.get_date().unwrap().unwrap().timestamp_millis(), 20_240_301);
}
