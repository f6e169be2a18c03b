//! Exact base-10 decimal used by `Value::get_decimal`.
//!
//! Stored as a digit string times a power of ten, so any literal `f64` or a
//! long integer accepts is representable without overflow. The digits are
//! kept without leading or trailing zeros, which makes `5.90` and `5.9` the
//! same value structurally.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Widest plain integer rendering; larger magnitudes print in `e` notation.
const PLAIN_INTEGER_DIGITS: i64 = 40;
/// Smallest leading-digit exponent still printed as a plain fraction.
const PLAIN_MIN_EXPONENT: i64 = -7;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    negative: bool,
    /// ASCII digits, no leading or trailing zeros; empty for zero.
    digits: String,
    exponent: i64,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal { negative: false, digits: String::new(), exponent: 0 };

    /// `mantissa * 10^-scale`.
    pub fn new(mantissa: i128, scale: u32) -> Self {
        Self::from_parts(mantissa < 0, &mantissa.unsigned_abs().to_string(), -(scale as i64))
    }

    fn from_parts(negative: bool, digits: &str, exponent: i64) -> Self {
        let digits = digits.trim_start_matches('0');
        let trimmed = digits.trim_end_matches('0');
        if trimmed.is_empty() {
            return Self::ZERO;
        }
        let shift = (digits.len() - trimmed.len()) as i64;
        Decimal {
            negative,
            digits: trimmed.to_owned(),
            exponent: exponent.saturating_add(shift),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Nearest `f64`; infinite when the magnitude is out of range.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    /// Build from an `f64` using its shortest round-trip representation.
    pub fn from_f64(v: f64) -> Option<Self> {
        if !v.is_finite() {
            return None;
        }
        format!("{v}").parse().ok()
    }

    /// Exponent of the leading digit in scientific notation.
    fn adjusted_exponent(&self) -> i64 {
        self.exponent.saturating_add(self.digits.len() as i64 - 1)
    }

    fn cmp_magnitude(&self, other: &Decimal) -> Ordering {
        self.adjusted_exponent()
            .cmp(&other.adjusted_exponent())
            .then_with(|| self.digits.as_bytes().cmp(other.digits.as_bytes()))
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Self { Decimal::new(v as i128, 0) }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let sign = |d: &Decimal| match (d.is_zero(), d.negative) {
            (true, _) => 0i8,
            (false, true) => -1,
            (false, false) => 1,
        };
        match sign(self).cmp(&sign(other)) {
            Ordering::Equal if self.negative => self.cmp_magnitude(other).reverse(),
            Ordering::Equal => self.cmp_magnitude(other),
            unequal => unequal,
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Error returned when text is not a plain decimal literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDecimalError(String);

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid decimal literal: {:?}", self.0)
    }
}

impl std::error::Error for ParseDecimalError {}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Accepts `[+-]digits[.digits][e[+-]digits]` of any length.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_owned());
        let t = s.trim();

        let (body, exp) = match t.find(['e', 'E']) {
            Some(i) => (&t[..i], t[i + 1..].parse::<i64>().map_err(|_| err())?),
            None => (t, 0),
        };

        let (negative, unsigned) = match body.as_bytes().first() {
            Some(b'-') => (true, &body[1..]),
            Some(b'+') => (false, &body[1..]),
            _ => (false, body),
        };

        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let exponent = exp.checked_sub(frac_part.len() as i64).ok_or_else(err)?;
        Ok(Decimal::from_parts(negative, &format!("{int_part}{frac_part}"), exponent))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let sign = if self.negative { "-" } else { "" };
        let digits = &self.digits;
        let len = digits.len() as i64;
        let adjusted = self.adjusted_exponent();

        if self.exponent == 0 || (self.exponent > 0 && adjusted < PLAIN_INTEGER_DIGITS) {
            return write!(f, "{sign}{digits}{}", "0".repeat(self.exponent as usize));
        }
        if self.exponent < 0 && adjusted >= PLAIN_MIN_EXPONENT {
            let int_len = len + self.exponent;
            return if int_len > 0 {
                let (i, frac) = digits.split_at(int_len as usize);
                write!(f, "{sign}{i}.{frac}")
            } else {
                write!(f, "{sign}0.{}{digits}", "0".repeat((-int_len) as usize))
            };
        }
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            write!(f, "{sign}{lead}e{adjusted}")
        } else {
            write!(f, "{sign}{lead}.{rest}e{adjusted}")
        }
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
