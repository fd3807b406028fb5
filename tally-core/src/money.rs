//! Exact currency amounts
//!
//! Amounts are stored as signed integer cents; the external form is a
//! dollar string with thousands separators, two decimal digits, and
//! parenthesized negatives, e.g. `($1,234.56)`. Conversion is exact in
//! both directions (no floating point anywhere).

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Signed amount in integer cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(pub i64);

impl Cents {
    /// Zero amount
    pub const ZERO: Cents = Cents(0);

    /// Raw cents
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// True if exactly zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition for aggregation loops
    pub fn checked_add(self, other: Cents) -> Option<Cents> {
        self.0.checked_add(other.0).map(Cents)
    }

    /// Checked subtraction for derived totals
    pub fn checked_sub(self, other: Cents) -> Option<Cents> {
        self.0.checked_sub(other.0).map(Cents)
    }

    /// Parse the external dollar form, e.g. `$1,234.56` or `($0.99)`
    pub fn parse(s: &str) -> Result<Cents> {
        let bad = || Error::Validation(format!("invalid currency amount {:?}", s));

        let s = s.trim();
        let (body, negative) = if let Some(inner) =
            s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')'))
        {
            (inner, true)
        } else {
            (s, false)
        };

        let body = body.strip_prefix('$').ok_or_else(bad)?;
        let (dollars_part, cents_part) = body.split_once('.').ok_or_else(bad)?;

        if cents_part.len() != 2 || !cents_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let digits: String = dollars_part.chars().filter(|&c| c != ',').collect();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }

        let dollars: i64 = digits.parse().map_err(|_| bad())?;
        let cents: i64 = cents_part.parse().map_err(|_| bad())?;
        let total = dollars
            .checked_mul(100)
            .and_then(|d| d.checked_add(cents))
            .ok_or_else(bad)?;

        Ok(Cents(if negative { -total } else { total }))
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let dollars = magnitude / 100;
        let cents = magnitude % 100;

        // Insert thousands separators into the dollar digits
        let digits = dollars.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        if self.0 < 0 {
            write!(f, "(${}.{:02})", grouped, cents)
        } else {
            write!(f, "${}.{:02}", grouped, cents)
        }
    }
}

impl Add for Cents {
    type Output = Cents;
    fn add(self, other: Cents) -> Cents {
        Cents(self.0 + other.0)
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, other: Cents) {
        self.0 += other.0;
    }
}

impl Sub for Cents {
    type Output = Cents;
    fn sub(self, other: Cents) -> Cents {
        Cents(self.0 - other.0)
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, other: Cents) {
        self.0 -= other.0;
    }
}

impl Neg for Cents {
    type Output = Cents;
    fn neg(self) -> Cents {
        Cents(-self.0)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        Cents(iter.map(|c| c.0).sum())
    }
}

impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Cents::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_positive() {
        assert_eq!(Cents(0).to_string(), "$0.00");
        assert_eq!(Cents(5).to_string(), "$0.05");
        assert_eq!(Cents(123_456).to_string(), "$1,234.56");
        assert_eq!(Cents(100_000_000).to_string(), "$1,000,000.00");
    }

    #[test]
    fn test_format_negative_uses_parens() {
        assert_eq!(Cents(-123_456).to_string(), "($1,234.56)");
        assert_eq!(Cents(-1).to_string(), "($0.01)");
    }

    #[test]
    fn test_parse_round_trip() {
        for cents in [0i64, 5, -5, 99, 100, -123_456, 987_654_321] {
            let amount = Cents(cents);
            assert_eq!(Cents::parse(&amount.to_string()).unwrap(), amount);
        }
    }

    #[test]
    fn test_parse_without_separators() {
        assert_eq!(Cents::parse("$1234.56").unwrap(), Cents(123_456));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Cents::parse("1234.56").is_err()); // no dollar sign
        assert!(Cents::parse("$1234").is_err()); // no decimals
        assert!(Cents::parse("$12.345").is_err()); // three decimals
        assert!(Cents::parse("$12.3").is_err());
        assert!(Cents::parse("($12.00").is_err()); // unbalanced paren
        assert!(Cents::parse("$1x.00").is_err());
        assert!(Cents::parse("$.50").is_err());
    }

    #[test]
    fn test_serde_uses_display_form() {
        let json = serde_json::to_string(&Cents(-250)).unwrap();
        assert_eq!(json, "\"($2.50)\"");
        let back: Cents = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Cents(-250));
    }
}
