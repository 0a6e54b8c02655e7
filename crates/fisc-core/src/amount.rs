//! # Decimal Newtypes
//!
//! [`Amount`] (money) and [`Rate`] (a percentage component such as `23.48`)
//! wrap `rust_decimal::Decimal` so that no monetary value is ever represented
//! as binary floating point.
//!
//! Both serialize as **normalized decimal strings** (`"1500000"`, never
//! `"1500000.00"` and never a JSON number). This keeps canonical bytes free of
//! floats and makes equal values fingerprint identically.
//!
//! Deserialization accepts strings, integers, and JSON numbers with a
//! fractional part. The latter are read through their shortest round-trip
//! text form, so `23.48` becomes exactly `23.48`.

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(
    #[serde(serialize_with = "serialize_decimal", deserialize_with = "deserialize_decimal")]
    Decimal,
);

impl Amount {
    /// Zero.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Wrap a decimal value.
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// The wrapped decimal.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// True if strictly below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// True if the magnitude is at most [`MAX_SUPPORTED_MAGNITUDE`], which
    /// leaves headroom for rate multiplication without decimal overflow.
    pub fn is_within_supported_range(&self) -> bool {
        self.0.abs() <= Decimal::from(MAX_SUPPORTED_MAGNITUDE)
    }
}

/// Largest absolute monetary value accepted by rule validation (10^15).
pub const MAX_SUPPORTED_MAGNITUDE: i64 = 1_000_000_000_000_000;

/// A rate component expressed in percent (`23.48` means 23.48 %).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(
    #[serde(serialize_with = "serialize_decimal", deserialize_with = "deserialize_decimal")]
    Decimal,
);

impl Rate {
    /// Wrap a percentage value.
    pub fn percent(value: Decimal) -> Self {
        Self(value)
    }

    /// The percentage value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// True if strictly below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Decimal> for Rate {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

impl FromStr for Rate {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

fn serialize_decimal<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.normalize().to_string())
}

fn deserialize_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    deserializer.deserialize_any(DecimalVisitor)
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        Decimal::from_str(v.trim()).map_err(|e| E::custom(format!("invalid decimal {v:?}: {e}")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        if !v.is_finite() {
            return Err(E::custom(format!("non-finite number {v}")));
        }
        // f64 Display yields the shortest text that round-trips.
        self.visit_str(&v.to_string())
    }
}
