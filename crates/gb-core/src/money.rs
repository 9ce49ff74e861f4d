//! Money amounts held as integer cents.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Largest accepted amount in whole currency units.
///
/// Keeps every intermediate product of the millesimi split inside `u128`
/// with room to spare, and rejects obviously corrupt input.
pub const MAX_UNITS: u64 = 1_000_000_000_000;

/// A non-negative amount of money in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(u64);

impl Cents {
    pub const ZERO: Self = Self(0);

    /// Creates an amount from a raw number of cents.
    #[must_use]
    pub const fn new(cents: u64) -> Self {
        Self(cents)
    }

    /// Converts a decimal amount (e.g. `12.5` for 12.50) to cents.
    ///
    /// Rounds half up to the nearest cent. Negative, non-finite and
    /// out-of-range values are rejected.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn from_units(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value < 0.0 || value > MAX_UNITS as f64 {
            return Err(ValidationError::InvalidAmount { value });
        }
        Ok(Self((value * 100.0).round() as u64))
    }

    /// Returns the raw number of cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Returns the amount as a floating point number of units.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_units(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Rounds half up to whole currency units.
    #[must_use]
    pub const fn round_to_units(self) -> u64 {
        (self.0 + 50) / 100
    }
}

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Cents {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Cents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.as_units().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::from_units(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_units_rounds_to_nearest_cent() {
        assert_eq!(Cents::from_units(12.5).unwrap(), Cents::new(1250));
        assert_eq!(Cents::from_units(0.004).unwrap(), Cents::ZERO);
        assert_eq!(Cents::from_units(0.005).unwrap(), Cents::new(1));
        assert_eq!(Cents::from_units(7.0).unwrap(), Cents::new(700));
    }

    #[test]
    fn from_units_rejects_invalid_values() {
        assert!(Cents::from_units(-0.01).is_err());
        assert!(Cents::from_units(f64::NAN).is_err());
        assert!(Cents::from_units(f64::INFINITY).is_err());
        assert!(Cents::from_units(2e12).is_err());
    }

    #[test]
    fn round_to_units_is_half_up() {
        assert_eq!(Cents::new(149).round_to_units(), 1);
        assert_eq!(Cents::new(150).round_to_units(), 2);
        assert_eq!(Cents::new(0).round_to_units(), 0);
        assert_eq!(Cents::new(49).round_to_units(), 0);
        assert_eq!(Cents::new(50).round_to_units(), 1);
    }

    #[test]
    fn display_pads_cents() {
        assert_eq!(Cents::new(1205).to_string(), "12.05");
        assert_eq!(Cents::new(7).to_string(), "0.07");
        assert_eq!(Cents::ZERO.to_string(), "0.00");
    }

    #[test]
    fn sums_amounts() {
        let total: Cents = [Cents::new(150), Cents::new(275)].iter().sum();
        assert_eq!(total, Cents::new(425));
    }

    #[test]
    fn serde_uses_decimal_units() {
        let json = serde_json::to_string(&Cents::new(1250)).unwrap();
        assert_eq!(json, "12.5");
        let parsed: Cents = serde_json::from_str("30").unwrap();
        assert_eq!(parsed, Cents::new(3000));
        assert!(serde_json::from_str::<Cents>("-1").is_err());
    }
}
