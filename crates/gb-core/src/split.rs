//! Millesimi cost splitting.
//!
//! Divides a total among the condominium's units in proportion to their
//! millesimi, rounding every part to whole currency units so that the parts
//! add up exactly to the rounded total.
//!
//! # Algorithm Summary
//!
//! 1. Each share's exact part is `total * weight / W`, where `W` is the
//!    configured total weight (1000 millesimi)
//! 2. Every part is rounded half up on its own, as is the total
//! 3. Whatever the independent roundings gained or lost is added in one piece
//!    to the share with the largest rounded part (earliest share on ties)
//!
//! Amounts are handled as scaled integers (cents for stored money, millionths
//! for decimal input) and weights as integer thousandths, so results do not
//! depend on floating point summation order. The rounded total always comes
//! from the amount as given, never from an already rounded copy of it.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::{Cents, MAX_UNITS};
use crate::types::{ShareLabel, ValidationError};

/// Total weight of a complete share table, in millesimi.
pub const DEFAULT_TOTAL_MILLESIMI: f64 = 1000.0;

/// Allowed difference between the configured total and the sum of weights,
/// in thousandths of a millesimo (i.e. ±0.001).
const WEIGHT_SUM_TOLERANCE: u64 = 1;

/// A weight in millesimi with three decimal places, stored as thousandths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Millesimi(u64);

impl Millesimi {
    /// Creates a weight from thousandths of a millesimo (`201_055` is 201.055).
    #[must_use]
    pub const fn from_thousandths(thousandths: u64) -> Self {
        Self(thousandths)
    }

    /// Converts a decimal weight, rounding to three decimal places.
    ///
    /// Returns `None` for negative, non-finite or absurdly large values.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
            return None;
        }
        Some(Self((value * 1000.0).round() as u64))
    }

    #[must_use]
    pub const fn thousandths(self) -> u64 {
        self.0
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl fmt::Display for Millesimi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}

impl Serialize for Millesimi {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.as_f64().serialize(serializer)
    }
}

/// A share table that cannot be used for splitting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// No shares were configured.
    #[error("share table is empty")]
    Empty,

    /// A share label was blank.
    #[error("share {index}: {source}")]
    InvalidLabel {
        index: usize,
        source: ValidationError,
    },

    /// The same label appears twice.
    #[error("duplicate share label: {label}")]
    DuplicateLabel { label: String },

    /// A weight was zero, negative or not a number.
    #[error("share {label} has invalid weight {weight}; weights must be positive")]
    InvalidWeight { label: String, weight: f64 },

    /// The configured total weight was not positive.
    #[error("invalid total weight {total}")]
    InvalidTotal { total: f64 },

    /// The weights do not add up to the configured total.
    #[error("share weights sum to {actual} millesimi, expected {expected}")]
    WeightSumMismatch {
        expected: Millesimi,
        actual: Millesimi,
    },
}

/// A split that could not be computed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SplitError {
    /// The total to split was negative.
    #[error("total amount cannot be negative, got {value}")]
    NegativeTotal { value: f64 },

    /// The total was not a finite, representable amount.
    #[error("invalid total amount: {value}")]
    InvalidTotal { value: f64 },

    /// Absorbing the rounding difference would leave a negative amount.
    ///
    /// Only happens when the total is tiny compared to the number of shares.
    #[error("rounding adjustment would leave {label} with {amount}; total too small to split")]
    DegenerateAdjustment { label: ShareLabel, amount: i128 },
}

/// Raw share configuration as read from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareConfig {
    pub label: String,
    pub weight: f64,
}

/// One owning party and its weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Share {
    pub label: ShareLabel,
    pub weight: Millesimi,
}

/// A validated, ordered set of shares whose weights add up to the total.
///
/// Build it once when configuration is loaded; [`split`] then never has to
/// re-check the weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTable {
    shares: Vec<Share>,
    total: Millesimi,
}

impl ShareTable {
    /// Validates shares against the given total weight.
    pub fn new(shares: &[ShareConfig], total: f64) -> Result<Self, ConfigurationError> {
        let total = Millesimi::from_f64(total)
            .filter(|t| t.thousandths() > 0)
            .ok_or(ConfigurationError::InvalidTotal { total })?;
        if shares.is_empty() {
            return Err(ConfigurationError::Empty);
        }

        let mut seen = HashSet::new();
        let mut validated = Vec::with_capacity(shares.len());
        for (index, share) in shares.iter().enumerate() {
            let label = ShareLabel::new(share.label.as_str())
                .map_err(|source| ConfigurationError::InvalidLabel { index, source })?;
            if !seen.insert(label.clone()) {
                return Err(ConfigurationError::DuplicateLabel {
                    label: label.to_string(),
                });
            }
            let weight = Millesimi::from_f64(share.weight)
                .filter(|w| w.thousandths() > 0)
                .ok_or_else(|| ConfigurationError::InvalidWeight {
                    label: label.to_string(),
                    weight: share.weight,
                })?;
            validated.push(Share { label, weight });
        }

        let actual = Millesimi::from_thousandths(validated.iter().map(|s| s.weight.0).sum());
        if actual.0.abs_diff(total.0) > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigurationError::WeightSumMismatch {
                expected: total,
                actual,
            });
        }

        Ok(Self {
            shares: validated,
            total,
        })
    }

    /// Validates shares against the standard 1000 millesimi.
    pub fn with_default_total(shares: &[ShareConfig]) -> Result<Self, ConfigurationError> {
        Self::new(shares, DEFAULT_TOTAL_MILLESIMI)
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub const fn total(&self) -> Millesimi {
        self.total
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

/// One share's part of a split total, in whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub label: ShareLabel,
    pub weight: Millesimi,
    pub amount: u64,
}

/// Scale of the fixed-point total used by [`split`] (millionths of a unit).
const DECIMAL_SCALE: u128 = 1_000_000;

/// Scale of a [`Cents`] amount.
const CENTS_SCALE: u128 = 100;

/// Splits a decimal total among the shares.
///
/// The allocations add up to `total` rounded half up to whole units.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn split(total: f64, shares: &ShareTable) -> Result<Vec<Allocation>, SplitError> {
    if total < 0.0 {
        return Err(SplitError::NegativeTotal { value: total });
    }
    if !total.is_finite() || total > MAX_UNITS as f64 {
        return Err(SplitError::InvalidTotal { value: total });
    }
    let scaled = (total * DECIMAL_SCALE as f64).round() as u128;
    let rounded_total = total.round() as u64;
    apportion(scaled, DECIMAL_SCALE, rounded_total, shares)
}

/// Splits an exact amount among the shares.
///
/// The allocations come back in share order and add up to the total rounded
/// half up to whole units.
pub fn split_cents(total: Cents, shares: &ShareTable) -> Result<Vec<Allocation>, SplitError> {
    apportion(
        u128::from(total.cents()),
        CENTS_SCALE,
        total.round_to_units(),
        shares,
    )
}

/// Rounds each share's part of `scaled / scale` and corrects the largest part
/// so the parts add up to `rounded_total`.
fn apportion(
    scaled: u128,
    scale: u128,
    rounded_total: u64,
    shares: &ShareTable,
) -> Result<Vec<Allocation>, SplitError> {
    let weight_total = u128::from(shares.total.thousandths());

    let mut amounts: Vec<i128> = shares
        .shares
        .iter()
        .map(|share| {
            let numerator =
                2 * scaled * u128::from(share.weight.thousandths()) + scale * weight_total;
            to_i128(numerator / (2 * scale * weight_total))
        })
        .collect();

    let discrepancy = i128::from(rounded_total) - amounts.iter().sum::<i128>();

    if discrepancy != 0 {
        let largest = largest_index(&amounts);
        amounts[largest] += discrepancy;
        tracing::debug!(
            label = %shares.shares[largest].label,
            discrepancy,
            "applied rounding adjustment"
        );
    }

    shares
        .shares
        .iter()
        .zip(amounts)
        .map(|(share, amount)| {
            let amount =
                u64::try_from(amount).map_err(|_| SplitError::DegenerateAdjustment {
                    label: share.label.clone(),
                    amount,
                })?;
            Ok(Allocation {
                label: share.label.clone(),
                weight: share.weight,
                amount,
            })
        })
        .collect()
}

/// Index of the largest amount; the first one wins ties.
fn largest_index(amounts: &[i128]) -> usize {
    let mut best = 0;
    for (index, amount) in amounts.iter().enumerate() {
        if *amount > amounts[best] {
            best = index;
        }
    }
    best
}

/// Every per-share part is bounded by the total, which fits in `u64`.
fn to_i128(value: u128) -> i128 {
    i128::try_from(value).unwrap_or(i128::MAX)
}
