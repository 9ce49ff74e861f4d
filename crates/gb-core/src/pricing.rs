//! Pricing work sessions from an hourly rate card.

use std::collections::BTreeMap;

use crate::money::Cents;
use crate::types::{ValidationError, WorkType};
use crate::work::WorkTypes;

/// Hourly rates per work type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateCard {
    rates: BTreeMap<WorkType, Cents>,
}

impl RateCard {
    pub fn new(rates: impl IntoIterator<Item = (WorkType, Cents)>) -> Self {
        Self {
            rates: rates.into_iter().collect(),
        }
    }

    /// Builds a rate card from decimal hourly rates keyed by type label.
    pub fn from_units(rates: &BTreeMap<String, f64>) -> Result<Self, ValidationError> {
        let mut card = BTreeMap::new();
        for (label, rate) in rates {
            card.insert(WorkType::new(label.as_str())?, Cents::from_units(*rate)?);
        }
        Ok(Self { rates: card })
    }

    /// The hourly rate for a type, if it has one.
    pub fn rate(&self, work_type: &WorkType) -> Option<Cents> {
        self.rates.get(work_type).copied()
    }

    /// Types with a configured rate, in label order.
    pub fn work_types(&self) -> impl Iterator<Item = &WorkType> {
        self.rates.keys()
    }

    /// Prices a session.
    ///
    /// A custom price wins outright. Otherwise the hourly rate is the mean of
    /// the session's types that have a positive rate, times the hours, rounded
    /// to the cent. Sessions with no priced type, or no valid hours, cost
    /// nothing.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn price(&self, types: &WorkTypes, hours: f64, custom_price: Option<Cents>) -> Cents {
        if let Some(price) = custom_price {
            return price;
        }
        if !hours.is_finite() || hours <= 0.0 {
            return Cents::ZERO;
        }

        let rates: Vec<u64> = types
            .iter()
            .filter_map(|ty| self.rate(ty))
            .map(Cents::cents)
            .filter(|cents| *cents > 0)
            .collect();
        if rates.is_empty() {
            return Cents::ZERO;
        }

        let mean = rates.iter().sum::<u64>() as f64 / rates.len() as f64;
        Cents::new((mean * hours).round() as u64)
    }
}
