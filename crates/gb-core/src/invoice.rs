//! Invoice assembly for a billing period.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::expense::Expense;
use crate::money::Cents;
use crate::split::{Allocation, ShareTable, SplitError, split_cents};
use crate::work::WorkSession;

/// Invoice errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvoiceError {
    /// The period ends before it starts.
    #[error("invoice period start {start} is after end {end}")]
    InvertedPeriod { start: NaiveDate, end: NaiveDate },

    /// The invoice total could not be split.
    #[error(transparent)]
    Split(#[from] SplitError),
}

/// An inclusive range of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoicePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl InvoicePeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvoiceError> {
        if start > end {
            return Err(InvoiceError::InvertedPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whether `date` falls within the period, both ends included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Everything billed in a period and how it is split among the units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub period: InvoicePeriod,
    /// Works in the period, oldest first.
    pub works: Vec<WorkSession>,
    /// Expenses in the period, oldest first.
    pub expenses: Vec<Expense>,
    pub works_total: Cents,
    pub expenses_total: Cents,
    pub total: Cents,
    pub total_hours: f64,
    pub allocations: Vec<Allocation>,
}

impl Invoice {
    /// Collects the period's works and expenses and splits their total.
    ///
    /// Returns `Ok(None)` when there is nothing to bill in the period.
    pub fn build(
        period: InvoicePeriod,
        works: &[WorkSession],
        expenses: &[Expense],
        shares: &ShareTable,
    ) -> Result<Option<Self>, InvoiceError> {
        let mut works: Vec<WorkSession> = works
            .iter()
            .filter(|work| period.contains(work.date))
            .cloned()
            .collect();
        let mut expenses: Vec<Expense> = expenses
            .iter()
            .filter(|expense| period.contains(expense.date))
            .cloned()
            .collect();

        if works.is_empty() && expenses.is_empty() {
            return Ok(None);
        }

        works.sort_by_key(|work| work.date);
        expenses.sort_by_key(|expense| expense.date);

        let works_total: Cents = works.iter().map(|work| work.amount).sum();
        let expenses_total: Cents = expenses.iter().map(|expense| expense.price).sum();
        let total = works_total + expenses_total;
        let total_hours: f64 = works.iter().map(|work| work.hours).sum();
        let allocations = split_cents(total, shares)?;

        tracing::debug!(
            works = works.len(),
            expenses = expenses.len(),
            %total,
            "built invoice"
        );

        Ok(Some(Self {
            period,
            works,
            expenses,
            works_total,
            expenses_total,
            total,
            total_hours,
            allocations,
        }))
    }

    /// The total rounded half up to whole units, as split.
    pub const fn rounded_total(&self) -> u64 {
        self.total.round_to_units()
    }
}
