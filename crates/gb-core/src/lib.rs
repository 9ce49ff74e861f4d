//! Core domain logic for garden bookkeeping.
//!
//! This crate contains the fundamental types and logic for:
//! - Recurrence: forecasting when each kind of garden work is next due
//! - Splitting: dividing costs among condominium units by millesimi
//! - Pricing, invoices and dashboard statistics over logged work

pub mod date;
mod expense;
pub mod invoice;
mod money;
pub mod pricing;
pub mod recurrence;
pub mod split;
pub mod stats;
pub mod types;
pub mod work;

pub use date::{DateParseError, format_work_date, parse_work_date};
pub use expense::Expense;
pub use invoice::{Invoice, InvoiceError, InvoicePeriod};
pub use money::{Cents, MAX_UNITS};
pub use pricing::RateCard;
pub use recurrence::{
    DatedWork, IntervalStatistic, OverduePolicy, Prediction, PredictionConfig,
    interval_statistics, predict, predict_records, predict_with,
};
pub use split::{
    Allocation, ConfigurationError, Millesimi, Share, ShareConfig, ShareTable, SplitError, split,
    split_cents,
};
pub use stats::{MonthTotals, Totals, WorkStats};
pub use types::{RecordId, ShareLabel, ValidationError, WorkType};
pub use work::{
    ParseError, WorkEvent, WorkRecord, WorkSession, WorkTypes, parse_records, validate_hours,
};
