//! Shared condominium expenses.

use chrono::NaiveDate;
use serde::Serialize;

use crate::money::Cents;
use crate::types::RecordId;

/// A purchase paid for the common garden and split by millesimi.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: RecordId,
    /// Purchase date.
    pub date: NaiveDate,
    /// What was bought.
    pub item: String,
    pub price: Cents,
    /// Link to a scanned receipt, if one was uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
}
