//! Work sessions and the records they are built from.
//!
//! Older exports store a single category as a bare `tipo` string, newer ones
//! store a `tipi` array. Both are folded into [`WorkTypes`] here, at the input
//! boundary, so nothing downstream branches on the shape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::date::{DateParseError, parse_work_date};
use crate::money::Cents;
use crate::types::{RecordId, ValidationError, WorkType};

/// A record whose date could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("work record {index}: {source}")]
pub struct ParseError {
    /// Position of the offending record in its input list.
    pub index: usize,
    pub source: DateParseError,
}

/// The categories a work session belongs to.
///
/// Blank labels are dropped and duplicates collapse to their first
/// occurrence, so every label appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkTypes(Vec<WorkType>);

impl WorkTypes {
    /// Builds a normalized list from raw labels.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut types: Vec<WorkType> = Vec::new();
        for label in labels {
            let Ok(ty) = WorkType::new(label.as_ref()) else {
                continue;
            };
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        Self(types)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkType> {
        self.0.iter()
    }

    pub fn contains(&self, ty: &WorkType) -> bool {
        self.0.contains(ty)
    }

    pub fn as_slice(&self) -> &[WorkType] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a WorkTypes {
    type Item = &'a WorkType;
    type IntoIter = std::slice::Iter<'a, WorkType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The shapes a stored type field has taken over time.
#[derive(Deserialize)]
#[serde(untagged)]
enum TypeField {
    Many(Vec<Option<String>>),
    One(String),
}

impl<'de> Deserialize<'de> for WorkTypes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let field = Option::<TypeField>::deserialize(deserializer)?;
        Ok(match field {
            Some(TypeField::Many(labels)) => Self::from_labels(labels.into_iter().flatten()),
            Some(TypeField::One(label)) => Self::from_labels([label]),
            None => Self::default(),
        })
    }
}

/// A dated, categorized occurrence of work, as consumed by the predictor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkEvent {
    pub date: NaiveDate,
    pub types: WorkTypes,
}

impl WorkEvent {
    pub const fn new(date: NaiveDate, types: WorkTypes) -> Self {
        Self { date, types }
    }
}

/// A work record as it arrives from outside: the date is still text and the
/// type field may be in its legacy shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkRecord {
    #[serde(alias = "data")]
    pub date: String,

    #[serde(default, alias = "tipi")]
    pub types: Option<WorkTypes>,

    /// Legacy single-category field.
    #[serde(default, rename = "tipo")]
    pub legacy_type: Option<WorkTypes>,
}

impl WorkRecord {
    /// Resolves the record into a [`WorkEvent`].
    ///
    /// `index` is the record's position in its input list and is reported
    /// back in the error.
    pub fn to_event(&self, index: usize) -> Result<WorkEvent, ParseError> {
        let date = parse_work_date(&self.date).map_err(|source| ParseError { index, source })?;
        Ok(WorkEvent::new(date, self.work_types()))
    }

    /// The normalized categories: `types` when present, else the legacy field.
    pub fn work_types(&self) -> WorkTypes {
        self.types
            .clone()
            .or_else(|| self.legacy_type.clone())
            .unwrap_or_default()
    }
}

/// Resolves a batch of records, stopping at the first malformed date.
pub fn parse_records(records: &[WorkRecord]) -> Result<Vec<WorkEvent>, ParseError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| record.to_event(index))
        .collect()
}

/// Checks that a worked duration is a positive, finite number of hours.
pub fn validate_hours(hours: f64) -> Result<f64, ValidationError> {
    if hours.is_finite() && hours > 0.0 {
        Ok(hours)
    } else {
        Err(ValidationError::InvalidHours { value: hours })
    }
}

/// A logged work session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkSession {
    pub id: RecordId,
    pub date: NaiveDate,
    pub types: WorkTypes,
    pub description: String,
    /// Duration in decimal hours.
    pub hours: f64,
    /// Billed amount; equals `custom_price` when one is set.
    pub amount: Cents,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_price: Option<Cents>,
}

impl WorkSession {
    /// The session as seen by the recurrence predictor.
    pub fn event(&self) -> WorkEvent {
        WorkEvent::new(self.date, self.types.clone())
    }
}
