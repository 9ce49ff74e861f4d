//! Recurring-work prediction.
//!
//! Forecasts when each kind of maintenance task is next due from the history
//! of past sessions.
//!
//! # Algorithm Summary
//!
//! 1. Bucket event dates by work type (an event with several types lands in
//!    several buckets; events without types land nowhere)
//! 2. For each type with at least two dates, sort them and average the
//!    positive day gaps between consecutive dates, rounding half up
//! 3. Project the next occurrence as last date + average interval
//! 4. Keep projections on or after today (unless overdue ones are requested)
//!    and group them by projected date, ascending

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::WorkType;
use crate::work::{ParseError, WorkEvent, WorkRecord, WorkSession, WorkTypes};

/// What to do with projections that fall before today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverduePolicy {
    /// Silently discard them.
    #[default]
    Drop,
    /// Report them alongside upcoming ones.
    Include,
}

/// Configuration for prediction.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionConfig {
    pub overdue: OverduePolicy,
}

/// Recurrence figures for one work type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalStatistic {
    #[serde(rename = "type")]
    pub work_type: WorkType,

    /// Mean gap between consecutive occurrences, in whole days.
    pub average_interval_days: i64,

    /// Most recent occurrence.
    pub last_occurrence: NaiveDate,
}

impl IntervalStatistic {
    /// The projected next occurrence, or `None` past the end of the calendar.
    pub fn next_due(&self) -> Option<NaiveDate> {
        self.last_occurrence
            .checked_add_signed(Duration::days(self.average_interval_days))
    }
}

/// Every work type projected onto one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub date: NaiveDate,
    pub entries: Vec<IntervalStatistic>,
}

impl Prediction {
    /// Whether this projection lies before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.date < today
    }
}

/// A dated piece of work the predictor can learn from.
///
/// Lets prediction run over stored sessions and parsed records alike.
pub trait DatedWork {
    /// The day the work happened.
    fn date(&self) -> NaiveDate;

    /// The categories the work belongs to.
    fn work_types(&self) -> &WorkTypes;
}

impl DatedWork for WorkEvent {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn work_types(&self) -> &WorkTypes {
        &self.types
    }
}

impl DatedWork for WorkSession {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn work_types(&self) -> &WorkTypes {
        &self.types
    }
}

/// Computes recurrence figures for every type with enough history.
///
/// Types with fewer than two dates, or whose dates are all on the same day,
/// are left out. The result is ordered by type label.
pub fn interval_statistics<E: DatedWork>(events: &[E]) -> Vec<IntervalStatistic> {
    let mut dates_by_type: BTreeMap<&WorkType, Vec<NaiveDate>> = BTreeMap::new();
    for event in events {
        for work_type in event.work_types() {
            dates_by_type
                .entry(work_type)
                .or_default()
                .push(event.date());
        }
    }

    dates_by_type
        .into_iter()
        .filter_map(|(work_type, mut dates)| {
            if dates.len() < 2 {
                tracing::trace!(%work_type, "not enough occurrences to estimate an interval");
                return None;
            }
            dates.sort_unstable();

            let gaps: Vec<i64> = dates
                .windows(2)
                .map(|pair| (pair[1] - pair[0]).num_days())
                .filter(|gap| *gap > 0)
                .collect();
            let Some(average_interval_days) = rounded_mean(&gaps) else {
                tracing::trace!(%work_type, "all occurrences share a date");
                return None;
            };

            Some(IntervalStatistic {
                work_type: work_type.clone(),
                average_interval_days,
                last_occurrence: *dates.last()?,
            })
        })
        .collect()
}

/// Arithmetic mean rounded half up, or `None` for an empty slice.
#[allow(clippy::cast_possible_wrap)]
fn rounded_mean(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let count = values.len() as i64;
    let sum: i64 = values.iter().sum();
    Some((2 * sum + count).div_euclid(2 * count))
}

/// Predicts upcoming work, dropping overdue projections.
pub fn predict<E: DatedWork>(events: &[E], today: NaiveDate) -> Vec<Prediction> {
    predict_with(events, today, PredictionConfig::default())
}

/// Predicts upcoming work under the given configuration.
///
/// `today` is the caller's local date. Predictions are sorted by date; types
/// sharing a projected date are grouped into one [`Prediction`].
pub fn predict_with<E: DatedWork>(
    events: &[E],
    today: NaiveDate,
    config: PredictionConfig,
) -> Vec<Prediction> {
    let mut by_date: BTreeMap<NaiveDate, Vec<IntervalStatistic>> = BTreeMap::new();

    for statistic in interval_statistics(events) {
        let Some(next) = statistic.next_due() else {
            continue;
        };
        if next < today && config.overdue == OverduePolicy::Drop {
            tracing::debug!(
                work_type = %statistic.work_type,
                %next,
                "dropping overdue projection"
            );
            continue;
        }
        by_date.entry(next).or_default().push(statistic);
    }

    by_date
        .into_iter()
        .map(|(date, entries)| Prediction { date, entries })
        .collect()
}

/// Parses raw records and predicts from them.
///
/// Fails on the first record with an unparseable date; no partial
/// prediction is returned.
pub fn predict_records(
    records: &[WorkRecord],
    today: NaiveDate,
    config: PredictionConfig,
) -> Result<Vec<Prediction>, ParseError> {
    let events = crate::work::parse_records(records)?;
    Ok(predict_with(&events, today, config))
}
