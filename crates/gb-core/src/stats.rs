//! Dashboard statistics over logged work.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;

use crate::money::Cents;
use crate::types::WorkType;
use crate::work::WorkSession;

/// How many days count as "recent", today included.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// At most this many recent works are listed.
pub const RECENT_LIMIT: usize = 5;

/// Number of calendar months in the monthly history, current month included.
pub const MONTHS_OF_HISTORY: u32 = 6;

/// Totals for one bucket of work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub count: usize,
    pub hours: f64,
    pub amount: Cents,
}

impl Totals {
    fn add(&mut self, work: &WorkSession) {
        self.count += 1;
        self.hours += work.hours;
        self.amount = self.amount + work.amount;
    }
}

/// Totals for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthTotals {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub totals: Totals,
}

/// Summary figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkStats {
    pub overall: Totals,
    /// Per type; a session with several types counts fully toward each.
    pub by_type: BTreeMap<WorkType, Totals>,
    /// Newest first.
    pub recent: Vec<WorkSession>,
    /// Oldest first, ending with the current month.
    pub monthly: Vec<MonthTotals>,
}

impl WorkStats {
    pub fn compute(works: &[WorkSession], today: NaiveDate) -> Self {
        let mut overall = Totals::default();
        let mut by_type: BTreeMap<WorkType, Totals> = BTreeMap::new();
        for work in works {
            overall.add(work);
            for work_type in &work.types {
                by_type.entry(work_type.clone()).or_default().add(work);
            }
        }

        let recent_start = today - Duration::days(RECENT_WINDOW_DAYS - 1);
        let mut recent: Vec<WorkSession> = works
            .iter()
            .filter(|work| work.date >= recent_start)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(RECENT_LIMIT);

        Self {
            overall,
            by_type,
            recent,
            monthly: monthly_totals(works, today),
        }
    }
}

fn monthly_totals(works: &[WorkSession], today: NaiveDate) -> Vec<MonthTotals> {
    let Some(current) = today.with_day(1) else {
        return Vec::new();
    };

    (0..MONTHS_OF_HISTORY)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .map(|start| {
            let mut totals = Totals::default();
            for work in works
                .iter()
                .filter(|w| w.date.year() == start.year() && w.date.month() == start.month())
            {
                totals.add(work);
            }
            MonthTotals {
                year: start.year(),
                month: start.month(),
                totals,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordId;
    use crate::work::WorkTypes;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn work(id: &str, date: NaiveDate, types: &[&str], hours: f64, amount: u64) -> WorkSession {
        WorkSession {
            id: RecordId::new(id).unwrap(),
            date,
            types: WorkTypes::from_labels(types),
            description: String::new(),
            hours,
            amount: Cents::new(amount),
            notes: String::new(),
            custom_price: None,
        }
    }

    #[test]
    fn empty_history_has_zero_totals_and_six_empty_months() {
        let stats = WorkStats::compute(&[], ymd(2025, 3, 15));
        assert_eq!(stats.overall, Totals::default());
        assert!(stats.by_type.is_empty());
        assert!(stats.recent.is_empty());
        assert_eq!(stats.monthly.len(), 6);
        assert!(stats.monthly.iter().all(|m| m.totals.count == 0));
    }

    #[test]
    fn multi_type_work_counts_toward_each_type() {
        let works = vec![
            work("a", ymd(2025, 3, 1), &["Taglio erba", "Taglio siepe"], 2.0, 3500),
            work("b", ymd(2025, 3, 2), &["Taglio erba"], 1.0, 1500),
        ];
        let stats = WorkStats::compute(&works, ymd(2025, 3, 15));

        assert_eq!(stats.overall.count, 2);
        assert_eq!(stats.overall.amount, Cents::new(5000));

        let grass = &stats.by_type[&WorkType::new("Taglio erba").unwrap()];
        assert_eq!(grass.count, 2);
        assert!((grass.hours - 3.0).abs() < f64::EPSILON);
        assert_eq!(grass.amount, Cents::new(5000));

        let hedge = &stats.by_type[&WorkType::new("Taglio siepe").unwrap()];
        assert_eq!(hedge.count, 1);
        assert_eq!(hedge.amount, Cents::new(3500));
    }

    #[test]
    fn recent_keeps_last_seven_days_newest_first() {
        let works = vec![
            work("old", ymd(2025, 3, 8), &["A"], 1.0, 0),
            work("edge", ymd(2025, 3, 9), &["A"], 1.0, 0),
            work("today", ymd(2025, 3, 15), &["A"], 1.0, 0),
            work("mid", ymd(2025, 3, 12), &["A"], 1.0, 0),
        ];
        let stats = WorkStats::compute(&works, ymd(2025, 3, 15));
        let ids: Vec<&str> = stats.recent.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["today", "mid", "edge"]);
    }

    #[test]
    fn recent_is_capped_at_five() {
        let works: Vec<WorkSession> = (10..=15)
            .map(|day| work(&format!("w{day}"), ymd(2025, 3, day), &["A"], 1.0, 0))
            .collect();
        let stats = WorkStats::compute(&works, ymd(2025, 3, 15));
        assert_eq!(stats.recent.len(), RECENT_LIMIT);
        assert_eq!(stats.recent[0].id.as_str(), "w15");
    }

    #[test]
    fn monthly_history_spans_year_boundary() {
        let works = vec![
            work("nov", ymd(2024, 11, 20), &["A"], 1.5, 2000),
            work("feb", ymd(2025, 2, 3), &["A"], 1.0, 1500),
            work("too-old", ymd(2024, 9, 30), &["A"], 1.0, 1500),
        ];
        let stats = WorkStats::compute(&works, ymd(2025, 3, 31));
        let months: Vec<(i32, u32, usize)> = stats
            .monthly
            .iter()
            .map(|m| (m.year, m.month, m.totals.count))
            .collect();
        assert_eq!(
            months,
            vec![
                (2024, 10, 0),
                (2024, 11, 1),
                (2024, 12, 0),
                (2025, 1, 0),
                (2025, 2, 1),
                (2025, 3, 0),
            ]
        );
    }
}
