//! Storage layer for garden bookkeeping.
//!
//! Provides persistence for work sessions and shared expenses using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization (e.g. a `Mutex<Database>`).
//!
//! # Schema
//!
//! ## Date Format
//!
//! Dates are stored as TEXT in ISO 8601 format (`2025-01-15`), so
//! lexicographic ordering matches chronological ordering.
//!
//! ## Money
//!
//! Amounts are stored as INTEGER cents.
//!
//! ## Work Types
//!
//! The `types` column stores a JSON array of labels. Rows written by older
//! versions may hold a single label, either as a JSON string or as plain text;
//! both are normalized into a list when read.

use std::path::Path;

use chrono::{NaiveDate, SecondsFormat, Utc};
use gb_core::{Cents, Expense, RecordId, WorkSession, WorkTypes};
use rusqlite::{Connection, params};
use thiserror::Error;
use uuid::Uuid;

/// Storage format for dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored date could not be parsed.
    #[error("invalid date for {id}: {value}")]
    DateParse {
        id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row violates a domain constraint.
    #[error("invalid record {id}: {message}")]
    InvalidRecord { id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Record counts for status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub works: usize,
    pub expenses: usize,
    pub last_work: Option<NaiveDate>,
    pub last_expense: Option<NaiveDate>,
}

/// Generates an identifier for a new record.
pub fn new_record_id() -> Result<RecordId, DbError> {
    record_id(Uuid::new_v4().to_string())
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Work sessions
            -- date: ISO 8601 day (e.g., '2025-01-15')
            -- types: JSON array of work type labels
            CREATE TABLE IF NOT EXISTS works (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                types TEXT NOT NULL DEFAULT '[]',
                description TEXT NOT NULL DEFAULT '',
                hours REAL NOT NULL,
                amount_cents INTEGER NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                custom_price_cents INTEGER,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_works_date ON works(date);

            -- Shared condominium expenses
            CREATE TABLE IF NOT EXISTS expenses (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                item TEXT NOT NULL,
                price_cents INTEGER NOT NULL,
                receipt_url TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
            ",
        )?;
        Ok(())
    }

    /// Inserts a batch of work sessions, ignoring duplicates by ID.
    pub fn insert_works(&mut self, works: &[WorkSession]) -> Result<usize, DbError> {
        if works.is_empty() {
            return Ok(0);
        }
        let created_at = now_timestamp();
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO works
                (id, date, types, description, hours, amount_cents, notes, custom_price_cents, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for work in works {
                let types = serde_json::to_string(&work.types).map_err(|err| {
                    DbError::InvalidRecord {
                        id: work.id.to_string(),
                        message: err.to_string(),
                    }
                })?;
                inserted += stmt.execute(params![
                    work.id.as_str(),
                    format_date(work.date),
                    types,
                    work.description,
                    work.hours,
                    cents_to_sql(work.amount, &work.id)?,
                    work.notes,
                    work.custom_price
                        .map(|price| cents_to_sql(price, &work.id))
                        .transpose()?,
                    created_at,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(inserted, "stored work sessions");
        Ok(inserted)
    }

    /// Lists all work sessions ordered by date then ID.
    pub fn list_works(&self) -> Result<Vec<WorkSession>, DbError> {
        self.query_works(
            "
            SELECT id, date, types, description, hours, amount_cents, notes, custom_price_cents
            FROM works
            ORDER BY date ASC, id ASC
            ",
            &[],
        )
    }

    /// Lists work sessions between two dates, both inclusive.
    pub fn list_works_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkSession>, DbError> {
        self.query_works(
            "
            SELECT id, date, types, description, hours, amount_cents, notes, custom_price_cents
            FROM works
            WHERE date >= ? AND date <= ?
            ORDER BY date ASC, id ASC
            ",
            &[format_date(start), format_date(end)],
        )
    }

    fn query_works(&self, sql: &str, args: &[String]) -> Result<Vec<WorkSession>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args), |row| {
            Ok(WorkRow {
                id: row.get(0)?,
                date: row.get(1)?,
                types: row.get(2)?,
                description: row.get(3)?,
                hours: row.get(4)?,
                amount_cents: row.get(5)?,
                notes: row.get(6)?,
                custom_price_cents: row.get(7)?,
            })
        })?;
        let mut works = Vec::new();
        for row in rows {
            works.push(row?.into_session()?);
        }
        Ok(works)
    }

    /// Deletes a work session. Returns whether it existed.
    pub fn delete_work(&mut self, id: &str) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM works WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Inserts a batch of expenses, ignoring duplicates by ID.
    pub fn insert_expenses(&mut self, expenses: &[Expense]) -> Result<usize, DbError> {
        if expenses.is_empty() {
            return Ok(0);
        }
        let created_at = now_timestamp();
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO expenses
                (id, date, item, price_cents, receipt_url, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )?;
            for expense in expenses {
                inserted += stmt.execute(params![
                    expense.id.as_str(),
                    format_date(expense.date),
                    expense.item,
                    cents_to_sql(expense.price, &expense.id)?,
                    expense.receipt_url,
                    created_at,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(inserted, "stored expenses");
        Ok(inserted)
    }

    /// Lists all expenses ordered by date then ID.
    pub fn list_expenses(&self) -> Result<Vec<Expense>, DbError> {
        self.query_expenses(
            "
            SELECT id, date, item, price_cents, receipt_url
            FROM expenses
            ORDER BY date ASC, id ASC
            ",
            &[],
        )
    }

    /// Lists expenses between two dates, both inclusive.
    pub fn list_expenses_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Expense>, DbError> {
        self.query_expenses(
            "
            SELECT id, date, item, price_cents, receipt_url
            FROM expenses
            WHERE date >= ? AND date <= ?
            ORDER BY date ASC, id ASC
            ",
            &[format_date(start), format_date(end)],
        )
    }

    fn query_expenses(&self, sql: &str, args: &[String]) -> Result<Vec<Expense>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args), |row| {
            Ok(ExpenseRow {
                id: row.get(0)?,
                date: row.get(1)?,
                item: row.get(2)?,
                price_cents: row.get(3)?,
                receipt_url: row.get(4)?,
            })
        })?;
        let mut expenses = Vec::new();
        for row in rows {
            expenses.push(row?.into_expense()?);
        }
        Ok(expenses)
    }

    /// Deletes an expense. Returns whether it existed.
    pub fn delete_expense(&mut self, id: &str) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Counts records and finds the latest dates.
    pub fn summary(&self) -> Result<Summary, DbError> {
        let (works, last_work) = self.table_summary("works")?;
        let (expenses, last_expense) = self.table_summary("expenses")?;
        Ok(Summary {
            works,
            expenses,
            last_work,
            last_expense,
        })
    }

    fn table_summary(&self, table: &str) -> Result<(usize, Option<NaiveDate>), DbError> {
        let (count, last): (i64, Option<String>) = self.conn.query_row(
            &format!("SELECT COUNT(*), MAX(date) FROM {table}"),
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let last = last
            .map(|value| parse_date(table, &value))
            .transpose()?;
        Ok((usize::try_from(count).unwrap_or_default(), last))
    }
}

/// A `works` row before domain validation.
struct WorkRow {
    id: String,
    date: String,
    types: String,
    description: String,
    hours: f64,
    amount_cents: i64,
    notes: String,
    custom_price_cents: Option<i64>,
}

impl WorkRow {
    fn into_session(self) -> Result<WorkSession, DbError> {
        let date = parse_date(&self.id, &self.date)?;
        let amount = cents_from_sql(self.amount_cents, &self.id)?;
        let custom_price = self
            .custom_price_cents
            .map(|cents| cents_from_sql(cents, &self.id))
            .transpose()?;
        let types = parse_types(&self.types);
        let id = record_id(self.id)?;
        Ok(WorkSession {
            id,
            date,
            types,
            description: self.description,
            hours: self.hours,
            amount,
            notes: self.notes,
            custom_price,
        })
    }
}

/// An `expenses` row before domain validation.
struct ExpenseRow {
    id: String,
    date: String,
    item: String,
    price_cents: i64,
    receipt_url: Option<String>,
}

impl ExpenseRow {
    fn into_expense(self) -> Result<Expense, DbError> {
        let date = parse_date(&self.id, &self.date)?;
        let price = cents_from_sql(self.price_cents, &self.id)?;
        let id = record_id(self.id)?;
        Ok(Expense {
            id,
            date,
            item: self.item,
            price,
            receipt_url: self.receipt_url,
        })
    }
}

/// Reads the `types` column, accepting the legacy single-label forms.
fn parse_types(value: &str) -> WorkTypes {
    serde_json::from_str(value).unwrap_or_else(|_| WorkTypes::from_labels([value]))
}

fn record_id(id: String) -> Result<RecordId, DbError> {
    RecordId::new(id.clone()).map_err(|err| DbError::InvalidRecord {
        id,
        message: err.to_string(),
    })
}

fn parse_date(id: &str, value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| DbError::DateParse {
        id: id.to_string(),
        value: value.to_string(),
        source,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn cents_to_sql(amount: Cents, id: &RecordId) -> Result<i64, DbError> {
    i64::try_from(amount.cents()).map_err(|_| DbError::InvalidRecord {
        id: id.to_string(),
        message: format!("amount {amount} out of range"),
    })
}

fn cents_from_sql(cents: i64, id: &str) -> Result<Cents, DbError> {
    u64::try_from(cents)
        .map(Cents::new)
        .map_err(|_| DbError::InvalidRecord {
            id: id.to_string(),
            message: format!("negative amount {cents}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn work(id: &str, date: NaiveDate, types: &[&str]) -> WorkSession {
        WorkSession {
            id: RecordId::new(id).unwrap(),
            date,
            types: WorkTypes::from_labels(types),
            description: "Prato condominiale".to_string(),
            hours: 1.5,
            amount: Cents::new(2250),
            notes: String::new(),
            custom_price: None,
        }
    }

    fn expense(id: &str, date: NaiveDate, price: u64) -> Expense {
        Expense {
            id: RecordId::new(id).unwrap(),
            date,
            item: "Sacchi per foglie".to_string(),
            price: Cents::new(price),
            receipt_url: None,
        }
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "works"),
            vec![
                "id",
                "date",
                "types",
                "description",
                "hours",
                "amount_cents",
                "notes",
                "custom_price_cents",
                "created_at",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "expenses"),
            vec![
                "id",
                "date",
                "item",
                "price_cents",
                "receipt_url",
                "created_at"
            ]
        );
        assert!(index_names(&db.conn, "works").contains("idx_works_date"));
        assert!(index_names(&db.conn, "expenses").contains("idx_expenses_date"));
    }

    #[test]
    fn reopening_file_database_keeps_records() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("gb.db");

        let mut db = Database::open(&path).unwrap();
        db.insert_works(&[work("w1", ymd(2025, 1, 1), &["A"])])
            .unwrap();
        drop(db);

        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_works().unwrap().len(), 1);
    }

    #[test]
    fn insert_works_is_idempotent() {
        let mut db = Database::open_in_memory().unwrap();
        let w = work("w1", ymd(2025, 1, 1), &["A"]);
        assert_eq!(db.insert_works(&[w.clone(), w]).unwrap(), 1);
        assert_eq!(db.list_works().unwrap().len(), 1);
    }

    #[test]
    fn works_round_trip_and_order_by_date() {
        let mut db = Database::open_in_memory().unwrap();
        let mut custom = work("w2", ymd(2025, 1, 1), &["Taglio siepe", "Taglio erba"]);
        custom.custom_price = Some(Cents::new(5000));
        custom.amount = Cents::new(5000);
        custom.notes = "Siepe lato strada".to_string();
        let later = work("w1", ymd(2025, 2, 1), &["Taglio erba"]);

        db.insert_works(&[later.clone(), custom.clone()]).unwrap();

        assert_eq!(db.list_works().unwrap(), vec![custom, later]);
    }

    #[test]
    fn range_queries_are_inclusive() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_works(&[
            work("a", ymd(2025, 1, 1), &["A"]),
            work("b", ymd(2025, 1, 15), &["A"]),
            work("c", ymd(2025, 1, 31), &["A"]),
            work("d", ymd(2025, 2, 1), &["A"]),
        ])
        .unwrap();
        db.insert_expenses(&[
            expense("x", ymd(2024, 12, 31), 100),
            expense("y", ymd(2025, 1, 31), 200),
        ])
        .unwrap();

        let works = db
            .list_works_in_range(ymd(2025, 1, 1), ymd(2025, 1, 31))
            .unwrap();
        let ids: Vec<&str> = works.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let expenses = db
            .list_expenses_in_range(ymd(2025, 1, 1), ymd(2025, 1, 31))
            .unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].price, Cents::new(200));
    }

    #[test]
    fn legacy_type_column_is_normalized() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute_batch(
                "
                INSERT INTO works (id, date, types, hours, amount_cents, created_at)
                VALUES ('json-string', '2025-01-01', '\"Taglio erba\"', 1.0, 1500, '2025-01-01T00:00:00Z');
                INSERT INTO works (id, date, types, hours, amount_cents, created_at)
                VALUES ('plain', '2025-01-02', 'Taglio siepe', 1.0, 2000, '2025-01-01T00:00:00Z');
                INSERT INTO works (id, date, hours, amount_cents, created_at)
                VALUES ('untyped', '2025-01-03', 1.0, 0, '2025-01-01T00:00:00Z');
                ",
            )
            .unwrap();

        let works = db.list_works().unwrap();
        let types: Vec<Vec<&str>> = works
            .iter()
            .map(|w| w.types.iter().map(gb_core::WorkType::as_str).collect())
            .collect();
        assert_eq!(
            types,
            vec![vec!["Taglio erba"], vec!["Taglio siepe"], Vec::<&str>::new()]
        );
    }

    #[test]
    fn corrupt_date_is_reported() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO expenses (id, date, item, price_cents, created_at)
                 VALUES ('bad', '15/01/2025', 'Rastrello', 100, '2025-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        let err = db.list_expenses().unwrap_err();
        assert!(matches!(err, DbError::DateParse { ref id, .. } if id == "bad"));
    }

    #[test]
    fn delete_reports_whether_record_existed() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_expenses(&[expense("e1", ymd(2025, 1, 1), 100)])
            .unwrap();
        assert!(db.delete_expense("e1").unwrap());
        assert!(!db.delete_expense("e1").unwrap());
        assert!(!db.delete_work("missing").unwrap());
    }

    #[test]
    fn summary_counts_and_latest_dates() {
        let mut db = Database::open_in_memory().unwrap();
        assert_eq!(
            db.summary().unwrap(),
            Summary {
                works: 0,
                expenses: 0,
                last_work: None,
                last_expense: None,
            }
        );

        db.insert_works(&[
            work("a", ymd(2025, 1, 1), &["A"]),
            work("b", ymd(2025, 3, 1), &["A"]),
        ])
        .unwrap();
        db.insert_expenses(&[expense("e", ymd(2025, 2, 1), 100)])
            .unwrap();

        let summary = db.summary().unwrap();
        assert_eq!(summary.works, 2);
        assert_eq!(summary.expenses, 1);
        assert_eq!(summary.last_work, Some(ymd(2025, 3, 1)));
        assert_eq!(summary.last_expense, Some(ymd(2025, 2, 1)));
    }

    #[test]
    fn new_record_ids_are_unique() {
        assert_ne!(new_record_id().unwrap(), new_record_id().unwrap());
    }
}
