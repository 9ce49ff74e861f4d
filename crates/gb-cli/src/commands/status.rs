//! Status command for showing what the database holds.

use std::io::Write;

use anyhow::Result;
use gb_core::format_work_date;
use gb_db::Database;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config) -> Result<()> {
    let summary = db.summary()?;

    writeln!(writer, "Garden bookkeeping status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(
        writer,
        "Work sessions: {}{}",
        summary.works,
        summary
            .last_work
            .map(|date| format!(" (last {})", format_work_date(date)))
            .unwrap_or_default()
    )?;
    writeln!(
        writer,
        "Expenses: {}{}",
        summary.expenses,
        summary
            .last_expense
            .map(|date| format!(" (last {})", format_work_date(date)))
            .unwrap_or_default()
    )?;
    writeln!(
        writer,
        "Shares: {}",
        config
            .shares
            .iter()
            .map(|share| share.label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    )?;
    writeln!(
        writer,
        "Weather: {}",
        if config.weather.api_key.is_some() {
            "configured"
        } else {
            "not configured"
        }
    )?;
    Ok(())
}
