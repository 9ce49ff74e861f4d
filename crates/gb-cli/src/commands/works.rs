//! Works command for listing and deleting logged sessions.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Args;
use gb_core::{WorkSession, format_work_date};
use gb_db::Database;

use super::util::{format_hours, format_money, format_types, parse_date_arg};

#[derive(Debug, Args)]
pub struct WorksArgs {
    /// First day to include.
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Last day to include.
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, args: &WorksArgs) -> Result<()> {
    let works = match (args.from, args.to) {
        (Some(from), Some(to)) => db.list_works_in_range(from, to)?,
        (from, to) => db
            .list_works()?
            .into_iter()
            .filter(|work| from.is_none_or(|from| work.date >= from))
            .filter(|work| to.is_none_or(|to| work.date <= to))
            .collect(),
    };

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&works)?)?;
    } else {
        write_works(writer, &works)?;
    }
    Ok(())
}

/// Writes sessions as an aligned table.
pub fn write_works<W: Write>(writer: &mut W, works: &[WorkSession]) -> Result<()> {
    if works.is_empty() {
        writeln!(writer, "No work sessions recorded.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<10}  {:>6}  {:>9}  {:<28}  Description",
        "Date", "Hours", "Amount", "Types"
    )?;
    for work in works {
        writeln!(
            writer,
            "{:<10}  {:>6}  {:>9}  {:<28}  {}",
            format_work_date(work.date),
            format_hours(work.hours),
            format_money(work.amount),
            format_types(&work.types),
            work.description
        )?;
        writeln!(writer, "{:<10}  id {}", "", work.id)?;
    }
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, db: &mut Database, id: &str) -> Result<()> {
    if !db.delete_work(id)? {
        bail!("no work session with ID {id}");
    }
    writeln!(writer, "Deleted work session {id}")?;
    Ok(())
}
