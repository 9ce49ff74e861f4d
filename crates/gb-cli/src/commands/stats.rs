//! Stats command for the work dashboard.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use gb_core::{WorkStats, format_work_date};
use gb_db::Database;

use super::util::{format_hours, format_money, format_types, parse_date_arg, today_or};

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Reference date; defaults to today.
    #[arg(long, value_parser = parse_date_arg)]
    pub today: Option<NaiveDate>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, args: &StatsArgs) -> Result<()> {
    let works = db.list_works()?;
    let stats = WorkStats::compute(&works, today_or(args.today));

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
        return Ok(());
    }

    writeln!(
        writer,
        "Overall: {} sessions, {}, {}",
        stats.overall.count,
        format_hours(stats.overall.hours),
        format_money(stats.overall.amount)
    )?;

    if !stats.by_type.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "By type")?;
        for (work_type, totals) in &stats.by_type {
            writeln!(
                writer,
                "  {:<20} {:>3}  {:>7}  {:>10}",
                work_type.as_str(),
                totals.count,
                format_hours(totals.hours),
                format_money(totals.amount)
            )?;
        }
    }

    writeln!(writer)?;
    writeln!(writer, "Last 7 days")?;
    if stats.recent.is_empty() {
        writeln!(writer, "  (none)")?;
    }
    for work in &stats.recent {
        writeln!(
            writer,
            "  {}  {}  {}",
            format_work_date(work.date),
            format_types(&work.types),
            format_money(work.amount)
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "Monthly")?;
    for month in &stats.monthly {
        writeln!(
            writer,
            "  {:04}-{:02}  {:>3}  {:>7}  {:>10}",
            month.year,
            month.month,
            month.totals.count,
            format_hours(month.totals.hours),
            format_money(month.totals.amount)
        )?;
    }
    Ok(())
}
