//! Invoice command for billing a period and splitting it by millesimi.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use gb_core::{Invoice, InvoicePeriod, ShareTable, format_work_date};
use gb_db::Database;

use super::expense::write_expenses;
use super::split::write_allocations;
use super::util::{format_hours, format_money, parse_date_arg};
use super::works::write_works;

#[derive(Debug, Args)]
pub struct InvoiceArgs {
    /// First day of the period.
    #[arg(long, value_parser = parse_date_arg)]
    pub from: NaiveDate,

    /// Last day of the period, included.
    #[arg(long, value_parser = parse_date_arg)]
    pub to: NaiveDate,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    args: &InvoiceArgs,
    shares: &ShareTable,
) -> Result<Option<Invoice>> {
    let period = InvoicePeriod::new(args.from, args.to)?;
    let works = db.list_works_in_range(period.start, period.end)?;
    let expenses = db.list_expenses_in_range(period.start, period.end)?;
    let invoice =
        Invoice::build(period, &works, &expenses, shares).context("failed to build invoice")?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&invoice)?)?;
        return Ok(invoice);
    }

    let Some(invoice) = invoice else {
        writeln!(
            writer,
            "Nothing to invoice between {} and {}.",
            format_work_date(period.start),
            format_work_date(period.end)
        )?;
        return Ok(None);
    };

    writeln!(
        writer,
        "Invoice {} - {}",
        format_work_date(period.start),
        format_work_date(period.end)
    )?;
    writeln!(writer)?;
    writeln!(writer, "Works")?;
    write_works(writer, &invoice.works)?;
    writeln!(writer)?;
    writeln!(writer, "Expenses")?;
    write_expenses(writer, &invoice.expenses)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "Works total     {} ({} sessions, {})",
        format_money(invoice.works_total),
        invoice.works.len(),
        format_hours(invoice.total_hours)
    )?;
    writeln!(
        writer,
        "Expenses total  {} ({} items)",
        format_money(invoice.expenses_total),
        invoice.expenses.len()
    )?;
    writeln!(
        writer,
        "Total           {} (rounded €{})",
        format_money(invoice.total),
        invoice.rounded_total()
    )?;
    writeln!(writer)?;
    writeln!(writer, "Split by millesimi")?;
    write_allocations(writer, &invoice.allocations)?;
    Ok(Some(invoice))
}
