//! Log command for recording a work session.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Args;
use gb_core::{Cents, RateCard, WorkSession, WorkTypes, validate_hours};
use gb_db::Database;

use super::util::{format_hours, format_money, format_types, parse_date_arg, today_or};

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Day of the work; defaults to today.
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Work type; repeat for sessions covering several types.
    #[arg(short = 't', long = "type")]
    pub types: Vec<String>,

    /// Hours worked, e.g. 1.5.
    #[arg(long)]
    pub hours: f64,

    /// Short description of the work.
    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "")]
    pub notes: String,

    /// Fixed price overriding the rate card.
    #[arg(long)]
    pub price: Option<f64>,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    args: &LogArgs,
    rates: &RateCard,
) -> Result<WorkSession> {
    let types = WorkTypes::from_labels(&args.types);
    let custom_price = args
        .price
        .map(Cents::from_units)
        .transpose()
        .context("invalid price")?
        .filter(|price| *price > Cents::ZERO);
    if types.is_empty() && custom_price.is_none() {
        bail!("give at least one --type or a positive --price");
    }
    let hours = validate_hours(args.hours)?;

    let session = WorkSession {
        id: gb_db::new_record_id()?,
        date: today_or(args.date),
        amount: rates.price(&types, hours, custom_price),
        types,
        description: args.description.trim().to_string(),
        hours,
        notes: args.notes.trim().to_string(),
        custom_price,
    };
    db.insert_works(std::slice::from_ref(&session))?;
    tracing::debug!(id = %session.id, "logged work session");

    writeln!(
        writer,
        "Logged {}: {} {} {} {}",
        session.id,
        gb_core::format_work_date(session.date),
        format_types(&session.types),
        format_hours(session.hours),
        format_money(session.amount)
    )?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn rates() -> RateCard {
        RateCard::from_units(&BTreeMap::from([
            ("Taglio erba".to_string(), 15.0),
            ("Taglio siepe".to_string(), 20.0),
        ]))
        .unwrap()
    }

    fn args(types: &[&str], hours: f64, price: Option<f64>) -> LogArgs {
        LogArgs {
            date: NaiveDate::from_ymd_opt(2025, 4, 12),
            types: types.iter().map(|t| (*t).to_string()).collect(),
            hours,
            description: " Prato davanti ".to_string(),
            notes: String::new(),
            price,
        }
    }

    #[test]
    fn log_prices_from_rate_card() {
        let mut db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        let session = run(
            &mut output,
            &mut db,
            &args(&["Taglio erba", "Taglio siepe"], 2.0, None),
            &rates(),
        )
        .unwrap();

        assert_eq!(session.amount, Cents::new(3500));
        assert_eq!(session.description, "Prato davanti");
        assert_eq!(db.list_works().unwrap(), vec![session.clone()]);

        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output.replace(session.id.as_str(), "[ID]"),
            "Logged [ID]: 12/04/2025 Taglio erba, Taglio siepe 2h €35.00\n"
        );
    }

    #[test]
    fn log_with_custom_price_needs_no_type() {
        let mut db = Database::open_in_memory().unwrap();
        let session = run(&mut Vec::new(), &mut db, &args(&[], 3.0, Some(80.0)), &rates()).unwrap();
        assert_eq!(session.amount, Cents::new(8000));
        assert_eq!(session.custom_price, Some(Cents::new(8000)));
    }

    #[test]
    fn log_rejects_missing_type_and_price() {
        let mut db = Database::open_in_memory().unwrap();
        let err = run(&mut Vec::new(), &mut db, &args(&[" "], 1.0, None), &rates()).unwrap_err();
        assert!(err.to_string().contains("--type"));
        assert!(db.list_works().unwrap().is_empty());
    }

    #[test]
    fn log_rejects_non_positive_hours() {
        let mut db = Database::open_in_memory().unwrap();
        let err = run(
            &mut Vec::new(),
            &mut db,
            &args(&["Taglio erba"], 0.0, None),
            &rates(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("hours"));
    }
}
