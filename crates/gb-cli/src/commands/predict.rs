//! Predict command for forecasting recurring garden work.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use gb_core::{OverduePolicy, Prediction, PredictionConfig, format_work_date, predict_with};
use gb_db::Database;

use super::util::{parse_date_arg, today_or};

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Reference date; defaults to today.
    #[arg(long, value_parser = parse_date_arg)]
    pub today: Option<NaiveDate>,

    /// Also list work whose projected date has already passed.
    #[arg(long)]
    pub include_overdue: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    args: &PredictArgs,
    overdue: OverduePolicy,
) -> Result<()> {
    let today = today_or(args.today);
    let config = PredictionConfig {
        overdue: if args.include_overdue {
            OverduePolicy::Include
        } else {
            overdue
        },
    };
    let works = db.list_works()?;
    let predictions = predict_with(&works, today, config);

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&predictions)?)?;
    } else {
        write_predictions(writer, &predictions, today)?;
    }
    Ok(())
}

fn write_predictions<W: Write>(
    writer: &mut W,
    predictions: &[Prediction],
    today: NaiveDate,
) -> Result<()> {
    if predictions.is_empty() {
        writeln!(
            writer,
            "No upcoming work: each type needs at least two sessions on different days."
        )?;
        return Ok(());
    }

    for prediction in predictions {
        let days = (prediction.date - today).num_days();
        let when = match days {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            d if d < 0 => format!("overdue by {} days", -d),
            d => format!("in {d} days"),
        };
        writeln!(writer, "{} ({when})", format_work_date(prediction.date))?;
        for entry in &prediction.entries {
            writeln!(
                writer,
                "  {}: every ~{} days, last {}",
                entry.work_type,
                entry.average_interval_days,
                format_work_date(entry.last_occurrence)
            )?;
        }
    }
    Ok(())
}
