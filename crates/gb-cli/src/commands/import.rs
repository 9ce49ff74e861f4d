//! Import command for loading work sessions exported from the old web app.
//!
//! Accepts either a JSON array or one JSON object per line. Field names may
//! be the Italian ones used by the export (`data`, `tipi`/`tipo`,
//! `descrizione`, `durata`, `importo`, `note`, `prezzoPersonalizzato`) or
//! their English equivalents. Numbers may arrive as strings.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use gb_core::{Cents, RateCard, RecordId, WorkRecord, WorkSession, validate_hours};
use gb_db::Database;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// File to read, or `-` for stdin.
    #[arg(default_value = "-")]
    pub path: PathBuf,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    args: &ImportArgs,
    rates: &RateCard,
) -> Result<usize> {
    let works = if args.path.as_os_str() == "-" {
        parse_works(io::stdin().lock(), rates)?
    } else {
        let file = File::open(&args.path)
            .with_context(|| format!("failed to open {}", args.path.display()))?;
        parse_works(BufReader::new(file), rates)?
    };

    let inserted = db.insert_works(&works)?;
    tracing::debug!(read = works.len(), inserted, "imported work sessions");
    writeln!(
        writer,
        "Imported {inserted} work sessions ({} already present)",
        works.len() - inserted
    )?;
    Ok(inserted)
}

fn parse_works<R: BufRead>(mut reader: R, rates: &RateCard) -> Result<Vec<WorkSession>> {
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .context("failed to read input")?;

    let records: Vec<ImportWork> = if input.trim_start().starts_with('[') {
        serde_json::from_str(&input).context("invalid JSON array")?
    } else {
        input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line.trim())
                    .with_context(|| format!("invalid JSON on line {}", idx + 1))
            })
            .collect::<Result<_>>()?
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .into_session(index, rates)
                .with_context(|| format!("invalid work record {index}"))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ImportWork {
    #[serde(default)]
    id: Option<serde_json::Value>,

    #[serde(flatten)]
    record: WorkRecord,

    #[serde(default, alias = "descrizione")]
    description: Option<String>,

    #[serde(default, alias = "durata", deserialize_with = "loose_number")]
    hours: Option<f64>,

    #[serde(default, alias = "importo", deserialize_with = "loose_number")]
    amount: Option<f64>,

    #[serde(default, alias = "note")]
    notes: Option<String>,

    #[serde(
        default,
        alias = "prezzoPersonalizzato",
        deserialize_with = "loose_number"
    )]
    custom_price: Option<f64>,
}

impl ImportWork {
    fn into_session(self, index: usize, rates: &RateCard) -> Result<WorkSession> {
        let event = self.record.to_event(index)?;
        let hours = validate_hours(self.hours.ok_or_else(|| anyhow!("missing hours"))?)?;
        let custom_price = self
            .custom_price
            .map(Cents::from_units)
            .transpose()
            .context("invalid custom price")?
            .filter(|price| *price > Cents::ZERO);
        // A custom price always wins over the stored amount.
        let amount = match (custom_price, self.amount) {
            (Some(price), _) => price,
            (None, Some(amount)) => Cents::from_units(amount).context("invalid amount")?,
            (None, None) => rates.price(&event.types, hours, None),
        };
        let id = match self.id {
            Some(serde_json::Value::String(id)) => RecordId::new(id)?,
            Some(serde_json::Value::Number(id)) => RecordId::new(id.to_string())?,
            Some(serde_json::Value::Null) | None => gb_db::new_record_id()?,
            Some(other) => return Err(anyhow!("unsupported id {other}")),
        };

        Ok(WorkSession {
            id,
            date: event.date,
            types: event.types,
            description: self.description.unwrap_or_default().trim().to_string(),
            hours,
            amount,
            notes: self.notes.unwrap_or_default().trim().to_string(),
            custom_price,
        })
    }
}

/// Reads a number that may be encoded as a string; blank strings are absent.
fn loose_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(f64),
        Text(String),
    }

    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Number(value)) => Ok(Some(value)),
        Some(Loose::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.replace(',', ".")
                .parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid number {text:?}")))
        }
    }
}
