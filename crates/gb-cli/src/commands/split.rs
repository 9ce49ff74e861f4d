//! Split command for dividing an amount by millesimi.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use gb_core::{Allocation, ShareTable};

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Amount to split, e.g. 1000 or 249.90.
    pub total: f64,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &SplitArgs, shares: &ShareTable) -> Result<()> {
    let allocations = gb_core::split(args.total, shares)
        .with_context(|| format!("failed to split {}", args.total))?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&allocations)?)?;
    } else {
        write_allocations(writer, &allocations)?;
    }
    Ok(())
}

/// Writes one line per share plus the total.
pub fn write_allocations<W: Write>(writer: &mut W, allocations: &[Allocation]) -> Result<()> {
    let width = allocations
        .iter()
        .map(|allocation| allocation.label.as_str().chars().count())
        .max()
        .unwrap_or(0)
        .max("Total".len());

    for allocation in allocations {
        writeln!(
            writer,
            "{:<width$}  {:>8}  €{}",
            allocation.label.as_str(),
            allocation.weight.to_string(),
            allocation.amount
        )?;
    }
    let total: u64 = allocations.iter().map(|allocation| allocation.amount).sum();
    writeln!(writer, "{:<width$}  {:>8}  €{total}", "Total", "")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use gb_core::ShareConfig;
    use insta::assert_snapshot;

    fn shares() -> ShareTable {
        let shares = [
            ("Unit A", 201.055),
            ("Unit B", 304.419),
            ("Unit C", 290.081),
            ("Unit D", 204.445),
        ]
        .map(|(label, weight)| ShareConfig {
            label: label.to_string(),
            weight,
        });
        ShareTable::with_default_total(&shares).unwrap()
    }

    #[test]
    fn split_writes_table() {
        let mut output = Vec::new();
        run(
            &mut output,
            &SplitArgs {
                total: 1000.0,
                json: false,
            },
            &shares(),
        )
        .unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Unit A   201.055  €201
        Unit B   304.419  €305
        Unit C   290.081  €290
        Unit D   204.445  €204
        Total             €1000
        ");
    }

    #[test]
    fn split_writes_json() {
        let mut output = Vec::new();
        run(
            &mut output,
            &SplitArgs {
                total: 0.0,
                json: true,
            },
            &shares(),
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let amounts: Vec<u64> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|allocation| allocation["amount"].as_u64().unwrap())
            .collect();
        assert_eq!(amounts, vec![0, 0, 0, 0]);
        assert_eq!(parsed[0]["label"], "Unit A");
    }

    #[test]
    fn split_rejects_negative_total() {
        let err = run(
            &mut Vec::new(),
            &SplitArgs {
                total: -5.0,
                json: false,
            },
            &shares(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("cannot be negative"));
    }
}
