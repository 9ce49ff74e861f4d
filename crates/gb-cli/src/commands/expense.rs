//! Expense commands for shared condominium purchases.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use gb_core::{Cents, Expense, format_work_date};
use gb_db::Database;

use super::util::{format_money, parse_date_arg, today_or};

/// Expense subcommands.
#[derive(Debug, Subcommand)]
pub enum ExpenseAction {
    /// Record a purchase.
    Add(AddArgs),

    /// List recorded expenses.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete an expense by ID.
    Delete {
        /// ID of the expense to delete.
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Purchase date; defaults to today.
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// What was bought.
    #[arg(long)]
    pub item: String,

    /// Price paid, e.g. 12.50.
    #[arg(long)]
    pub price: f64,

    /// Link to the receipt.
    #[arg(long)]
    pub receipt_url: Option<String>,
}

pub fn add<W: Write>(writer: &mut W, db: &mut Database, args: &AddArgs) -> Result<Expense> {
    let item = args.item.trim();
    if item.is_empty() {
        bail!("expense item cannot be empty");
    }
    let price = Cents::from_units(args.price).context("invalid price")?;

    let expense = Expense {
        id: gb_db::new_record_id()?,
        date: today_or(args.date),
        item: item.to_string(),
        price,
        receipt_url: args
            .receipt_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
    };
    db.insert_expenses(std::slice::from_ref(&expense))?;

    writeln!(
        writer,
        "Recorded expense {}: {} {} {}",
        expense.id,
        format_work_date(expense.date),
        expense.item,
        format_money(expense.price)
    )?;
    Ok(expense)
}

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let expenses = db.list_expenses()?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&expenses)?)?;
        return Ok(());
    }
    write_expenses(writer, &expenses)
}

/// Writes expenses as an aligned table.
pub fn write_expenses<W: Write>(writer: &mut W, expenses: &[Expense]) -> Result<()> {
    if expenses.is_empty() {
        writeln!(writer, "No expenses recorded.")?;
        return Ok(());
    }

    writeln!(writer, "{:<10}  {:>9}  Item", "Date", "Price")?;
    for expense in expenses {
        writeln!(
            writer,
            "{:<10}  {:>9}  {}",
            format_work_date(expense.date),
            format_money(expense.price),
            expense.item
        )?;
        match &expense.receipt_url {
            Some(url) => writeln!(writer, "{:<10}  id {}  receipt {url}", "", expense.id)?,
            None => writeln!(writer, "{:<10}  id {}", "", expense.id)?,
        }
    }
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, db: &mut Database, id: &str) -> Result<()> {
    if !db.delete_expense(id)? {
        bail!("no expense with ID {id}");
    }
    writeln!(writer, "Deleted expense {id}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn args(item: &str, price: f64, receipt_url: Option<&str>) -> AddArgs {
        AddArgs {
            date: NaiveDate::from_ymd_opt(2025, 5, 3),
            item: item.to_string(),
            price,
            receipt_url: receipt_url.map(str::to_string),
        }
    }

    #[test]
    fn add_then_list() {
        let mut db = Database::open_in_memory().unwrap();
        let first = add(&mut Vec::new(), &mut db, &args("Concime", 12.5, None)).unwrap();
        let mut later = args(" Sacchi verdi ", 7.99, Some("https://example.com/r/1.jpg"));
        later.date = NaiveDate::from_ymd_opt(2025, 5, 20);
        let second = add(&mut Vec::new(), &mut db, &later).unwrap();

        let mut output = Vec::new();
        list(&mut output, &db, false).unwrap();
        let output = String::from_utf8(output)
            .unwrap()
            .replace(first.id.as_str(), "[ID1]")
            .replace(second.id.as_str(), "[ID2]");

        assert_snapshot!(output, @r"
        Date            Price  Item
        03/05/2025     €12.50  Concime
                    id [ID1]
        20/05/2025      €7.99  Sacchi verdi
                    id [ID2]  receipt https://example.com/r/1.jpg
        ");
    }

    #[test]
    fn add_rejects_blank_item_and_negative_price() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(add(&mut Vec::new(), &mut db, &args("  ", 1.0, None)).is_err());
        assert!(add(&mut Vec::new(), &mut db, &args("Rastrello", -3.0, None)).is_err());
        assert!(db.list_expenses().unwrap().is_empty());
    }

    #[test]
    fn list_as_json() {
        let mut db = Database::open_in_memory().unwrap();
        add(&mut Vec::new(), &mut db, &args("Concime", 12.5, None)).unwrap();
        let mut output = Vec::new();
        list(&mut output, &db, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed[0]["item"], "Concime");
        assert_eq!(parsed[0]["price"], serde_json::json!(12.5));
        assert_eq!(parsed[0]["date"], "2025-05-03");
    }

    #[test]
    fn delete_removes_expense() {
        let mut db = Database::open_in_memory().unwrap();
        let expense = add(&mut Vec::new(), &mut db, &args("Concime", 12.5, None)).unwrap();
        let mut output = Vec::new();
        delete(&mut output, &mut db, expense.id.as_str()).unwrap();
        assert!(db.list_expenses().unwrap().is_empty());
        assert!(delete(&mut Vec::new(), &mut db, expense.id.as_str()).is_err());
    }
}
