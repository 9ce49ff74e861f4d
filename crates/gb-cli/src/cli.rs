//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::expense::ExpenseAction;
use crate::commands::import::ImportArgs;
use crate::commands::invoice::InvoiceArgs;
use crate::commands::log::LogArgs;
use crate::commands::predict::PredictArgs;
use crate::commands::split::SplitArgs;
use crate::commands::stats::StatsArgs;
use crate::commands::weather::WeatherArgs;
use crate::commands::works::WorksArgs;

/// Garden maintenance bookkeeping.
///
/// Logs work sessions and shared expenses, forecasts when each kind of work
/// is next due, and splits costs among condominium units by millesimi.
#[derive(Debug, Parser)]
#[command(name = "gb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a work session.
    Log(LogArgs),

    /// List logged work sessions.
    Works(WorksArgs),

    /// Delete a work session by ID.
    DeleteWork {
        /// ID of the session to delete.
        id: String,
    },

    /// Manage shared expenses.
    #[command(subcommand)]
    Expense(ExpenseAction),

    /// Import work sessions from a JSON export.
    Import(ImportArgs),

    /// Forecast when each kind of work is next due.
    Predict(PredictArgs),

    /// Split an amount among the condominium units.
    Split(SplitArgs),

    /// Build the invoice for a period.
    Invoice(InvoiceArgs),

    /// Show work statistics.
    Stats(StatsArgs),

    /// Show current weather and forecast at the garden.
    Weather(WeatherArgs),

    /// Show database status.
    Status,
}
