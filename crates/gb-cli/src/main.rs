use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gb_cli::commands::expense::ExpenseAction;
use gb_cli::commands::{expense, import, invoice, log, predict, split, stats, status, weather, works};
use gb_cli::{Cli, Commands, Config};

/// Open the database, ensuring the parent directory exists.
fn open_database(config: &Config) -> Result<gb_db::Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    gb_db::Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Log(args) => {
            let mut db = open_database(&config)?;
            log::run(&mut out, &mut db, args, &config.rate_card()?)?;
        }
        Commands::Works(args) => {
            let db = open_database(&config)?;
            works::run(&mut out, &db, args)?;
        }
        Commands::DeleteWork { id } => {
            let mut db = open_database(&config)?;
            works::delete(&mut out, &mut db, id)?;
        }
        Commands::Expense(action) => {
            let mut db = open_database(&config)?;
            match action {
                ExpenseAction::Add(args) => {
                    expense::add(&mut out, &mut db, args)?;
                }
                ExpenseAction::List { json } => expense::list(&mut out, &db, *json)?,
                ExpenseAction::Delete { id } => expense::delete(&mut out, &mut db, id)?,
            }
        }
        Commands::Import(args) => {
            let mut db = open_database(&config)?;
            import::run(&mut out, &mut db, args, &config.rate_card()?)?;
        }
        Commands::Predict(args) => {
            let db = open_database(&config)?;
            predict::run(&mut out, &db, args, config.overdue)?;
        }
        Commands::Split(args) => {
            // Split needs only the share table, not the database
            split::run(&mut out, args, &config.share_table()?)?;
        }
        Commands::Invoice(args) => {
            let db = open_database(&config)?;
            invoice::run(&mut out, &db, args, &config.share_table()?)?;
        }
        Commands::Stats(args) => {
            let db = open_database(&config)?;
            stats::run(&mut out, &db, args)?;
        }
        Commands::Weather(args) => {
            weather::run(&mut out, args, &config.weather)?;
        }
        Commands::Status => {
            let db = open_database(&config)?;
            status::run(&mut out, &db, &config)?;
        }
    }

    out.flush()?;
    Ok(())
}
