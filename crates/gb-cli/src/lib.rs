//! Garden bookkeeping CLI library.
//!
//! This crate provides the CLI interface for garden bookkeeping.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{Config, WeatherConfig};
