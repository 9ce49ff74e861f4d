//! CLI subcommand implementations.

pub mod expense;
pub mod import;
pub mod invoice;
pub mod log;
pub mod predict;
pub mod split;
pub mod stats;
pub mod status;
mod util;
pub mod weather;
pub mod works;
