//! CLI layer for routine-store.
//!
//! Provides the command-line interface using clap, with commands for
//! initializing the database, editing routines, logging training days and
//! reading the calendar and statistics.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
