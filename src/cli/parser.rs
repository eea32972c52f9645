//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::core::ExerciseSpec;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// routine-store: workout routines, their exercises and a training log.
///
/// Keeps reusable templates, clones them into dated sessions and reports
/// how often each routine was trained.
#[derive(Parser, Debug)]
#[command(name = "routine-store")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the routine database file.
    ///
    /// Defaults to `.routines/routines.db` in the current directory.
    #[arg(short, long, env = "ROUTINE_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the routine database.
    ///
    /// Creates the database file and schema, seeding example templates.
    /// An older database is migrated in place.
    Init {
        /// Delete the existing file first (destroys existing data).
        #[arg(short, long)]
        force: bool,
    },

    /// Show database status.
    Status,

    /// Delete all routines and log entries (keeps the schema).
    Reset {
        /// Skip confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Drop and recreate every table, then re-seed.
    Rebuild {
        /// Skip confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List templates (or instances).
    #[command(alias = "ls")]
    List {
        /// List dated instances instead of templates.
        #[arg(short, long)]
        instances: bool,
    },

    /// Show a routine with its exercises.
    Show {
        /// Routine ID.
        id: i64,
    },

    /// Create a routine.
    ///
    /// Without `--date` the routine is a template; with a date it is an
    /// instance logged on that day.
    Create {
        /// Routine name.
        name: String,

        /// Day the routine was trained (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Exercise as `name:sets:reps:weight` (repeatable).
        #[arg(short, long = "exercise", value_name = "NAME:SETS:REPS:WEIGHT")]
        exercises: Vec<ExerciseSpec>,
    },

    /// Rename a routine and/or replace its exercises.
    Edit {
        /// Routine ID.
        id: i64,

        /// New name.
        #[arg(short, long)]
        name: Option<String>,

        /// Replacement exercise list as `name:sets:reps:weight` (repeatable).
        #[arg(short, long = "exercise", value_name = "NAME:SETS:REPS:WEIGHT")]
        exercises: Vec<ExerciseSpec>,
    },

    /// Copy a routine into a new instance.
    Duplicate {
        /// Routine ID.
        id: i64,
    },

    /// Train a template on a day: copy it and log the copy.
    Use {
        /// Template ID.
        template_id: i64,

        /// Day (YYYY-MM-DD).
        date: NaiveDate,
    },

    /// Log an existing routine on a day.
    Log {
        /// Routine ID.
        routine_id: i64,

        /// Day (YYYY-MM-DD).
        date: NaiveDate,
    },

    /// Show the routines trained on a day.
    Day {
        /// Day (YYYY-MM-DD).
        date: NaiveDate,
    },

    /// Show the training log.
    Calendar {
        /// First day to include (YYYY-MM-DD).
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD).
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Show training statistics.
    Stats {
        /// Group by routine ID instead of routine name.
        #[arg(long)]
        by_routine: bool,
    },

    /// Delete a routine with its exercises and log entries.
    #[command(alias = "rm")]
    Delete {
        /// Routine ID.
        id: i64,

        /// Skip confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::storage::DEFAULT_DB_PATH))
    }
}
