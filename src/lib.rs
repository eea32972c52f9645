//! # routine-store
//!
//! Persistence and aggregation layer for a workout tracker.
//!
//! Routines come in two kinds: reusable **templates** and dated
//! **instances** cloned from them. Each routine owns an ordered list of
//! exercises, and a usage log records which routine was performed on
//! which day. On top of that sit the calendar and statistics queries.
//!
//! ## Features
//!
//! - **`SQLite` Storage**: Foreign keys with cascading deletes and
//!   all-or-nothing composite writes
//! - **Seeding**: A fresh database starts with demonstration templates
//! - **Migrations**: Versioned, data-preserving schema upgrades
//! - **CLI**: `routine-store` binary with text and JSON output

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod error;
pub mod storage;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{
    CalendarEntry, ExerciseSpec, Routine, RoutineDraft, RoutineExercise, RoutineUsage,
    RoutineUsageStat, TrainingSummary, UsageLogEntry, UsageStat,
};

// Re-export storage types
pub use storage::{DEFAULT_DB_PATH, RoutineStore, SqliteRoutineStore, StoreStats};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
