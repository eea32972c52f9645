//! Storage layer for routine-store.
//!
//! Provides persistent storage for routines, their exercises and the usage
//! log using `SQLite`. Composite writes run inside a single transaction.

pub mod schema;
pub mod seed;
pub mod sqlite;
pub mod traits;

pub use schema::{CURRENT_SCHEMA_VERSION, SCHEMA_SQL};
pub use sqlite::SqliteRoutineStore;
pub use traits::{RoutineStore, StoreStats};

/// Default database path relative to the working directory.
pub const DEFAULT_DB_PATH: &str = ".routines/routines.db";
