//! Error types for routine-store operations.
//!
//! This module provides the error hierarchy using `thiserror` for storage,
//! input validation and CLI commands.

use thiserror::Error;

/// Result type alias for routine-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage-related errors (database operations).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input rejected before it reached storage.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Storage-specific errors for database operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Storage not initialized (init command not run).
    #[error("routine database not initialized. Run: routine-store init")]
    NotInitialized,

    /// Routine not found by ID.
    #[error("routine not found: {id}")]
    RoutineNotFound {
        /// Routine ID that was not found.
        id: i64,
    },

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),
}

/// Input validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A required name was empty or only whitespace.
    #[error("{field} name must not be empty")]
    EmptyName {
        /// Which name was empty ("routine" or "exercise").
        field: &'static str,
    },

    /// A numeric field was negative or not a finite number.
    #[error("{field} must be a non-negative number")]
    NegativeValue {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A routine was saved without any exercise.
    #[error("a routine needs at least one exercise")]
    NoExercises,

    /// An exercise argument could not be parsed.
    #[error("invalid exercise: {0}")]
    InvalidExercise(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}
