//! Core domain models for routine-store.
//!
//! Plain data records for routines, their exercises and the usage log,
//! with no I/O dependencies.

pub mod routine;
pub mod usage;

pub use routine::{ExerciseSpec, Routine, RoutineDraft, RoutineExercise, validate_name};
pub use usage::{
    CalendarEntry, RoutineUsage, RoutineUsageStat, TrainingSummary, UsageLogEntry, UsageStat,
};
