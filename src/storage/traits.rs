//! Storage trait definition.
//!
//! Defines the contract the presentation layer calls into: schema
//! lifecycle, routine/exercise writes, the usage log and the aggregate
//! queries behind the calendar and statistics views.

use crate::core::{
    CalendarEntry, ExerciseSpec, Routine, RoutineDraft, RoutineExercise, RoutineUsage,
    RoutineUsageStat, TrainingSummary, UsageStat,
};
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;

/// Persistent store for routines, their exercises and the usage log.
///
/// Writes that touch more than one row (`duplicate_routine`,
/// `replace_exercises`, `delete_routine`, `schedule_template`,
/// `save_routine`) are all-or-nothing.
pub trait RoutineStore {
    /// Initializes storage (creates schema, seeds demo data, runs
    /// migrations).
    ///
    /// Idempotent: an initialized database is never re-seeded.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation or migration fails.
    fn init(&mut self) -> Result<()>;

    /// Checks if storage is initialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the check cannot be performed.
    fn is_initialized(&self) -> Result<bool>;

    /// Returns the stored schema version, 0 when uninitialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    fn schema_version(&self) -> Result<u32>;

    /// Rebuilds the schema from scratch.
    ///
    /// **Destroys all data**: every table is dropped, then [`init`] runs
    /// again and re-seeds. Ordinary version bumps go through the
    /// preserving migrations in `init`; this is the explicit escape hatch.
    ///
    /// [`init`]: RoutineStore::init
    ///
    /// # Errors
    ///
    /// Returns an error if `new_version` is not the version this build
    /// creates, or if dropping/recreating fails.
    fn upgrade_schema(&mut self, old_version: u32, new_version: u32) -> Result<()>;

    /// Deletes all rows but keeps the schema. Nothing is re-seeded.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    fn reset(&mut self) -> Result<()>;

    // ==================== Write Operations ====================

    /// Inserts a routine and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a storage error.
    fn insert_routine(&mut self, name: &str, is_template: bool) -> Result<i64>;

    /// Inserts one exercise into a routine and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid exercise, or
    /// `RoutineNotFound` if the routine does not exist.
    fn insert_exercise(&mut self, routine_id: i64, exercise: &ExerciseSpec) -> Result<i64>;

    /// Records that a routine was performed on `date`.
    ///
    /// No uniqueness check: logging the same pair twice creates two rows.
    ///
    /// # Errors
    ///
    /// Returns `RoutineNotFound` if the routine does not exist.
    fn log_usage(&mut self, date: NaiveDate, routine_id: i64) -> Result<i64>;

    /// Clones a routine into a new instance (`is_template = false`) with a
    /// deep copy of its exercises. Returns the new routine ID.
    ///
    /// Later edits to the source never reach the copy.
    ///
    /// # Errors
    ///
    /// Returns `RoutineNotFound` if `routine_id` does not exist.
    fn duplicate_routine(&mut self, routine_id: i64) -> Result<i64>;

    /// Renames a routine. Returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name.
    fn rename_routine(&mut self, routine_id: i64, new_name: &str) -> Result<usize>;

    /// Replaces the whole exercise list of a routine.
    ///
    /// # Errors
    ///
    /// Returns `RoutineNotFound` if the routine does not exist, or a
    /// validation error for any invalid exercise (nothing is changed then).
    fn replace_exercises(&mut self, routine_id: i64, exercises: &[ExerciseSpec]) -> Result<()>;

    /// Deletes a routine with its exercises and log entries.
    ///
    /// Returns the number of routine rows deleted (0 for an unknown ID).
    ///
    /// # Errors
    ///
    /// Returns an error if any deletion fails; nothing is deleted then.
    fn delete_routine(&mut self, routine_id: i64) -> Result<usize>;

    /// Clones `template_id` and logs the clone on `date`.
    ///
    /// Returns the new instance ID.
    ///
    /// # Errors
    ///
    /// Returns `RoutineNotFound` if the template does not exist.
    fn schedule_template(&mut self, template_id: i64, date: NaiveDate) -> Result<i64>;

    /// Saves the add/edit routine form. Returns the routine ID.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid draft, or
    /// `RoutineNotFound` when editing a routine that does not exist.
    fn save_routine(&mut self, draft: &RoutineDraft) -> Result<i64>;

    // ==================== Read Operations ====================

    /// Retrieves a routine by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_routine(&self, routine_id: i64) -> Result<Option<Routine>>;

    /// Lists templates (`true`) or instances (`false`), ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_routines(&self, is_template: bool) -> Result<Vec<Routine>>;

    /// Lists the routines logged on `date`, one entry per log row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_routines_for_date(&self, date: NaiveDate) -> Result<Vec<Routine>>;

    /// Lists the exercises of a routine. Empty for unknown routines.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_exercises_for_routine(&self, routine_id: i64) -> Result<Vec<RoutineExercise>>;

    /// Counts distinct dates in the usage log.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn count_distinct_trained_days(&self) -> Result<usize>;

    /// Returns the routine with the most log entries, grouped by ID.
    ///
    /// Ties go to the routine that was logged first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn most_used_routine(&self) -> Result<Option<RoutineUsage>>;

    /// Usage of instance routines grouped by routine **name**, most used
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn usage_stats_by_template_name(&self) -> Result<Vec<UsageStat>>;

    /// Usage of instance routines grouped by routine ID, most used first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn usage_stats_by_routine(&self) -> Result<Vec<RoutineUsageStat>>;

    /// Log entries with routine names between `from` and `to` (inclusive,
    /// both optional), ordered by date.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn training_calendar(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<CalendarEntry>>;

    /// Header figures of the statistics view.
    ///
    /// # Errors
    ///
    /// Returns an error if any underlying query fails.
    fn training_summary(&self) -> Result<TrainingSummary> {
        let trained_days = self.count_distinct_trained_days()?;
        let stats = self.usage_stats_by_template_name()?;
        Ok(TrainingSummary::from_stats(trained_days, &stats))
    }

    /// Gets storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if statistics cannot be gathered.
    fn stats(&self) -> Result<StoreStats>;
}

/// Storage statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Number of template routines.
    pub template_count: usize,
    /// Number of instance routines.
    pub instance_count: usize,
    /// Number of exercise rows.
    pub exercise_count: usize,
    /// Number of usage log entries.
    pub log_entry_count: usize,
    /// Distinct trained days.
    pub trained_days: usize,
    /// Schema version.
    pub schema_version: u32,
    /// Database file size in bytes (if applicable).
    pub db_size: Option<u64>,
}
