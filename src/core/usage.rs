//! Usage log records and the aggregates built from them.

use crate::core::Routine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Records that a routine instance was performed or scheduled on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLogEntry {
    /// Unique identifier assigned by the store.
    pub id: i64,

    /// Calendar date of the session.
    pub date: NaiveDate,

    /// Logged routine (an instance by convention).
    pub routine_id: i64,
}

/// A log entry joined with its routine's name, one cell of the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// The underlying log entry.
    #[serde(flatten)]
    pub entry: UsageLogEntry,

    /// Name of the logged routine.
    pub routine_name: String,
}

/// Usage of instance routines grouped by name.
///
/// Distinct instances sharing a name collapse into one row, so the
/// statistic cannot be traced back to individual routine ids. See
/// [`RoutineUsageStat`] for the per-id variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStat {
    /// Routine name.
    pub name: String,

    /// Number of log entries.
    pub count: usize,

    /// Most recent logged date.
    pub last_date: NaiveDate,
}

/// Usage of a single instance routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineUsageStat {
    /// Routine ID.
    pub routine_id: i64,

    /// Routine name.
    pub name: String,

    /// Number of log entries.
    pub count: usize,

    /// Most recent logged date.
    pub last_date: NaiveDate,
}

/// A routine together with how often it was logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineUsage {
    /// The routine.
    pub routine: Routine,

    /// Number of log entries referencing it.
    pub count: usize,
}

/// Header figures of the statistics view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Distinct dates with at least one logged routine.
    pub trained_days: usize,

    /// Total logged sessions of instance routines.
    pub sessions: usize,

    /// Name of the most used routine, if anything was logged.
    pub most_used_name: Option<String>,
}

impl TrainingSummary {
    /// Builds the summary from the distinct-day count and the name-grouped
    /// statistics (expected in count-descending order).
    #[must_use]
    pub fn from_stats(trained_days: usize, stats: &[UsageStat]) -> Self {
        Self {
            trained_days,
            sessions: stats.iter().map(|s| s.count).sum(),
            most_used_name: stats.first().map(|s| s.name.clone()),
        }
    }
}
