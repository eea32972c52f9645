//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::core::{
    CalendarEntry, Routine, RoutineExercise, RoutineUsageStat, TrainingSummary, UsageStat,
};
use crate::error::Error;
use crate::storage::StoreStats;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats a status response.
#[must_use]
pub fn format_status(stats: &StoreStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_status_text(stats),
        OutputFormat::Json => format_json(stats),
    }
}

fn format_status_text(stats: &StoreStats) -> String {
    let mut output = String::new();
    output.push_str("Routine Store Status\n");
    output.push_str("====================\n\n");
    let _ = writeln!(output, "  Templates:     {}", stats.template_count);
    let _ = writeln!(output, "  Instances:     {}", stats.instance_count);
    let _ = writeln!(output, "  Exercises:     {}", stats.exercise_count);
    let _ = writeln!(output, "  Log entries:   {}", stats.log_entry_count);
    let _ = writeln!(output, "  Trained days:  {}", stats.trained_days);
    let _ = writeln!(output, "  Schema:        v{}", stats.schema_version);
    if let Some(size) = stats.db_size {
        let _ = writeln!(output, "  DB size:       {}", format_size(size));
    }
    output
}

/// Formats a routine list.
#[must_use]
pub fn format_routine_list(routines: &[Routine], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_routine_list_text(routines),
        OutputFormat::Json => format_json(&routines),
    }
}

fn format_routine_list_text(routines: &[Routine]) -> String {
    if routines.is_empty() {
        return "No routines found.\n".to_string();
    }

    let mut output = String::new();
    let _ = writeln!(output, "{:<6} {:<10} Name", "ID", "Kind");
    output.push_str(&"-".repeat(50));
    output.push('\n');

    for routine in routines {
        let _ = writeln!(
            output,
            "{:<6} {:<10} {}",
            routine.id,
            routine.kind(),
            truncate(&routine.name, 40)
        );
    }

    output
}

/// Formats a single routine with its exercises.
#[must_use]
pub fn format_routine(
    routine: &Routine,
    exercises: &[RoutineExercise],
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => format_routine_text(routine, exercises),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct RoutineWithExercises<'a> {
                #[serde(flatten)]
                routine: &'a Routine,
                exercises: &'a [RoutineExercise],
            }
            format_json(&RoutineWithExercises { routine, exercises })
        }
    }
}

fn format_routine_text(routine: &Routine, exercises: &[RoutineExercise]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Routine: {}", routine.name);
    let _ = writeln!(output, "  ID:    {}", routine.id);
    let _ = writeln!(output, "  Kind:  {}", routine.kind());

    output.push('\n');
    if exercises.is_empty() {
        output.push_str("No exercises.\n");
        return output;
    }

    let _ = writeln!(
        output,
        "{:<28} {:>5} {:>5} {:>9}",
        "Exercise", "Sets", "Reps", "Weight"
    );
    output.push_str(&"-".repeat(50));
    output.push('\n');

    for exercise in exercises {
        let _ = writeln!(
            output,
            "{:<28} {:>5} {:>5} {:>9}",
            truncate(&exercise.name, 28),
            exercise.sets,
            exercise.reps,
            format_weight(exercise.weight)
        );
    }

    output
}

/// Formats the routines trained on one day.
#[must_use]
pub fn format_day(date: NaiveDate, routines: &[Routine], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if routines.is_empty() {
                return format!("Nothing trained on {date}.\n");
            }
            let mut output = String::new();
            let _ = writeln!(output, "Trained on {date}:");
            for routine in routines {
                let _ = writeln!(output, "  [{}] {}", routine.id, routine.name);
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Day<'a> {
                date: NaiveDate,
                routines: &'a [Routine],
            }
            format_json(&Day { date, routines })
        }
    }
}

/// Formats the training log.
#[must_use]
pub fn format_calendar(entries: &[CalendarEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_calendar_text(entries),
        OutputFormat::Json => format_json(&entries),
    }
}

fn format_calendar_text(entries: &[CalendarEntry]) -> String {
    if entries.is_empty() {
        return "No training logged.\n".to_string();
    }

    let mut output = String::new();
    let mut current: Option<NaiveDate> = None;

    for entry in entries {
        if current != Some(entry.entry.date) {
            let _ = writeln!(output, "{}", entry.entry.date);
            current = Some(entry.entry.date);
        }
        let _ = writeln!(
            output,
            "  [{}] {}",
            entry.entry.routine_id, entry.routine_name
        );
    }

    output
}

/// Formats the statistics view: summary header plus per-name usage.
#[must_use]
pub fn format_stats(summary: &TrainingSummary, stats: &[UsageStat], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format_summary_text(summary);
            if !stats.is_empty() {
                output.push('\n');
                let _ = writeln!(output, "{:<30} {:>6}  Last", "Routine", "Uses");
                output.push_str(&"-".repeat(50));
                output.push('\n');
                for stat in stats {
                    let _ = writeln!(
                        output,
                        "{:<30} {:>6}  {}",
                        truncate(&stat.name, 30),
                        stat.count,
                        stat.last_date
                    );
                }
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Stats<'a> {
                summary: &'a TrainingSummary,
                routines: &'a [UsageStat],
            }
            format_json(&Stats {
                summary,
                routines: stats,
            })
        }
    }
}

/// Formats per-routine usage.
#[must_use]
pub fn format_routine_stats(
    summary: &TrainingSummary,
    stats: &[RoutineUsageStat],
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format_summary_text(summary);
            if !stats.is_empty() {
                output.push('\n');
                let _ = writeln!(output, "{:<6} {:<30} {:>6}  Last", "ID", "Routine", "Uses");
                output.push_str(&"-".repeat(56));
                output.push('\n');
                for stat in stats {
                    let _ = writeln!(
                        output,
                        "{:<6} {:<30} {:>6}  {}",
                        stat.routine_id,
                        truncate(&stat.name, 30),
                        stat.count,
                        stat.last_date
                    );
                }
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Stats<'a> {
                summary: &'a TrainingSummary,
                routines: &'a [RoutineUsageStat],
            }
            format_json(&Stats {
                summary,
                routines: stats,
            })
        }
    }
}

fn format_summary_text(summary: &TrainingSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Trained days:  {}", summary.trained_days);
    let _ = writeln!(output, "Sessions:      {}", summary.sessions);
    let _ = writeln!(
        output,
        "Most used:     {}",
        summary.most_used_name.as_deref().unwrap_or("-")
    );
    output
}

/// Formats an error for display.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "success": false,
                "error": error.to_string(),
            });
            format_json(&value)
        }
    }
}

/// Formats a value as JSON.
pub(crate) fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a weight without a trailing `.0` for whole numbers.
fn format_weight(weight: f64) -> String {
    if weight.fract().abs() < f64::EPSILON {
        format!("{weight:.0}")
    } else {
        format!("{weight:.1}")
    }
}

/// Formats a byte size as human-readable.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Truncates a string to max characters with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    fn routine(id: i64, name: &str, is_template: bool) -> Routine {
        Routine {
            id,
            name: name.to_string(),
            is_template,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("unknown"), OutputFormat::Text);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(100), "100 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(60.0), "60");
        assert_eq!(format_weight(12.5), "12.5");
        assert_eq!(format_weight(0.0), "0");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("Prensa banca inclinada", 10), "Prensa ...");
        assert_eq!(truncate("Ñandú", 3), "Ñan");
    }

    #[test]
    fn test_format_status() {
        let stats = StoreStats {
            template_count: 4,
            instance_count: 2,
            exercise_count: 18,
            log_entry_count: 2,
            trained_days: 2,
            schema_version: 2,
            db_size: Some(4096),
        };

        let text = format_status(&stats, OutputFormat::Text);
        assert!(text.contains("Templates:     4"));
        assert!(text.contains("Log entries:   2"));
        assert!(text.contains("4.0 KB"));

        let json = format_status(&stats, OutputFormat::Json);
        assert!(json.contains("\"template_count\": 4"));
    }

    #[test]
    fn test_format_routine_list() {
        assert_eq!(
            format_routine_list(&[], OutputFormat::Text),
            "No routines found.\n"
        );

        let routines = vec![routine(1, "Push Day", true), routine(5, "Push Day", false)];
        let text = format_routine_list(&routines, OutputFormat::Text);
        assert!(text.contains("template"));
        assert!(text.contains("instance"));

        let json = format_routine_list(&routines, OutputFormat::Json);
        let parsed: Vec<Routine> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, routines);
    }

    #[test]
    fn test_format_routine_json_flattens() {
        let exercises = vec![RoutineExercise {
            id: 1,
            routine_id: 3,
            name: "Bench press".to_string(),
            sets: 4,
            reps: 10,
            weight: 60.0,
        }];
        let json = format_routine(&routine(3, "Push Day", true), &exercises, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["exercises"][0]["name"], "Bench press");

        let text = format_routine(&routine(3, "Push Day", true), &exercises, OutputFormat::Text);
        assert!(text.contains("Bench press"));
        assert!(text.contains("60"));
    }

    #[test]
    fn test_format_calendar_groups_by_day() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let entries = vec![
            CalendarEntry {
                entry: crate::core::UsageLogEntry {
                    id: 1,
                    date: day,
                    routine_id: 5,
                },
                routine_name: "Legs".to_string(),
            },
            CalendarEntry {
                entry: crate::core::UsageLogEntry {
                    id: 2,
                    date: day,
                    routine_id: 6,
                },
                routine_name: "Core".to_string(),
            },
        ];

        let text = format_calendar(&entries, OutputFormat::Text);
        assert_eq!(text.matches("2025-06-10").count(), 1);
        assert!(text.contains("[5] Legs"));
        assert!(text.contains("[6] Core"));
    }

    #[test]
    fn test_format_stats_empty() {
        let text = format_stats(&TrainingSummary::default(), &[], OutputFormat::Text);
        assert!(text.contains("Trained days:  0"));
        assert!(text.contains("Most used:     -"));
    }

    #[test]
    fn test_format_error_json() {
        let err: Error = StorageError::RoutineNotFound { id: 9 }.into();
        let json = format_error(&err, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("routine not found: 9"));
    }
}
