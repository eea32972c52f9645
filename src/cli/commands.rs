//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::cli::output::{
    OutputFormat, format_calendar, format_day, format_json, format_routine, format_routine_list,
    format_routine_stats, format_stats, format_status,
};
use crate::cli::parser::{Cli, Commands};
use crate::core::{ExerciseSpec, Routine, RoutineDraft};
use crate::error::{CommandError, Error, Result, StorageError};
use crate::storage::{CURRENT_SCHEMA_VERSION, RoutineStore, SqliteRoutineStore};
use chrono::NaiveDate;
use std::path::Path;

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let db_path = cli.get_db_path();

    match &cli.command {
        Commands::Init { force } => cmd_init(&db_path, *force, format),
        Commands::Status => cmd_status(&db_path, format),
        Commands::Reset { yes } => cmd_reset(&db_path, *yes, format),
        Commands::Rebuild { yes } => cmd_rebuild(&db_path, *yes, format),
        Commands::List { instances } => cmd_list(&db_path, *instances, format),
        Commands::Show { id } => cmd_show(&db_path, *id, format),
        Commands::Create {
            name,
            date,
            exercises,
        } => cmd_create(&db_path, name, *date, exercises, format),
        Commands::Edit {
            id,
            name,
            exercises,
        } => cmd_edit(&db_path, *id, name.as_deref(), exercises, format),
        Commands::Duplicate { id } => cmd_duplicate(&db_path, *id, format),
        Commands::Use { template_id, date } => cmd_use(&db_path, *template_id, *date, format),
        Commands::Log { routine_id, date } => cmd_log(&db_path, *routine_id, *date, format),
        Commands::Day { date } => cmd_day(&db_path, *date, format),
        Commands::Calendar { from, to } => cmd_calendar(&db_path, *from, *to, format),
        Commands::Stats { by_routine } => cmd_stats(&db_path, *by_routine, format),
        Commands::Delete { id, yes } => cmd_delete(&db_path, *id, *yes, format),
    }
}

/// Opens storage and ensures it's initialized.
fn open_storage(db_path: &Path) -> Result<SqliteRoutineStore> {
    if !db_path.exists() {
        return Err(StorageError::NotInitialized.into());
    }

    let storage = SqliteRoutineStore::open(db_path)?;

    if !storage.is_initialized()? {
        return Err(StorageError::NotInitialized.into());
    }

    Ok(storage)
}

/// Looks up a routine, failing with `RoutineNotFound`.
fn require_routine(storage: &SqliteRoutineStore, id: i64) -> Result<Routine> {
    storage
        .get_routine(id)?
        .ok_or_else(|| StorageError::RoutineNotFound { id }.into())
}

/// Renders the outcome of a write: a text line or a JSON object.
fn format_write(message: String, value: &serde_json::Value, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => message,
        OutputFormat::Json => format_json(value),
    }
}

// ==================== Command Implementations ====================

fn cmd_init(db_path: &Path, force: bool, format: OutputFormat) -> Result<String> {
    if db_path.is_dir() {
        return Err(Error::Config {
            message: format!("database path is a directory: {}", db_path.display()),
        });
    }

    if force && db_path.exists() {
        std::fs::remove_file(db_path).map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to remove existing database: {e}"))
        })?;

        // Stale WAL files must not be replayed into the new database
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = db_path.as_os_str().to_owned();
            sidecar.push(suffix);
            let _ = std::fs::remove_file(sidecar);
        }
    }

    let existed = db_path.exists();
    let mut storage = SqliteRoutineStore::open(db_path)?;
    let before = storage.schema_version()?;
    storage.init()?;

    let message = if !existed || before == 0 {
        format!("Initialized routine database at: {}\n", db_path.display())
    } else if before < CURRENT_SCHEMA_VERSION {
        format!(
            "Migrated routine database at {} from schema v{before} to v{CURRENT_SCHEMA_VERSION}\n",
            db_path.display()
        )
    } else {
        format!(
            "Routine database at {} is already up to date (schema v{CURRENT_SCHEMA_VERSION})\n",
            db_path.display()
        )
    };

    let value = serde_json::json!({
        "path": db_path.to_string_lossy(),
        "previous_version": before,
        "schema_version": CURRENT_SCHEMA_VERSION,
    });
    Ok(format_write(message, &value, format))
}

fn cmd_status(db_path: &Path, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let stats = storage.stats()?;
    Ok(format_status(&stats, format))
}

fn cmd_reset(db_path: &Path, yes: bool, format: OutputFormat) -> Result<String> {
    if !yes {
        return Err(CommandError::ExecutionFailed(
            "Use --yes to confirm reset. This will delete all data.".to_string(),
        )
        .into());
    }

    let mut storage = open_storage(db_path)?;
    storage.reset()?;

    let value = serde_json::json!({ "reset": true });
    Ok(format_write(
        "Routine store reset successfully.\n".to_string(),
        &value,
        format,
    ))
}

fn cmd_rebuild(db_path: &Path, yes: bool, format: OutputFormat) -> Result<String> {
    if !yes {
        return Err(CommandError::ExecutionFailed(
            "Use --yes to confirm rebuild. All tables are dropped and re-seeded.".to_string(),
        )
        .into());
    }

    let mut storage = open_storage(db_path)?;
    let old_version = storage.schema_version()?;
    storage.upgrade_schema(old_version, CURRENT_SCHEMA_VERSION)?;

    let message =
        format!("Rebuilt routine database (schema v{old_version} -> v{CURRENT_SCHEMA_VERSION}).\n");
    let value = serde_json::json!({
        "previous_version": old_version,
        "schema_version": CURRENT_SCHEMA_VERSION,
    });
    Ok(format_write(message, &value, format))
}

fn cmd_list(db_path: &Path, instances: bool, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let routines = storage.list_routines(!instances)?;
    Ok(format_routine_list(&routines, format))
}

fn cmd_show(db_path: &Path, id: i64, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let routine = require_routine(&storage, id)?;
    let exercises = storage.list_exercises_for_routine(id)?;
    Ok(format_routine(&routine, &exercises, format))
}

fn cmd_create(
    db_path: &Path,
    name: &str,
    date: Option<NaiveDate>,
    exercises: &[ExerciseSpec],
    format: OutputFormat,
) -> Result<String> {
    let mut storage = open_storage(db_path)?;

    let draft = match date {
        Some(date) => RoutineDraft::on_date(name, date, exercises.to_vec()),
        None => RoutineDraft::template(name, exercises.to_vec()),
    };
    let id = storage.save_routine(&draft)?;

    let kind = if draft.is_template() {
        "template"
    } else {
        "instance"
    };
    let message = match date {
        Some(date) => format!(
            "Created {kind} {id}: {} (logged on {date})\n",
            draft.name.trim()
        ),
        None => format!("Created {kind} {id}: {}\n", draft.name.trim()),
    };
    let value = serde_json::json!({
        "routine_id": id,
        "name": draft.name.trim(),
        "is_template": draft.is_template(),
        "date": date,
        "exercise_count": exercises.len(),
    });
    Ok(format_write(message, &value, format))
}

fn cmd_edit(
    db_path: &Path,
    id: i64,
    name: Option<&str>,
    exercises: &[ExerciseSpec],
    format: OutputFormat,
) -> Result<String> {
    if name.is_none() && exercises.is_empty() {
        return Err(CommandError::InvalidArgument(
            "nothing to change: pass --name and/or --exercise".to_string(),
        )
        .into());
    }

    let mut storage = open_storage(db_path)?;
    let routine = require_routine(&storage, id)?;

    let name = name.unwrap_or(&routine.name);

    // A rename leaves the exercise list alone, even when it is empty
    let exercise_count = if exercises.is_empty() {
        storage.rename_routine(id, name)?;
        storage.list_exercises_for_routine(id)?.len()
    } else {
        let draft = RoutineDraft::edit(id, name, exercises.to_vec());
        storage.save_routine(&draft)?;
        draft.exercises.len()
    };
    let name = name.trim();

    let message = format!("Updated routine {id}: {name} ({exercise_count} exercises)\n");
    let value = serde_json::json!({
        "routine_id": id,
        "name": name,
        "exercise_count": exercise_count,
    });
    Ok(format_write(message, &value, format))
}

fn cmd_duplicate(db_path: &Path, id: i64, format: OutputFormat) -> Result<String> {
    let mut storage = open_storage(db_path)?;
    let new_id = storage.duplicate_routine(id)?;

    let message = format!("Duplicated routine {id} as instance {new_id}\n");
    let value = serde_json::json!({ "source_id": id, "routine_id": new_id });
    Ok(format_write(message, &value, format))
}

fn cmd_use(
    db_path: &Path,
    template_id: i64,
    date: NaiveDate,
    format: OutputFormat,
) -> Result<String> {
    let mut storage = open_storage(db_path)?;
    let template = require_routine(&storage, template_id)?;
    if !template.is_template {
        return Err(CommandError::InvalidArgument(format!(
            "routine {template_id} is not a template; use `log` to record it again"
        ))
        .into());
    }

    let instance_id = storage.schedule_template(template_id, date)?;

    let message = format!(
        "Logged {} on {date} as instance {instance_id}\n",
        template.name
    );
    let value = serde_json::json!({
        "template_id": template_id,
        "routine_id": instance_id,
        "date": date,
    });
    Ok(format_write(message, &value, format))
}

fn cmd_log(
    db_path: &Path,
    routine_id: i64,
    date: NaiveDate,
    format: OutputFormat,
) -> Result<String> {
    let mut storage = open_storage(db_path)?;
    let entry_id = storage.log_usage(date, routine_id)?;

    let message = format!("Logged routine {routine_id} on {date}\n");
    let value = serde_json::json!({
        "entry_id": entry_id,
        "routine_id": routine_id,
        "date": date,
    });
    Ok(format_write(message, &value, format))
}

fn cmd_day(db_path: &Path, date: NaiveDate, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let routines = storage.list_routines_for_date(date)?;
    Ok(format_day(date, &routines, format))
}

fn cmd_calendar(
    db_path: &Path,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    format: OutputFormat,
) -> Result<String> {
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(CommandError::InvalidArgument(format!(
            "--from {from} is after --to {to}"
        ))
        .into());
    }

    let storage = open_storage(db_path)?;
    let entries = storage.training_calendar(from, to)?;
    Ok(format_calendar(&entries, format))
}

fn cmd_stats(db_path: &Path, by_routine: bool, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let summary = storage.training_summary()?;

    if by_routine {
        let stats = storage.usage_stats_by_routine()?;
        Ok(format_routine_stats(&summary, &stats, format))
    } else {
        let stats = storage.usage_stats_by_template_name()?;
        Ok(format_stats(&summary, &stats, format))
    }
}

fn cmd_delete(db_path: &Path, id: i64, yes: bool, format: OutputFormat) -> Result<String> {
    if !yes {
        return Err(
            CommandError::ExecutionFailed("Use --yes to confirm deletion.".to_string()).into(),
        );
    }

    let mut storage = open_storage(db_path)?;
    let routine = require_routine(&storage, id)?;
    let deleted = storage.delete_routine(id)?;

    let message = format!("Deleted routine {id}: {}\n", routine.name);
    let value = serde_json::json!({
        "routine_id": id,
        "name": routine.name,
        "deleted": deleted,
    });
    Ok(format_write(message, &value, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, std::path::PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        (temp_dir, db_path)
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_cmd_init() {
        let (_temp_dir, db_path) = setup();
        let result = cmd_init(&db_path, false, OutputFormat::Text).unwrap();
        assert!(result.contains("Initialized"));
        assert!(db_path.exists());
    }

    #[test]
    fn test_cmd_init_twice_keeps_data() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();
        cmd_create(
            &db_path,
            "Mine",
            None,
            &[ExerciseSpec::new("Row", 3, 10, 40.0)],
            OutputFormat::Text,
        )
        .unwrap();

        let result = cmd_init(&db_path, false, OutputFormat::Text).unwrap();
        assert!(result.contains("up to date"));
        assert!(cmd_list(&db_path, false, OutputFormat::Text).unwrap().contains("Mine"));

        // --force starts over from the seed.
        cmd_init(&db_path, true, OutputFormat::Text).unwrap();
        assert!(!cmd_list(&db_path, false, OutputFormat::Text).unwrap().contains("Mine"));
    }

    #[test]
    fn test_cmd_init_directory_path() {
        let (temp_dir, _db_path) = setup();
        let err = cmd_init(temp_dir.path(), false, OutputFormat::Text).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_cmd_requires_init() {
        let (_temp_dir, db_path) = setup();
        let err = cmd_status(&db_path, OutputFormat::Text).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::NotInitialized)));
        assert!(!db_path.exists());
    }

    #[test]
    fn test_cmd_status() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();

        let result = cmd_status(&db_path, OutputFormat::Text).unwrap();
        assert!(result.contains("Templates:     4"));
    }

    #[test]
    fn test_cmd_reset() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();

        assert!(cmd_reset(&db_path, false, OutputFormat::Text).is_err());
        assert!(cmd_reset(&db_path, true, OutputFormat::Text).is_ok());

        let result = cmd_list(&db_path, false, OutputFormat::Text).unwrap();
        assert!(result.contains("No routines"));
    }

    #[test]
    fn test_cmd_reset_json() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();

        let json = cmd_reset(&db_path, true, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["reset"], true);
    }

    #[test]
    fn test_cmd_rebuild() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();
        cmd_reset(&db_path, true, OutputFormat::Text).unwrap();

        assert!(cmd_rebuild(&db_path, false, OutputFormat::Text).is_err());
        cmd_rebuild(&db_path, true, OutputFormat::Text).unwrap();

        let result = cmd_status(&db_path, OutputFormat::Text).unwrap();
        assert!(result.contains("Templates:     4"));

        let json = cmd_rebuild(&db_path, true, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["previous_version"], CURRENT_SCHEMA_VERSION);
        assert_eq!(value["schema_version"], CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_cmd_create_and_show() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();

        let json = cmd_create(
            &db_path,
            "Push Day",
            None,
            &[ExerciseSpec::new("Bench press", 4, 10, 60.0)],
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let id = value["routine_id"].as_i64().unwrap();
        assert_eq!(value["is_template"], true);

        let shown = cmd_show(&db_path, id, OutputFormat::Text).unwrap();
        assert!(shown.contains("Push Day"));
        assert!(shown.contains("Bench press"));
    }

    #[test]
    fn test_cmd_create_without_exercises() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();

        let err = cmd_create(&db_path, "Empty", None, &[], OutputFormat::Text).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_cmd_create_on_date() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();
        cmd_reset(&db_path, true, OutputFormat::Text).unwrap();

        cmd_create(
            &db_path,
            "Cardio",
            Some(day("2025-03-14")),
            &[ExerciseSpec::new("Run", 1, 1, 0.0)],
            OutputFormat::Text,
        )
        .unwrap();

        let result = cmd_day(&db_path, day("2025-03-14"), OutputFormat::Text).unwrap();
        assert!(result.contains("Cardio"));
    }

    #[test]
    fn test_cmd_edit() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();

        assert!(cmd_edit(&db_path, 1, None, &[], OutputFormat::Text).is_err());

        cmd_edit(&db_path, 1, Some("Renamed"), &[], OutputFormat::Text).unwrap();
        let shown = cmd_show(&db_path, 1, OutputFormat::Text).unwrap();
        assert!(shown.contains("Renamed"));
        // Exercises are kept when only the name changes.
        assert!(shown.contains("Bench press"));

        cmd_edit(
            &db_path,
            1,
            None,
            &[ExerciseSpec::new("Push-ups", 3, 20, 0.0)],
            OutputFormat::Text,
        )
        .unwrap();
        let shown = cmd_show(&db_path, 1, OutputFormat::Text).unwrap();
        assert!(shown.contains("Renamed"));
        assert!(shown.contains("Push-ups"));
        assert!(!shown.contains("Bench press"));
    }

    #[test]
    fn test_cmd_edit_rename_without_exercises() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();
        let id = open_storage(&db_path)
            .unwrap()
            .insert_routine("Bare", true)
            .unwrap();

        let json = cmd_edit(&db_path, id, Some("Mobility"), &[], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "Mobility");
        assert_eq!(value["exercise_count"], 0);

        let routine = require_routine(&open_storage(&db_path).unwrap(), id).unwrap();
        assert_eq!(routine.name, "Mobility");
    }

    #[test]
    fn test_cmd_use_and_stats() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();
        cmd_reset(&db_path, true, OutputFormat::Text).unwrap();

        cmd_create(
            &db_path,
            "Legs",
            None,
            &[ExerciseSpec::new("Squat", 4, 10, 70.0)],
            OutputFormat::Text,
        )
        .unwrap();
        let templates = open_storage(&db_path).unwrap().list_routines(true).unwrap();
        let template_id = templates[0].id;

        cmd_use(&db_path, template_id, day("2025-01-05"), OutputFormat::Text).unwrap();
        cmd_use(&db_path, template_id, day("2025-01-07"), OutputFormat::Text).unwrap();

        let stats = cmd_stats(&db_path, false, OutputFormat::Text).unwrap();
        assert!(stats.contains("Trained days:  2"));
        assert!(stats.contains("Most used:     Legs"));

        let by_routine = cmd_stats(&db_path, true, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&by_routine).unwrap();
        assert_eq!(value["routines"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_cmd_use_rejects_instance() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();

        let instances = open_storage(&db_path).unwrap().list_routines(false).unwrap();
        let err = cmd_use(&db_path, instances[0].id, day("2025-01-05"), OutputFormat::Text)
            .unwrap_err();
        assert!(matches!(err, Error::Command(CommandError::InvalidArgument(_))));
    }

    #[test]
    fn test_cmd_calendar() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();

        let all = cmd_calendar(&db_path, None, None, OutputFormat::Text).unwrap();
        assert!(all.contains("2025-06-10"));
        assert!(all.contains("2025-06-12"));

        let one = cmd_calendar(&db_path, Some(day("2025-06-11")), None, OutputFormat::Text).unwrap();
        assert!(!one.contains("2025-06-10"));

        let err = cmd_calendar(
            &db_path,
            Some(day("2025-06-12")),
            Some(day("2025-06-10")),
            OutputFormat::Text,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_cmd_delete() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();

        assert!(cmd_delete(&db_path, 1, false, OutputFormat::Text).is_err());
        assert!(cmd_delete(&db_path, 1, true, OutputFormat::Text).is_ok());
        assert!(cmd_show(&db_path, 1, OutputFormat::Text).is_err());
        assert!(cmd_delete(&db_path, 1, true, OutputFormat::Text).is_err());
    }

    #[test]
    fn test_cmd_delete_json() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();
        let name = require_routine(&open_storage(&db_path).unwrap(), 2).unwrap().name;

        let json = cmd_delete(&db_path, 2, true, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["routine_id"], 2);
        assert_eq!(value["name"], name.as_str());
        assert_eq!(value["deleted"], 1);
    }

    #[test]
    fn test_cmd_duplicate_and_log() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false, OutputFormat::Text).unwrap();

        let json = cmd_duplicate(&db_path, 2, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let copy = value["routine_id"].as_i64().unwrap();

        cmd_log(&db_path, copy, day("2025-07-01"), OutputFormat::Text).unwrap();
        let result = cmd_day(&db_path, day("2025-07-01"), OutputFormat::Text).unwrap();
        assert!(result.contains(&format!("[{copy}]")));
    }
}
