//! `SQLite` storage implementation.
//!
//! Provides persistent storage using `SQLite` with transactional composite
//! writes and versioned migrations.

// SQLite stores all integers as i64. Counts are never negative.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::core::{
    CalendarEntry, ExerciseSpec, Routine, RoutineDraft, RoutineExercise, RoutineUsage,
    RoutineUsageStat, UsageLogEntry, UsageStat, validate_name,
};
use crate::error::{Result, StorageError};
use crate::storage::schema::{
    CHECK_LEGACY_SQL, CHECK_SCHEMA_SQL, CURRENT_SCHEMA_VERSION, DROP_SQL, GET_VERSION_SQL,
    LEGACY_SCHEMA_VERSION, SCHEMA_INFO_SQL, SCHEMA_SQL, SET_VERSION_SQL, get_migrations_from,
};
use crate::storage::seed::{SEED_TEMPLATES, sessions};
use crate::storage::traits::{RoutineStore, StoreStats};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// SQLite-based routine store.
///
/// # Examples
///
/// ```no_run
/// use routine_store::storage::{RoutineStore, SqliteRoutineStore};
///
/// let mut store = SqliteRoutineStore::open("routines.db").unwrap();
/// store.init().unwrap();
/// let templates = store.list_routines(true).unwrap();
/// ```
pub struct SqliteRoutineStore {
    /// `SQLite` connection.
    conn: Connection,
    /// Path to the database file (None for in-memory).
    path: Option<PathBuf>,
}

/// What `init` found in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaState {
    /// No tables at all.
    Fresh,
    /// Routine tables without version tracking.
    Legacy,
    /// Tracked at the given version.
    Versioned(u32),
}

impl SqliteRoutineStore {
    /// Opens or creates a `SQLite` database at the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the database file. Missing parent directories
    ///   are created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Database(e.to_string()))?;
        }

        let conn = Connection::open(&path).map_err(StorageError::from)?;

        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;

        // journal_mode returns the resulting mode as a row
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(StorageError::from)?;

        debug!(path = %path.display(), "opened routine database");

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Creates an in-memory `SQLite` database.
    ///
    /// Useful for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;

        Ok(Self { conn, path: None })
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn begin(&mut self) -> Result<Transaction<'_>> {
        Ok(self
            .conn
            .transaction()
            .map_err(|e| StorageError::Transaction(e.to_string()))?)
    }
}

fn commit(tx: Transaction<'_>) -> Result<()> {
    tx.commit()
        .map_err(|e| StorageError::Transaction(e.to_string()))?;
    Ok(())
}

impl RoutineStore for SqliteRoutineStore {
    fn init(&mut self) -> Result<()> {
        let tx = self.begin()?;

        match detect_state(&tx)? {
            SchemaState::Fresh => {
                create_schema(&tx)?;
                info!(version = CURRENT_SCHEMA_VERSION, "created routine schema");
            }
            SchemaState::Legacy => {
                tx.execute_batch(SCHEMA_INFO_SQL)
                    .map_err(StorageError::from)?;
                set_schema_version(&tx, LEGACY_SCHEMA_VERSION)?;
                migrate(&tx, LEGACY_SCHEMA_VERSION)?;
            }
            SchemaState::Versioned(version) if version < CURRENT_SCHEMA_VERSION => {
                migrate(&tx, version)?;
            }
            SchemaState::Versioned(version) if version > CURRENT_SCHEMA_VERSION => {
                return Err(StorageError::Migration(format!(
                    "database schema v{version} is newer than supported v{CURRENT_SCHEMA_VERSION}"
                ))
                .into());
            }
            SchemaState::Versioned(_) => {}
        }

        commit(tx)
    }

    fn is_initialized(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count > 0)
    }

    fn schema_version(&self) -> Result<u32> {
        if !self.is_initialized()? {
            return Ok(0);
        }
        Ok(get_schema_version(&self.conn)?.unwrap_or(0))
    }

    fn upgrade_schema(&mut self, old_version: u32, new_version: u32) -> Result<()> {
        if new_version != CURRENT_SCHEMA_VERSION {
            return Err(StorageError::Migration(format!(
                "cannot rebuild schema as v{new_version}; this build creates v{CURRENT_SCHEMA_VERSION}"
            ))
            .into());
        }

        warn!(
            old_version,
            new_version, "rebuilding schema, all stored routines are discarded"
        );

        let tx = self.begin()?;
        tx.execute_batch(DROP_SQL).map_err(StorageError::from)?;
        create_schema(&tx)?;
        commit(tx)
    }

    fn reset(&mut self) -> Result<()> {
        let tx = self.begin()?;
        tx.execute_batch(
            r"
            DELETE FROM usage_log;
            DELETE FROM routine_exercises;
            DELETE FROM routines;
        ",
        )
        .map_err(StorageError::from)?;
        commit(tx)?;
        info!("routine store reset");
        Ok(())
    }

    // ==================== Write Operations ====================

    fn insert_routine(&mut self, name: &str, is_template: bool) -> Result<i64> {
        insert_routine_row(&self.conn, name, is_template)
    }

    fn insert_exercise(&mut self, routine_id: i64, exercise: &ExerciseSpec) -> Result<i64> {
        require_routine(&self.conn, routine_id)?;
        insert_exercise_row(&self.conn, routine_id, exercise)
    }

    fn log_usage(&mut self, date: NaiveDate, routine_id: i64) -> Result<i64> {
        log_usage_row(&self.conn, date, routine_id)
    }

    fn duplicate_routine(&mut self, routine_id: i64) -> Result<i64> {
        let tx = self.begin()?;
        let new_id = duplicate_in(&tx, routine_id)?;
        commit(tx)?;
        Ok(new_id)
    }

    fn rename_routine(&mut self, routine_id: i64, new_name: &str) -> Result<usize> {
        rename_in(&self.conn, routine_id, new_name)
    }

    fn replace_exercises(&mut self, routine_id: i64, exercises: &[ExerciseSpec]) -> Result<()> {
        let tx = self.begin()?;
        replace_in(&tx, routine_id, exercises)?;
        commit(tx)
    }

    fn delete_routine(&mut self, routine_id: i64) -> Result<usize> {
        let tx = self.begin()?;

        let exercises = tx
            .execute(
                "DELETE FROM routine_exercises WHERE routine_id = ?",
                params![routine_id],
            )
            .map_err(StorageError::from)?;
        let entries = tx
            .execute("DELETE FROM usage_log WHERE routine_id = ?", params![routine_id])
            .map_err(StorageError::from)?;
        let deleted = tx
            .execute("DELETE FROM routines WHERE id = ?", params![routine_id])
            .map_err(StorageError::from)?;

        commit(tx)?;
        debug!(routine_id, exercises, entries, deleted, "deleted routine");
        Ok(deleted)
    }

    fn schedule_template(&mut self, template_id: i64, date: NaiveDate) -> Result<i64> {
        let tx = self.begin()?;
        let instance_id = duplicate_in(&tx, template_id)?;
        log_usage_row(&tx, date, instance_id)?;
        commit(tx)?;
        Ok(instance_id)
    }

    fn save_routine(&mut self, draft: &RoutineDraft) -> Result<i64> {
        draft.validate()?;

        let tx = self.begin()?;
        let routine_id = match draft.id {
            None => {
                let id = insert_routine_row(&tx, &draft.name, draft.is_template())?;
                for exercise in &draft.exercises {
                    insert_exercise_row(&tx, id, exercise)?;
                }
                if let Some(date) = draft.date {
                    log_usage_row(&tx, date, id)?;
                }
                id
            }
            Some(id) => {
                require_routine(&tx, id)?;
                rename_in(&tx, id, &draft.name)?;
                replace_in(&tx, id, &draft.exercises)?;
                id
            }
        };
        commit(tx)?;

        Ok(routine_id)
    }

    // ==================== Read Operations ====================

    fn get_routine(&self, routine_id: i64) -> Result<Option<Routine>> {
        fetch_routine(&self.conn, routine_id)
    }

    fn list_routines(&self, is_template: bool) -> Result<Vec<Routine>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, is_template FROM routines WHERE is_template = ? ORDER BY id")
            .map_err(StorageError::from)?;

        let routines = stmt
            .query_map(params![is_template], routine_from_row)
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(routines)
    }

    fn list_routines_for_date(&self, date: NaiveDate) -> Result<Vec<Routine>> {
        let mut stmt = self
            .conn
            .prepare(
                r"
            SELECT r.id, r.name, r.is_template
            FROM usage_log l
            JOIN routines r ON r.id = l.routine_id
            WHERE l.date = ?
            ORDER BY l.id
        ",
            )
            .map_err(StorageError::from)?;

        let routines = stmt
            .query_map(params![date], routine_from_row)
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(routines)
    }

    fn list_exercises_for_routine(&self, routine_id: i64) -> Result<Vec<RoutineExercise>> {
        fetch_exercises(&self.conn, routine_id)
    }

    fn count_distinct_trained_days(&self) -> Result<usize> {
        count(&self.conn, "SELECT COUNT(DISTINCT date) FROM usage_log")
    }

    fn most_used_routine(&self) -> Result<Option<RoutineUsage>> {
        let usage = self
            .conn
            .query_row(
                r"
            SELECT r.id, r.name, r.is_template, COUNT(l.id) AS uses
            FROM usage_log l
            JOIN routines r ON r.id = l.routine_id
            GROUP BY r.id
            ORDER BY uses DESC, MIN(l.id) ASC
            LIMIT 1
        ",
                [],
                |row| {
                    Ok(RoutineUsage {
                        routine: routine_from_row(row)?,
                        count: row.get::<_, i64>(3)? as usize,
                    })
                },
            )
            .optional()
            .map_err(StorageError::from)?;

        Ok(usage)
    }

    fn usage_stats_by_template_name(&self) -> Result<Vec<UsageStat>> {
        let mut stmt = self
            .conn
            .prepare(
                r"
            SELECT r.name, COUNT(l.id) AS uses, MAX(l.date) AS last_date
            FROM routines r
            JOIN usage_log l ON l.routine_id = r.id
            WHERE r.is_template = 0
            GROUP BY r.name
            ORDER BY uses DESC, r.name ASC
        ",
            )
            .map_err(StorageError::from)?;

        let stats = stmt
            .query_map([], |row| {
                Ok(UsageStat {
                    name: row.get(0)?,
                    count: row.get::<_, i64>(1)? as usize,
                    last_date: row.get(2)?,
                })
            })
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(stats)
    }

    fn usage_stats_by_routine(&self) -> Result<Vec<RoutineUsageStat>> {
        let mut stmt = self
            .conn
            .prepare(
                r"
            SELECT r.id, r.name, COUNT(l.id) AS uses, MAX(l.date) AS last_date
            FROM routines r
            JOIN usage_log l ON l.routine_id = r.id
            WHERE r.is_template = 0
            GROUP BY r.id
            ORDER BY uses DESC, r.id ASC
        ",
            )
            .map_err(StorageError::from)?;

        let stats = stmt
            .query_map([], |row| {
                Ok(RoutineUsageStat {
                    routine_id: row.get(0)?,
                    name: row.get(1)?,
                    count: row.get::<_, i64>(2)? as usize,
                    last_date: row.get(3)?,
                })
            })
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(stats)
    }

    fn training_calendar(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<CalendarEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                r"
            SELECT l.id, l.date, l.routine_id, r.name
            FROM usage_log l
            JOIN routines r ON r.id = l.routine_id
            WHERE (?1 IS NULL OR l.date >= ?1)
              AND (?2 IS NULL OR l.date <= ?2)
            ORDER BY l.date, l.id
        ",
            )
            .map_err(StorageError::from)?;

        let entries = stmt
            .query_map(params![from, to], |row| {
                Ok(CalendarEntry {
                    entry: UsageLogEntry {
                        id: row.get(0)?,
                        date: row.get(1)?,
                        routine_id: row.get(2)?,
                    },
                    routine_name: row.get(3)?,
                })
            })
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(entries)
    }

    fn stats(&self) -> Result<StoreStats> {
        let template_count = count(&self.conn, "SELECT COUNT(*) FROM routines WHERE is_template = 1")?;
        let instance_count = count(&self.conn, "SELECT COUNT(*) FROM routines WHERE is_template = 0")?;
        let exercise_count = count(&self.conn, "SELECT COUNT(*) FROM routine_exercises")?;
        let log_entry_count = count(&self.conn, "SELECT COUNT(*) FROM usage_log")?;
        let trained_days = self.count_distinct_trained_days()?;
        let schema_version = self.schema_version()?;

        let db_size = self
            .path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok().map(|m| m.len()));

        Ok(StoreStats {
            template_count,
            instance_count,
            exercise_count,
            log_entry_count,
            trained_days,
            schema_version,
            db_size,
        })
    }
}

// ==================== Statement Helpers ====================
//
// These take `&Connection` so they run the same inside a `Transaction`
// (which derefs to `Connection`) and against the bare connection.

fn routine_from_row(row: &Row<'_>) -> rusqlite::Result<Routine> {
    Ok(Routine {
        id: row.get(0)?,
        name: row.get(1)?,
        is_template: row.get(2)?,
    })
}

fn count(conn: &Connection, sql: &str) -> Result<usize> {
    let count: i64 = conn
        .query_row(sql, [], |row| row.get(0))
        .map_err(StorageError::from)?;
    Ok(count as usize)
}

fn fetch_routine(conn: &Connection, routine_id: i64) -> Result<Option<Routine>> {
    let routine = conn
        .query_row(
            "SELECT id, name, is_template FROM routines WHERE id = ?",
            params![routine_id],
            routine_from_row,
        )
        .optional()
        .map_err(StorageError::from)?;
    Ok(routine)
}

fn require_routine(conn: &Connection, routine_id: i64) -> Result<Routine> {
    fetch_routine(conn, routine_id)?
        .ok_or_else(|| StorageError::RoutineNotFound { id: routine_id }.into())
}

fn fetch_exercises(conn: &Connection, routine_id: i64) -> Result<Vec<RoutineExercise>> {
    let mut stmt = conn
        .prepare(
            r"
        SELECT id, routine_id, name, sets, reps, weight
        FROM routine_exercises WHERE routine_id = ? ORDER BY id
    ",
        )
        .map_err(StorageError::from)?;

    let exercises = stmt
        .query_map(params![routine_id], |row| {
            Ok(RoutineExercise {
                id: row.get(0)?,
                routine_id: row.get(1)?,
                name: row.get(2)?,
                sets: row.get(3)?,
                reps: row.get(4)?,
                weight: row.get(5)?,
            })
        })
        .map_err(StorageError::from)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(StorageError::from)?;

    Ok(exercises)
}

fn insert_routine_row(conn: &Connection, name: &str, is_template: bool) -> Result<i64> {
    let name = validate_name(name, "routine")?;

    conn.execute(
        "INSERT INTO routines (name, is_template) VALUES (?, ?)",
        params![name, is_template],
    )
    .map_err(StorageError::from)?;

    let id = conn.last_insert_rowid();
    debug!(routine_id = id, name, is_template, "inserted routine");
    Ok(id)
}

fn insert_exercise_row(conn: &Connection, routine_id: i64, exercise: &ExerciseSpec) -> Result<i64> {
    exercise.validate()?;

    conn.execute(
        r"
        INSERT INTO routine_exercises (routine_id, name, sets, reps, weight)
        VALUES (?, ?, ?, ?, ?)
    ",
        params![
            routine_id,
            exercise.name.trim(),
            exercise.sets,
            exercise.reps,
            exercise.weight,
        ],
    )
    .map_err(StorageError::from)?;

    Ok(conn.last_insert_rowid())
}

fn log_usage_row(conn: &Connection, date: NaiveDate, routine_id: i64) -> Result<i64> {
    let routine = require_routine(conn, routine_id)?;
    if routine.is_template {
        warn!(routine_id, "logging a template directly; templates are normally duplicated first");
    }

    conn.execute(
        "INSERT INTO usage_log (date, routine_id) VALUES (?, ?)",
        params![date, routine_id],
    )
    .map_err(StorageError::from)?;

    let id = conn.last_insert_rowid();
    debug!(entry_id = id, routine_id, %date, "logged routine usage");
    Ok(id)
}

fn duplicate_in(conn: &Connection, routine_id: i64) -> Result<i64> {
    let source = require_routine(conn, routine_id)?;
    let new_id = insert_routine_row(conn, &source.name, false)?;

    let copied = conn
        .execute(
            r"
        INSERT INTO routine_exercises (routine_id, name, sets, reps, weight)
        SELECT ?1, name, sets, reps, weight
        FROM routine_exercises WHERE routine_id = ?2 ORDER BY id
    ",
            params![new_id, routine_id],
        )
        .map_err(StorageError::from)?;

    debug!(source_id = routine_id, new_id, copied, "duplicated routine");
    Ok(new_id)
}

fn rename_in(conn: &Connection, routine_id: i64, new_name: &str) -> Result<usize> {
    let name = validate_name(new_name, "routine")?;
    let updated = conn
        .execute(
            "UPDATE routines SET name = ? WHERE id = ?",
            params![name, routine_id],
        )
        .map_err(StorageError::from)?;
    Ok(updated)
}

fn replace_in(conn: &Connection, routine_id: i64, exercises: &[ExerciseSpec]) -> Result<()> {
    require_routine(conn, routine_id)?;
    exercises.iter().try_for_each(ExerciseSpec::validate)?;

    let removed = conn
        .execute(
            "DELETE FROM routine_exercises WHERE routine_id = ?",
            params![routine_id],
        )
        .map_err(StorageError::from)?;

    for exercise in exercises {
        insert_exercise_row(conn, routine_id, exercise)?;
    }

    debug!(routine_id, removed, inserted = exercises.len(), "replaced exercises");
    Ok(())
}

// ==================== Schema Helpers ====================

fn detect_state(conn: &Connection) -> Result<SchemaState> {
    let tracked: i64 = conn
        .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
        .map_err(StorageError::from)?;

    if tracked > 0 {
        let version = get_schema_version(conn)?.ok_or_else(|| {
            StorageError::Migration("schema_info exists but holds no version".to_string())
        })?;
        return Ok(SchemaState::Versioned(version));
    }

    let legacy: i64 = conn
        .query_row(CHECK_LEGACY_SQL, [], |row| row.get(0))
        .map_err(StorageError::from)?;

    Ok(if legacy > 0 {
        SchemaState::Legacy
    } else {
        SchemaState::Fresh
    })
}

fn get_schema_version(conn: &Connection) -> Result<Option<u32>> {
    let version: Option<String> = conn
        .query_row(GET_VERSION_SQL, [], |row| row.get(0))
        .optional()
        .map_err(StorageError::from)?;

    Ok(version.and_then(|v| v.parse().ok()))
}

fn set_schema_version(conn: &Connection, version: u32) -> Result<()> {
    conn.execute(SET_VERSION_SQL, params![version.to_string()])
        .map_err(StorageError::from)?;
    Ok(())
}

fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(StorageError::from)?;
    set_schema_version(conn, CURRENT_SCHEMA_VERSION)?;
    seed(conn)
}

fn migrate(conn: &Connection, from_version: u32) -> Result<()> {
    for migration in get_migrations_from(from_version) {
        info!(
            from = migration.from_version,
            to = migration.to_version,
            "applying schema migration"
        );
        conn.execute_batch(migration.sql)
            .map_err(|e| StorageError::Migration(e.to_string()))?;
    }
    set_schema_version(conn, CURRENT_SCHEMA_VERSION)
}

fn seed(conn: &Connection) -> Result<()> {
    let mut template_ids = Vec::with_capacity(SEED_TEMPLATES.len());
    for template in SEED_TEMPLATES {
        let id = insert_routine_row(conn, template.name, true)?;
        for exercise in template.specs() {
            insert_exercise_row(conn, id, &exercise)?;
        }
        template_ids.push(id);
    }

    for (index, date) in sessions() {
        if let Some(&template_id) = template_ids.get(index) {
            let instance_id = duplicate_in(conn, template_id)?;
            log_usage_row(conn, date, instance_id)?;
        }
    }

    info!(
        templates = template_ids.len(),
        "seeded demonstration routines"
    );
    Ok(())
}
