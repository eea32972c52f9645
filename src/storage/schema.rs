//! Database schema definitions.
//!
//! Contains the SQL schema and the versioned migrations for the routine
//! `SQLite` database.
//!
//! Version history:
//! - v1: the unversioned layout (no `schema_info`, no foreign keys,
//!   nullable exercise numbers).
//! - v2: foreign keys with `ON DELETE CASCADE`, non-null exercise numbers,
//!   lookup indexes.

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Version assigned to databases created before schema tracking existed.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// Schema version tracking table.
pub const SCHEMA_INFO_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// SQL schema for initial database setup.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Routines: templates (is_template = 1) and dated instances (is_template = 0)
CREATE TABLE IF NOT EXISTS routines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    is_template INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_routines_template ON routines(is_template);

-- Exercises of a routine
CREATE TABLE IF NOT EXISTS routine_exercises (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    routine_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    sets INTEGER NOT NULL DEFAULT 0,
    reps INTEGER NOT NULL DEFAULT 0,
    weight REAL NOT NULL DEFAULT 0,
    FOREIGN KEY (routine_id) REFERENCES routines(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_exercises_routine ON routine_exercises(routine_id);

-- Usage log: which instance was performed on which date (YYYY-MM-DD)
CREATE TABLE IF NOT EXISTS usage_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    routine_id INTEGER NOT NULL,
    FOREIGN KEY (routine_id) REFERENCES routines(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_usage_log_date ON usage_log(date);
CREATE INDEX IF NOT EXISTS idx_usage_log_routine ON usage_log(routine_id);
";

/// SQL dropping every table. Children first so foreign keys never block.
pub const DROP_SQL: &str = r"
DROP TABLE IF EXISTS usage_log;
DROP TABLE IF EXISTS routine_exercises;
DROP TABLE IF EXISTS routines;
DROP TABLE IF EXISTS schema_info;
";

/// SQL to check if schema is initialized.
pub const CHECK_SCHEMA_SQL: &str = r"
SELECT COUNT(*) FROM sqlite_master
WHERE type='table' AND name='schema_info';
";

/// SQL to detect an unversioned database that already holds routines.
pub const CHECK_LEGACY_SQL: &str = r"
SELECT COUNT(*) FROM sqlite_master
WHERE type='table' AND name='routines';
";

/// SQL to get schema version.
pub const GET_VERSION_SQL: &str = r"
SELECT value FROM schema_info WHERE key = 'version';
";

/// SQL to set schema version.
pub const SET_VERSION_SQL: &str = r"
INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?);
";

/// Migrations from older schema versions.
pub struct Migration {
    /// Version this migration upgrades from.
    pub from_version: u32,
    /// Version this migration upgrades to.
    pub to_version: u32,
    /// SQL statements to execute.
    pub sql: &'static str,
}

/// SQL for v1 to v2 migration.
///
/// `SQLite` cannot add a foreign key to an existing table, so the child
/// tables are rebuilt. Rows pointing at missing routines are dropped on
/// the way.
const MIGRATION_V1_TO_V2: &str = r"
UPDATE routines SET is_template = 1 WHERE is_template IS NULL;

CREATE INDEX IF NOT EXISTS idx_routines_template ON routines(is_template);

CREATE TABLE routine_exercises_v2 (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    routine_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    sets INTEGER NOT NULL DEFAULT 0,
    reps INTEGER NOT NULL DEFAULT 0,
    weight REAL NOT NULL DEFAULT 0,
    FOREIGN KEY (routine_id) REFERENCES routines(id) ON DELETE CASCADE
);

INSERT INTO routine_exercises_v2 (id, routine_id, name, sets, reps, weight)
SELECT id, routine_id, name,
    MAX(COALESCE(sets, 0), 0), MAX(COALESCE(reps, 0), 0), MAX(COALESCE(weight, 0), 0)
FROM routine_exercises
WHERE routine_id IN (SELECT id FROM routines);

DROP TABLE routine_exercises;
ALTER TABLE routine_exercises_v2 RENAME TO routine_exercises;
CREATE INDEX IF NOT EXISTS idx_exercises_routine ON routine_exercises(routine_id);

CREATE TABLE usage_log_v2 (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    routine_id INTEGER NOT NULL,
    FOREIGN KEY (routine_id) REFERENCES routines(id) ON DELETE CASCADE
);

INSERT INTO usage_log_v2 (id, date, routine_id)
SELECT id, date, routine_id
FROM usage_log
WHERE routine_id IN (SELECT id FROM routines);

DROP TABLE usage_log;
ALTER TABLE usage_log_v2 RENAME TO usage_log;
CREATE INDEX IF NOT EXISTS idx_usage_log_date ON usage_log(date);
CREATE INDEX IF NOT EXISTS idx_usage_log_routine ON usage_log(routine_id);
";

/// Available migrations.
pub const MIGRATIONS: &[Migration] = &[Migration {
    from_version: 1,
    to_version: 2,
    sql: MIGRATION_V1_TO_V2,
}];

/// Gets migrations needed to upgrade from a version.
#[must_use]
pub fn get_migrations_from(current_version: u32) -> Vec<&'static Migration> {
    MIGRATIONS
        .iter()
        .filter(|m| m.from_version >= current_version && m.to_version <= CURRENT_SCHEMA_VERSION)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_sql_not_empty() {
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS routines"));
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS routine_exercises"));
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS usage_log"));
    }

    #[test]
    fn test_migrations_ordered() {
        for migration in MIGRATIONS {
            assert!(migration.to_version > migration.from_version);
        }
    }

    #[test]
    fn test_migrations_reach_current_version() {
        let migrations = get_migrations_from(LEGACY_SCHEMA_VERSION);
        let last = migrations.last().map(|m| m.to_version);
        assert_eq!(last, Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_no_migrations_at_current_version() {
        assert!(get_migrations_from(CURRENT_SCHEMA_VERSION).is_empty());
    }

    #[test]
    fn test_drop_order_children_first() {
        let log = DROP_SQL.find("usage_log").unwrap();
        let exercises = DROP_SQL.find("routine_exercises").unwrap();
        let routines = DROP_SQL.find("TABLE IF EXISTS routines").unwrap();
        assert!(log < routines);
        assert!(exercises < routines);
    }
}
