//! First-run demonstration data.
//!
//! Written once, when a fresh database is created: four templates with
//! their exercises, plus two instances cloned from them and logged.

use crate::core::ExerciseSpec;
use chrono::NaiveDate;

/// A template shipped with a fresh database.
pub struct SeedTemplate {
    /// Template name.
    pub name: &'static str,
    /// `(name, sets, reps, weight)` rows.
    pub exercises: &'static [(&'static str, u32, u32, f64)],
}

impl SeedTemplate {
    /// Exercise payloads of this template.
    #[must_use]
    pub fn specs(&self) -> Vec<ExerciseSpec> {
        self.exercises
            .iter()
            .map(|&(name, sets, reps, weight)| ExerciseSpec::new(name, sets, reps, weight))
            .collect()
    }
}

/// Seeded templates.
pub const SEED_TEMPLATES: &[SeedTemplate] = &[
    SeedTemplate {
        name: "Chest & Biceps",
        exercises: &[
            ("Bench press", 4, 10, 60.0),
            ("Incline flyes", 3, 12, 12.5),
            ("Barbell curl", 4, 10, 30.0),
        ],
    },
    SeedTemplate {
        name: "Back & Triceps",
        exercises: &[
            ("Pull-ups", 4, 8, 0.0),
            ("Barbell row", 4, 10, 60.0),
            ("Triceps extension", 3, 12, 20.0),
        ],
    },
    SeedTemplate {
        name: "Legs & Core",
        exercises: &[
            ("Squats", 4, 10, 70.0),
            ("Lunges", 3, 12, 15.0),
            ("Plank", 3, 60, 0.0),
        ],
    },
    SeedTemplate {
        name: "Full Body",
        exercises: &[
            ("Burpees", 3, 12, 0.0),
            ("Deadlift", 4, 8, 80.0),
            ("Overhead press", 4, 10, 35.0),
        ],
    },
];

/// Seeded sessions: `(index into SEED_TEMPLATES, year, month, day)`.
pub const SEED_SESSIONS: &[(usize, i32, u32, u32)] = &[(0, 2025, 6, 10), (1, 2025, 6, 12)];

/// Resolves [`SEED_SESSIONS`] into `(template index, date)` pairs.
///
/// Entries with an out-of-range index or an impossible date are skipped.
pub fn sessions() -> impl Iterator<Item = (usize, NaiveDate)> {
    SEED_SESSIONS.iter().filter_map(|&(index, y, m, d)| {
        (index < SEED_TEMPLATES.len())
            .then(|| NaiveDate::from_ymd_opt(y, m, d))
            .flatten()
            .map(|date| (index, date))
    })
}
