//! Routine and exercise records.
//!
//! A routine is either a reusable template or a dated instance cloned from
//! one. Exercises belong to exactly one routine and carry the planned
//! sets, reps and weight.

use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A named workout definition.
///
/// Templates (`is_template == true`) are never tied to a calendar date.
/// Instances are what gets logged; the flag is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    /// Unique identifier assigned by the store.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Whether this routine is a reusable template.
    pub is_template: bool,
}

impl Routine {
    /// Human-readable kind, used by the CLI.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        if self.is_template {
            "template"
        } else {
            "instance"
        }
    }
}

/// One exercise configuration of a routine, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineExercise {
    /// Unique identifier assigned by the store.
    pub id: i64,

    /// Owning routine.
    pub routine_id: i64,

    /// Exercise name.
    pub name: String,

    /// Number of sets.
    pub sets: u32,

    /// Repetitions per set.
    pub reps: u32,

    /// Load in kilograms.
    pub weight: f64,
}

impl RoutineExercise {
    /// Returns the insertable payload of this exercise, dropping the ids.
    #[must_use]
    pub fn to_spec(&self) -> ExerciseSpec {
        ExerciseSpec {
            name: self.name.clone(),
            sets: self.sets,
            reps: self.reps,
            weight: self.weight,
        }
    }
}

/// Exercise payload used for inserts and wholesale replacement.
///
/// # Examples
///
/// ```
/// use routine_store::core::ExerciseSpec;
///
/// let spec: ExerciseSpec = "Bench press:4:10:60".parse().unwrap();
/// assert_eq!(spec.sets, 4);
/// assert_eq!(spec.weight, 60.0);
///
/// // Unparseable numbers fall back to zero.
/// let spec = ExerciseSpec::from_fields("Plank", Some("3"), Some("a minute"), None);
/// assert_eq!(spec.reps, 0);
/// assert_eq!(spec.weight, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSpec {
    /// Exercise name.
    pub name: String,

    /// Number of sets.
    pub sets: u32,

    /// Repetitions per set.
    pub reps: u32,

    /// Load in kilograms.
    pub weight: f64,
}

impl ExerciseSpec {
    /// Creates an exercise from already-typed values.
    #[must_use]
    pub fn new(name: impl Into<String>, sets: u32, reps: u32, weight: f64) -> Self {
        Self {
            name: name.into(),
            sets,
            reps,
            weight,
        }
    }

    /// Builds an exercise from raw form fields.
    ///
    /// Absent, unparseable or negative numbers become 0. This is the only
    /// place where input is coerced instead of rejected.
    #[must_use]
    pub fn from_fields(
        name: &str,
        sets: Option<&str>,
        reps: Option<&str>,
        weight: Option<&str>,
    ) -> Self {
        let count = |field: Option<&str>| {
            field
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(0)
        };
        let weight = weight
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|w| w.is_finite() && *w >= 0.0)
            .unwrap_or(0.0);

        Self {
            name: name.trim().to_string(),
            sets: count(sets),
            reps: count(reps),
            weight,
        }
    }

    /// Checks the exercise before it reaches storage.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] for a blank name and
    /// [`ValidationError::NegativeValue`] for a negative or non-finite
    /// weight.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name, "exercise")?;
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ValidationError::NegativeValue { field: "weight" });
        }
        Ok(())
    }
}

impl FromStr for ExerciseSpec {
    type Err = ValidationError;

    /// Parses `name[:sets[:reps[:weight]]]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, ':');
        let name = parts.next().unwrap_or_default();
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidExercise(format!(
                "'{s}' has no exercise name (expected name:sets:reps:weight)"
            )));
        }
        Ok(Self::from_fields(
            name,
            parts.next(),
            parts.next(),
            parts.next(),
        ))
    }
}

/// Payload of the add/edit routine form.
///
/// A draft without `id` creates a routine: a template when `date` is
/// `None`, otherwise an instance logged on that date. A draft with `id`
/// renames that routine and replaces its exercises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineDraft {
    /// Existing routine to edit, if any.
    pub id: Option<i64>,

    /// Routine name.
    pub name: String,

    /// Date to log a newly created routine on.
    pub date: Option<NaiveDate>,

    /// Full exercise list.
    pub exercises: Vec<ExerciseSpec>,
}

impl RoutineDraft {
    /// Draft for a new template.
    #[must_use]
    pub fn template(name: impl Into<String>, exercises: Vec<ExerciseSpec>) -> Self {
        Self {
            id: None,
            name: name.into(),
            date: None,
            exercises,
        }
    }

    /// Draft for a new routine performed on `date`.
    #[must_use]
    pub fn on_date(name: impl Into<String>, date: NaiveDate, exercises: Vec<ExerciseSpec>) -> Self {
        Self {
            id: None,
            name: name.into(),
            date: Some(date),
            exercises,
        }
    }

    /// Draft editing routine `id`.
    #[must_use]
    pub fn edit(id: i64, name: impl Into<String>, exercises: Vec<ExerciseSpec>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            date: None,
            exercises,
        }
    }

    /// Whether saving this draft creates a template.
    #[must_use]
    pub const fn is_template(&self) -> bool {
        self.date.is_none()
    }

    /// Validates name and exercises.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the name is blank, the exercise list
    /// is empty, or any exercise is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name, "routine")?;
        if self.exercises.is_empty() {
            return Err(ValidationError::NoExercises);
        }
        self.exercises.iter().try_for_each(ExerciseSpec::validate)
    }
}

/// Trims `name` and rejects it if nothing is left.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyName`] for blank input.
pub fn validate_name<'a>(name: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName { field });
    }
    Ok(trimmed)
}
