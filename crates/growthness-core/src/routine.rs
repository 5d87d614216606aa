//! Validation of directly authored routine exercises.
//!
//! Targets depend on the exercise type. Zero counts as absent for every
//! target. Plan materialization does not go through these checks.

use growthness_db::models::{DayOfWeek, ExerciseType};
use growthness_db::queries::exercises::NewRoutineExercise;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutineValidationError {
    #[error("Duration is required for cardio exercises.")]
    CardioMissingDuration,

    #[error("Pace or average velocity is required for cardio exercises.")]
    CardioMissingSpeed,

    #[error("Weight and reps goals are not applicable for cardio exercises.")]
    CardioWithStrengthTargets,

    #[error("Weight goal is required for gym exercises.")]
    GymMissingWeight,

    #[error("Reps goal is required for gym exercises.")]
    GymMissingReps,

    #[error("invalid day of week: {0:?}")]
    InvalidDay(String),
}

fn present_i32(value: Option<i32>) -> bool {
    value.is_some_and(|v| v != 0)
}

fn present_f64(value: Option<f64>) -> bool {
    value.is_some_and(|v| v != 0.0)
}

/// Check `targets` against the rules for `exercise_type`.
pub fn validate_routine_exercise(
    exercise_type: ExerciseType,
    targets: &NewRoutineExercise,
) -> Result<(), RoutineValidationError> {
    if let Some(day) = targets.day_of_week.as_deref() {
        day.parse::<DayOfWeek>()
            .map_err(|_| RoutineValidationError::InvalidDay(day.to_string()))?;
    }

    match exercise_type {
        ExerciseType::Cardio => {
            if !present_i32(targets.duration) {
                return Err(RoutineValidationError::CardioMissingDuration);
            }
            if !present_f64(targets.pace) && !present_f64(targets.average_velocity) {
                return Err(RoutineValidationError::CardioMissingSpeed);
            }
            if present_i32(targets.weight_goal) || present_i32(targets.reps_goal) {
                return Err(RoutineValidationError::CardioWithStrengthTargets);
            }
        }
        ExerciseType::Gym => {
            if !present_i32(targets.weight_goal) {
                return Err(RoutineValidationError::GymMissingWeight);
            }
            if !present_i32(targets.reps_goal) {
                return Err(RoutineValidationError::GymMissingReps);
            }
        }
    }
    Ok(())
}
