//! Plan materialization: fan a [`PlanDocument`] out into a user's habits,
//! routine exercises and meals.
//!
//! Everything is written inside one transaction. Any failure (an unknown
//! habit frequency, a constraint violation) rolls back every row of the call.
//! Exercises, foods, routines and meals are get-or-create; habits, habit
//! logs, routine exercises and meal foods are always inserted.

use std::collections::BTreeSet;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use growthness_db::models::DayOfWeek;
use growthness_db::queries::diets::{self, NewFood};
use growthness_db::queries::exercises::{self, NewRoutineExercise};
use growthness_db::queries::habits::{self, NewHabit};

use super::document::{ExerciseDay, HabitEntry, MealEntry, PlanDocument, round_target};
use super::error::PlanError;

/// Rows written by one materialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    pub habits: usize,
    pub habit_logs: usize,
    pub routine_exercises: usize,
    /// Meals created by this call; reused meals are not counted.
    pub meals: usize,
    pub meal_foods: usize,
}

/// Write `plan` for `user_id`. `today` dates the meals and any routine whose
/// week start was not given.
pub async fn materialize_plan(
    pool: &PgPool,
    user_id: Uuid,
    plan: &PlanDocument,
    today: NaiveDate,
) -> Result<MaterializeSummary, PlanError> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;
    let mut summary = MaterializeSummary::default();

    for habit in &plan.habits {
        apply_habit(&mut tx, user_id, habit, &mut summary).await?;
    }
    for day in &plan.exercises {
        apply_exercise_day(&mut tx, user_id, day, today, &mut summary).await?;
    }
    for meal in &plan.diet {
        apply_meal(&mut tx, user_id, meal, today, &mut summary).await?;
    }

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        %user_id,
        habits = summary.habits,
        habit_logs = summary.habit_logs,
        routine_exercises = summary.routine_exercises,
        meals = summary.meals,
        meal_foods = summary.meal_foods,
        "plan materialized"
    );
    Ok(summary)
}

/// Map a generated day label to its canonical token. Labels outside the
/// Portuguese weekday table are kept as given.
pub fn translate_day(label: &str) -> String {
    match DayOfWeek::from_portuguese(label) {
        Some(day) => day.as_str().to_string(),
        None => label.to_string(),
    }
}

/// Round a numeric target for an integer column.
fn target(field: &str, value: f64) -> Result<i32, PlanError> {
    round_target(value)
        .ok_or_else(|| PlanError::DataFormat(format!("{field} {value} is out of range")))
}

async fn apply_habit(
    conn: &mut PgConnection,
    user_id: Uuid,
    entry: &HabitEntry,
    summary: &mut MaterializeSummary,
) -> Result<(), PlanError> {
    let requested: BTreeSet<String> = entry.frequency.names().into_iter().collect();
    let requested: Vec<String> = requested.into_iter().collect();

    let resolved = habits::resolve_frequencies(&mut *conn, &requested).await?;
    if requested.is_empty() || resolved.len() != requested.len() {
        return Err(PlanError::InvalidFrequency(entry.frequency.to_string()));
    }

    let new = NewHabit {
        name: &entry.name,
        goal: entry.goal,
        measure: Some(&entry.measure),
    };
    let habit = habits::insert_habit(&mut *conn, user_id, &new).await?;
    habits::attach_frequencies(&mut *conn, habit.id, &resolved).await?;
    summary.habits += 1;

    for log in &entry.logs {
        habits::insert_habit_log(&mut *conn, habit.id, log.date, log.amount).await?;
        summary.habit_logs += 1;
    }

    debug!(habit = %entry.name, "habit created");
    Ok(())
}

async fn apply_exercise_day(
    conn: &mut PgConnection,
    user_id: Uuid,
    day: &ExerciseDay,
    today: NaiveDate,
    summary: &mut MaterializeSummary,
) -> Result<(), PlanError> {
    let day_of_week = translate_day(&day.day);
    let week_start = day.week_start_date.unwrap_or(today);
    let routine = exercises::get_or_create_routine(&mut *conn, user_id, week_start).await?;

    for entry in &day.routine {
        let exercise =
            exercises::get_or_create_exercise(&mut *conn, &entry.exercise, entry.exercise_type)
                .await?;

        let targets = NewRoutineExercise {
            day_of_week: Some(day_of_week.clone()),
            weight_goal: entry.weight.map(|v| target("weight", v)).transpose()?,
            reps_goal: entry.reps.map(|v| target("reps", v)).transpose()?,
            duration: entry.duration.map(|v| target("duration", v)).transpose()?,
            distance: entry.distance,
            pace: entry.pace,
            average_velocity: entry.average_velocity,
        };
        exercises::insert_routine_exercise(&mut *conn, routine.id, exercise.id, &targets).await?;
        summary.routine_exercises += 1;
    }

    debug!(day = %day_of_week, entries = day.routine.len(), "routine day applied");
    Ok(())
}

async fn apply_meal(
    conn: &mut PgConnection,
    user_id: Uuid,
    entry: &MealEntry,
    today: NaiveDate,
    summary: &mut MaterializeSummary,
) -> Result<(), PlanError> {
    let (meal, created) =
        diets::get_or_create_meal(&mut *conn, user_id, &entry.meal, today).await?;
    if created {
        summary.meals += 1;
    }

    for item in &entry.foods {
        let new = NewFood {
            name: &item.name,
            calories: target("calories", item.calories)?,
            protein: Some(item.protein),
            carbs: Some(item.carbs),
            fat: Some(item.fat),
        };
        let food = diets::get_or_create_food(&mut *conn, &new).await?;
        diets::insert_meal_food(&mut *conn, meal.id, food.id, item.servings).await?;
        summary.meal_foods += 1;
    }

    Ok(())
}
