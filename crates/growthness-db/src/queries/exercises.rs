//! Database query functions for exercises, routines, routine exercises,
//! exercise logs and training goals.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::{
    Exercise, ExerciseLog, ExerciseProgressPoint, ExerciseType, Routine, RoutineExercise,
    RoutineExerciseDetail, TrainingGoal,
};

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------

/// Fields of a shared exercise row.
#[derive(Debug, Clone, Copy)]
pub struct NewExercise<'a> {
    pub name: &'a str,
    pub exercise_type: ExerciseType,
    pub duration: Option<i32>,
    pub distance: Option<f64>,
    pub average_velocity: Option<f64>,
    pub pace: Option<f64>,
}

/// Insert an exercise. Fails with a unique violation on a duplicate
/// `(name, exercise_type)`.
pub async fn insert_exercise(pool: &PgPool, new: &NewExercise<'_>) -> Result<Exercise> {
    let exercise = sqlx::query_as::<_, Exercise>(
        "INSERT INTO exercises (name, exercise_type, duration, distance, average_velocity, pace) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.exercise_type)
    .bind(new.duration)
    .bind(new.distance)
    .bind(new.average_velocity)
    .bind(new.pace)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert exercise {:?}", new.name))?;

    Ok(exercise)
}

/// List all exercises by name.
pub async fn list_exercises(pool: &PgPool) -> Result<Vec<Exercise>> {
    let exercises =
        sqlx::query_as::<_, Exercise>("SELECT * FROM exercises ORDER BY name, exercise_type")
            .fetch_all(pool)
            .await
            .context("failed to list exercises")?;

    Ok(exercises)
}

/// Fetch an exercise by ID.
pub async fn get_exercise(pool: &PgPool, id: Uuid) -> Result<Option<Exercise>> {
    let exercise = sqlx::query_as::<_, Exercise>("SELECT * FROM exercises WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch exercise")?;

    Ok(exercise)
}

/// Replace an exercise's fields. Returns `None` if it does not exist.
pub async fn update_exercise(
    pool: &PgPool,
    id: Uuid,
    new: &NewExercise<'_>,
) -> Result<Option<Exercise>> {
    let exercise = sqlx::query_as::<_, Exercise>(
        "UPDATE exercises SET name = $2, exercise_type = $3, duration = $4, \
             distance = $5, average_velocity = $6, pace = $7 \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(new.name)
    .bind(new.exercise_type)
    .bind(new.duration)
    .bind(new.distance)
    .bind(new.average_velocity)
    .bind(new.pace)
    .fetch_optional(pool)
    .await
    .context("failed to update exercise")?;

    Ok(exercise)
}

pub async fn delete_exercise(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete exercise")?;

    Ok(result.rows_affected() > 0)
}

/// Return the exercise with this `(name, exercise_type)`, creating a bare row
/// if none exists yet.
pub async fn get_or_create_exercise(
    conn: &mut PgConnection,
    name: &str,
    exercise_type: ExerciseType,
) -> Result<Exercise> {
    let row = sqlx::query_as::<_, Exercise>(
        "WITH ins AS ( \
             INSERT INTO exercises (name, exercise_type) VALUES ($1, $2) \
             ON CONFLICT (name, exercise_type) DO NOTHING \
             RETURNING * \
         ) \
         SELECT * FROM ins \
         UNION ALL \
         SELECT * FROM exercises WHERE name = $1 AND exercise_type = $2 \
         LIMIT 1",
    )
    .bind(name)
    .bind(exercise_type)
    .fetch_optional(&mut *conn)
    .await
    .with_context(|| format!("failed to get or create exercise {name:?}"))?;

    if let Some(row) = row {
        return Ok(row);
    }

    // A concurrent insert committed after our snapshot; read it now.
    sqlx::query_as::<_, Exercise>("SELECT * FROM exercises WHERE name = $1 AND exercise_type = $2")
        .bind(name)
        .bind(exercise_type)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to fetch exercise {name:?}"))
}

// ---------------------------------------------------------------------------
// Routines
// ---------------------------------------------------------------------------

/// Insert a routine. Fails with a unique violation if the user already has
/// one for that week.
pub async fn insert_routine(
    pool: &PgPool,
    user_id: Uuid,
    week_start_date: NaiveDate,
) -> Result<Routine> {
    let routine = sqlx::query_as::<_, Routine>(
        "INSERT INTO routines (user_id, week_start_date) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(week_start_date)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert routine for week {week_start_date}"))?;

    Ok(routine)
}

/// Return the user's routine for `week_start_date`, creating it if absent.
pub async fn get_or_create_routine(
    conn: &mut PgConnection,
    user_id: Uuid,
    week_start_date: NaiveDate,
) -> Result<Routine> {
    let row = sqlx::query_as::<_, Routine>(
        "WITH ins AS ( \
             INSERT INTO routines (user_id, week_start_date) VALUES ($1, $2) \
             ON CONFLICT (user_id, week_start_date) DO NOTHING \
             RETURNING * \
         ) \
         SELECT * FROM ins \
         UNION ALL \
         SELECT * FROM routines WHERE user_id = $1 AND week_start_date = $2 \
         LIMIT 1",
    )
    .bind(user_id)
    .bind(week_start_date)
    .fetch_optional(&mut *conn)
    .await
    .context("failed to get or create routine")?;

    if let Some(row) = row {
        return Ok(row);
    }

    sqlx::query_as::<_, Routine>(
        "SELECT * FROM routines WHERE user_id = $1 AND week_start_date = $2",
    )
    .bind(user_id)
    .bind(week_start_date)
    .fetch_one(&mut *conn)
    .await
    .context("failed to fetch routine")
}

/// List a user's routines, most recent week first.
pub async fn list_routines(pool: &PgPool, user_id: Uuid) -> Result<Vec<Routine>> {
    let routines = sqlx::query_as::<_, Routine>(
        "SELECT * FROM routines WHERE user_id = $1 ORDER BY week_start_date DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list routines")?;

    Ok(routines)
}

pub async fn get_routine(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<Routine>> {
    let routine =
        sqlx::query_as::<_, Routine>("SELECT * FROM routines WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch routine")?;

    Ok(routine)
}

pub async fn delete_routine(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM routines WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to delete routine")?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Routine exercises
// ---------------------------------------------------------------------------

/// Targets of a routine exercise. Every target is optional at this layer.
#[derive(Debug, Clone, Default)]
pub struct NewRoutineExercise {
    pub day_of_week: Option<String>,
    pub weight_goal: Option<i32>,
    pub reps_goal: Option<i32>,
    pub duration: Option<i32>,
    pub distance: Option<f64>,
    pub pace: Option<f64>,
    pub average_velocity: Option<f64>,
}

/// Insert a routine exercise.
pub async fn insert_routine_exercise<'e>(
    executor: impl PgExecutor<'e>,
    routine_id: Uuid,
    exercise_id: Uuid,
    new: &NewRoutineExercise,
) -> Result<RoutineExercise> {
    let row = sqlx::query_as::<_, RoutineExercise>(
        "INSERT INTO routine_exercises \
             (routine_id, exercise_id, day_of_week, weight_goal, reps_goal, \
              duration, distance, pace, average_velocity) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(routine_id)
    .bind(exercise_id)
    .bind(new.day_of_week.as_deref())
    .bind(new.weight_goal)
    .bind(new.reps_goal)
    .bind(new.duration)
    .bind(new.distance)
    .bind(new.pace)
    .bind(new.average_velocity)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert routine exercise into routine {routine_id}"))?;

    Ok(row)
}

const ROUTINE_EXERCISE_DETAIL_SELECT: &str = "SELECT re.*, e.name AS exercise_name, \
     e.exercise_type AS exercise_type \
     FROM routine_exercises re \
     JOIN exercises e ON e.id = re.exercise_id \
     JOIN routines r ON r.id = re.routine_id";

/// List the user's routine exercises, optionally narrowed to one routine.
pub async fn list_routine_exercises(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Option<Uuid>,
) -> Result<Vec<RoutineExerciseDetail>> {
    let query = format!(
        "{ROUTINE_EXERCISE_DETAIL_SELECT} \
         WHERE r.user_id = $1 AND ($2::uuid IS NULL OR re.routine_id = $2) \
         ORDER BY r.week_start_date DESC, re.day_of_week, e.name"
    );
    let rows = sqlx::query_as::<_, RoutineExerciseDetail>(&query)
        .bind(user_id)
        .bind(routine_id)
        .fetch_all(pool)
        .await
        .context("failed to list routine exercises")?;

    Ok(rows)
}

pub async fn get_routine_exercise(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<RoutineExerciseDetail>> {
    let query = format!("{ROUTINE_EXERCISE_DETAIL_SELECT} WHERE re.id = $1 AND r.user_id = $2");
    let row = sqlx::query_as::<_, RoutineExerciseDetail>(&query)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch routine exercise")?;

    Ok(row)
}

pub async fn delete_routine_exercise(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        "DELETE FROM routine_exercises re USING routines r \
         WHERE re.routine_id = r.id AND re.id = $1 AND r.user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("failed to delete routine exercise")?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Exercise logs
// ---------------------------------------------------------------------------

/// Measurements of one logged session.
#[derive(Debug, Clone, Default)]
pub struct NewExerciseLog {
    pub date_logged: NaiveDate,
    pub weight: Option<i32>,
    pub reps: Option<i32>,
    pub distance_logged: Option<f64>,
    pub average_velocity_logged: Option<f64>,
    pub pace_logged: Option<f64>,
}

/// Insert an exercise log. The caller checks that the routine exercise
/// belongs to `user_id`.
pub async fn insert_exercise_log(
    pool: &PgPool,
    user_id: Uuid,
    routine_exercise_id: Uuid,
    new: &NewExerciseLog,
) -> Result<ExerciseLog> {
    let log = sqlx::query_as::<_, ExerciseLog>(
        "INSERT INTO exercise_logs \
             (user_id, routine_exercise_id, date_logged, weight, reps, \
              distance_logged, average_velocity_logged, pace_logged) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(routine_exercise_id)
    .bind(new.date_logged)
    .bind(new.weight)
    .bind(new.reps)
    .bind(new.distance_logged)
    .bind(new.average_velocity_logged)
    .bind(new.pace_logged)
    .fetch_one(pool)
    .await
    .context("failed to insert exercise log")?;

    Ok(log)
}

/// List a user's exercise logs, newest first.
pub async fn list_exercise_logs(pool: &PgPool, user_id: Uuid) -> Result<Vec<ExerciseLog>> {
    let logs = sqlx::query_as::<_, ExerciseLog>(
        "SELECT * FROM exercise_logs WHERE user_id = $1 ORDER BY date_logged DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list exercise logs")?;

    Ok(logs)
}

pub async fn delete_exercise_log(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM exercise_logs WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to delete exercise log")?;

    Ok(result.rows_affected() > 0)
}

/// Aggregate a user's logs of one routine exercise per day within
/// `[from, to]` (both inclusive), oldest day first.
pub async fn exercise_progress(
    pool: &PgPool,
    user_id: Uuid,
    routine_exercise_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ExerciseProgressPoint>> {
    let points = sqlx::query_as::<_, ExerciseProgressPoint>(
        "SELECT date_logged AS date, \
                COUNT(*) AS sessions, \
                MAX(weight) AS max_weight, \
                SUM(reps)::bigint AS total_reps, \
                SUM(distance_logged) AS total_distance, \
                AVG(pace_logged) AS average_pace \
         FROM exercise_logs \
         WHERE user_id = $1 AND routine_exercise_id = $2 \
           AND date_logged BETWEEN $3 AND $4 \
         GROUP BY date_logged \
         ORDER BY date_logged ASC",
    )
    .bind(user_id)
    .bind(routine_exercise_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .context("failed to aggregate exercise progress")?;

    Ok(points)
}

// ---------------------------------------------------------------------------
// Training goals
// ---------------------------------------------------------------------------

pub async fn insert_training_goal(
    pool: &PgPool,
    user_id: Uuid,
    description: &str,
    target_date: NaiveDate,
) -> Result<TrainingGoal> {
    let goal = sqlx::query_as::<_, TrainingGoal>(
        "INSERT INTO training_goals (user_id, description, target_date) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(description)
    .bind(target_date)
    .fetch_one(pool)
    .await
    .context("failed to insert training goal")?;

    Ok(goal)
}

/// List a user's training goals, nearest target first.
pub async fn list_training_goals(pool: &PgPool, user_id: Uuid) -> Result<Vec<TrainingGoal>> {
    let goals = sqlx::query_as::<_, TrainingGoal>(
        "SELECT * FROM training_goals WHERE user_id = $1 ORDER BY target_date ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list training goals")?;

    Ok(goals)
}

/// Set the `achieved` flag. Returns `None` if the goal is not the user's.
pub async fn set_training_goal_achieved(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    achieved: bool,
) -> Result<Option<TrainingGoal>> {
    let goal = sqlx::query_as::<_, TrainingGoal>(
        "UPDATE training_goals SET achieved = $3 \
         WHERE id = $1 AND user_id = $2 \
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(achieved)
    .fetch_optional(pool)
    .await
    .context("failed to update training goal")?;

    Ok(goal)
}

pub async fn delete_training_goal(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM training_goals WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to delete training goal")?;

    Ok(result.rows_affected() > 0)
}
