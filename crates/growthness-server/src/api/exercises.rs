use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use growthness_core::routine::validate_routine_exercise;
use growthness_db::models::{
    Exercise, ExerciseLog, ExerciseProgressPoint, ExerciseType, Routine, RoutineExerciseDetail,
    TrainingGoal,
};
use growthness_db::queries::exercises::{
    self, NewExercise, NewExerciseLog, NewRoutineExercise,
};
use growthness_db::queries::is_unique_violation;

use super::{created, deleted, today};
use crate::auth::AuthUser;
use crate::error::{AppError, JsonBody, Path, Query};
use crate::serve_cmd::AppState;

/// Progress graphs cover this many days when `from` is omitted.
const DEFAULT_PROGRESS_DAYS: u64 = 30;

pub fn exercise_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_exercises).post(create_exercise))
        .route(
            "/{id}",
            get(get_exercise).put(update_exercise).delete(delete_exercise),
        )
}

pub fn routine_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routines).post(create_routine))
        .route("/{id}", get(get_routine).delete(delete_routine))
}

pub fn routine_exercise_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routine_exercises).post(create_routine_exercise))
        .route(
            "/{id}",
            get(get_routine_exercise).delete(delete_routine_exercise),
        )
}

pub fn log_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_logs).post(create_log))
        .route("/progress", get(progress))
        .route("/{id}", axum::routing::delete(delete_log))
}

pub fn training_goal_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_goals).post(create_goal))
        .route("/{id}", patch(update_goal).delete(delete_goal))
}

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ExerciseRequest {
    name: String,
    exercise_type: ExerciseType,
    duration: Option<i32>,
    distance: Option<f64>,
    average_velocity: Option<f64>,
    pace: Option<f64>,
}

impl ExerciseRequest {
    fn as_new(&self) -> NewExercise<'_> {
        NewExercise {
            name: &self.name,
            exercise_type: self.exercise_type,
            duration: self.duration,
            distance: self.distance,
            average_velocity: self.average_velocity,
            pace: self.pace,
        }
    }
}

const DUPLICATE_EXERCISE: &str = "An exercise with this name and type already exists.";

fn exercise_missing() -> AppError {
    AppError::not_found("Exercise not found.")
}

async fn list_exercises(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<Exercise>>, AppError> {
    let rows = exercises::list_exercises(&state.pool)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows))
}

async fn create_exercise(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    JsonBody(req): JsonBody<ExerciseRequest>,
) -> Result<Response, AppError> {
    match exercises::insert_exercise(&state.pool, &req.as_new()).await {
        Ok(exercise) => Ok(created(exercise)),
        Err(e) if is_unique_violation(&e) => Err(AppError::conflict(DUPLICATE_EXERCISE)),
        Err(e) => Err(AppError::internal(e)),
    }
}

async fn get_exercise(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Exercise>, AppError> {
    exercises::get_exercise(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .map(Json)
        .ok_or_else(exercise_missing)
}

async fn update_exercise(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<ExerciseRequest>,
) -> Result<Json<Exercise>, AppError> {
    match exercises::update_exercise(&state.pool, id, &req.as_new()).await {
        Ok(Some(exercise)) => Ok(Json(exercise)),
        Ok(None) => Err(exercise_missing()),
        Err(e) if is_unique_violation(&e) => Err(AppError::conflict(DUPLICATE_EXERCISE)),
        Err(e) => Err(AppError::internal(e)),
    }
}

async fn delete_exercise(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = exercises::delete_exercise(&state.pool, id)
        .await
        .map_err(AppError::internal)?;
    deleted(removed, "Exercise not found.")
}

// ---------------------------------------------------------------------------
// Routines
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RoutineRequest {
    week_start_date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct RoutineDetail {
    #[serde(flatten)]
    routine: Routine,
    exercises: Vec<RoutineExerciseDetail>,
}

fn routine_missing() -> AppError {
    AppError::not_found("Routine not found.")
}

async fn list_routines(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Routine>>, AppError> {
    let rows = exercises::list_routines(&state.pool, user.id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows))
}

async fn create_routine(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<RoutineRequest>,
) -> Result<Response, AppError> {
    match exercises::insert_routine(&state.pool, user.id, req.week_start_date).await {
        Ok(routine) => Ok(created(routine)),
        Err(e) if is_unique_violation(&e) => Err(AppError::conflict(
            "A routine for this week already exists.",
        )),
        Err(e) => Err(AppError::internal(e)),
    }
}

async fn get_routine(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RoutineDetail>, AppError> {
    let routine = exercises::get_routine(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(routine_missing)?;
    let entries = exercises::list_routine_exercises(&state.pool, user.id, Some(id))
        .await
        .map_err(AppError::internal)?;
    Ok(Json(RoutineDetail {
        routine,
        exercises: entries,
    }))
}

async fn delete_routine(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = exercises::delete_routine(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?;
    deleted(removed, "Routine not found.")
}

// ---------------------------------------------------------------------------
// Routine exercises
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RoutineFilter {
    routine: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct RoutineExerciseRequest {
    routine: Uuid,
    exercise: Uuid,
    day_of_week: Option<String>,
    weight_goal: Option<i32>,
    reps_goal: Option<i32>,
    duration: Option<i32>,
    distance: Option<f64>,
    pace: Option<f64>,
    average_velocity: Option<f64>,
}

fn routine_exercise_missing() -> AppError {
    AppError::not_found("Routine exercise not found.")
}

async fn list_routine_exercises(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(filter): Query<RoutineFilter>,
) -> Result<Json<Vec<RoutineExerciseDetail>>, AppError> {
    let rows = exercises::list_routine_exercises(&state.pool, user.id, filter.routine)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows))
}

async fn create_routine_exercise(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<RoutineExerciseRequest>,
) -> Result<Response, AppError> {
    exercises::get_routine(&state.pool, user.id, req.routine)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(routine_missing)?;
    let exercise = exercises::get_exercise(&state.pool, req.exercise)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(exercise_missing)?;

    let targets = NewRoutineExercise {
        day_of_week: req.day_of_week,
        weight_goal: req.weight_goal,
        reps_goal: req.reps_goal,
        duration: req.duration,
        distance: req.distance,
        pace: req.pace,
        average_velocity: req.average_velocity,
    };
    validate_routine_exercise(exercise.exercise_type, &targets)
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    let row = exercises::insert_routine_exercise(&state.pool, req.routine, exercise.id, &targets)
        .await
        .map_err(AppError::internal)?;

    let detail = exercises::get_routine_exercise(&state.pool, user.id, row.id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(routine_exercise_missing)?;
    Ok(created(detail))
}

async fn get_routine_exercise(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RoutineExerciseDetail>, AppError> {
    exercises::get_routine_exercise(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?
        .map(Json)
        .ok_or_else(routine_exercise_missing)
}

async fn delete_routine_exercise(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = exercises::delete_routine_exercise(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?;
    deleted(removed, "Routine exercise not found.")
}

// ---------------------------------------------------------------------------
// Exercise logs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ExerciseLogRequest {
    routine_exercise: Uuid,
    date_logged: Option<NaiveDate>,
    weight: Option<i32>,
    reps: Option<i32>,
    distance_logged: Option<f64>,
    average_velocity_logged: Option<f64>,
    pace_logged: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProgressQuery {
    routine_exercise: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

async fn list_logs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ExerciseLog>>, AppError> {
    let rows = exercises::list_exercise_logs(&state.pool, user.id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows))
}

async fn create_log(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<ExerciseLogRequest>,
) -> Result<Response, AppError> {
    if req.weight.is_some_and(|w| w < 0) || req.reps.is_some_and(|r| r < 0) {
        return Err(AppError::bad_request("Weight and reps cannot be negative."));
    }

    exercises::get_routine_exercise(&state.pool, user.id, req.routine_exercise)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(routine_exercise_missing)?;

    let new = NewExerciseLog {
        date_logged: req.date_logged.unwrap_or_else(today),
        weight: req.weight,
        reps: req.reps,
        distance_logged: req.distance_logged,
        average_velocity_logged: req.average_velocity_logged,
        pace_logged: req.pace_logged,
    };
    let log = exercises::insert_exercise_log(&state.pool, user.id, req.routine_exercise, &new)
        .await
        .map_err(AppError::internal)?;
    Ok(created(log))
}

async fn delete_log(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = exercises::delete_exercise_log(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?;
    deleted(removed, "Exercise log not found.")
}

async fn progress(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<Vec<ExerciseProgressPoint>>, AppError> {
    let to = query.to.unwrap_or_else(today);
    let from = match query.from {
        Some(from) => from,
        None => to
            .checked_sub_days(Days::new(DEFAULT_PROGRESS_DAYS))
            .unwrap_or(NaiveDate::MIN),
    };
    if from > to {
        return Err(AppError::bad_request("`from` must not be after `to`."));
    }

    exercises::get_routine_exercise(&state.pool, user.id, query.routine_exercise)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(routine_exercise_missing)?;

    let points =
        exercises::exercise_progress(&state.pool, user.id, query.routine_exercise, from, to)
            .await
            .map_err(AppError::internal)?;
    Ok(Json(points))
}

// ---------------------------------------------------------------------------
// Training goals
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TrainingGoalRequest {
    description: String,
    target_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct TrainingGoalUpdate {
    achieved: bool,
}

async fn list_goals(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<TrainingGoal>>, AppError> {
    let rows = exercises::list_training_goals(&state.pool, user.id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows))
}

async fn create_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<TrainingGoalRequest>,
) -> Result<Response, AppError> {
    if req.description.trim().is_empty() {
        return Err(AppError::bad_request("Description is required."));
    }
    let goal =
        exercises::insert_training_goal(&state.pool, user.id, &req.description, req.target_date)
            .await
            .map_err(AppError::internal)?;
    Ok(created(goal))
}

async fn update_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<TrainingGoalUpdate>,
) -> Result<Json<TrainingGoal>, AppError> {
    exercises::set_training_goal_achieved(&state.pool, user.id, id, req.achieved)
        .await
        .map_err(AppError::internal)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Training goal not found."))
}

async fn delete_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = exercises::delete_training_goal(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?;
    deleted(removed, "Training goal not found.")
}
