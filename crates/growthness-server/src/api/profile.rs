use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use growthness_db::models::{FitnessGoal, User};
use growthness_db::queries::profile;
use growthness_db::queries::users::{self, ProfileUpdate};

use crate::auth::AuthUser;
use crate::error::{AppError, JsonBody};
use crate::serve_cmd::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).patch(update_profile))
        .route("/goals", get(list_goals))
}

#[derive(Debug, Serialize)]
struct GoalChoice {
    id: i32,
    title: String,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
    #[serde(flatten)]
    user: User,
    goals: Vec<GoalChoice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfilePatch {
    weight: Option<f64>,
    weight_measure: Option<String>,
    height: Option<f64>,
    height_measure: Option<String>,
    birth_date: Option<NaiveDate>,
    goal: Option<i32>,
}

async fn profile_response(state: &AppState, user: User) -> Result<ProfileResponse, AppError> {
    let goals = profile::list_fitness_goals(&state.pool)
        .await
        .map_err(AppError::internal)?
        .into_iter()
        .map(|g| GoalChoice {
            selected: user.fitness_goal_id == Some(g.id),
            id: g.id,
            title: g.title,
        })
        .collect();
    Ok(ProfileResponse { user, goals })
}

async fn list_goals(State(state): State<AppState>) -> Result<Json<Vec<FitnessGoal>>, AppError> {
    let goals = profile::list_fitness_goals(&state.pool)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(goals))
}

async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    Ok(Json(profile_response(&state, user).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(patch): JsonBody<ProfilePatch>,
) -> Result<Json<ProfileResponse>, AppError> {
    if patch.weight.is_some_and(|w| w <= 0.0) || patch.height.is_some_and(|h| h <= 0.0) {
        return Err(AppError::bad_request("Weight and height must be positive."));
    }
    if let Some(goal_id) = patch.goal {
        profile::get_fitness_goal(&state.pool, goal_id)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::bad_request(format!("Invalid fitness goal: {goal_id}")))?;
    }

    let update = ProfileUpdate {
        weight: patch.weight,
        weight_measure: patch.weight_measure.as_deref(),
        height: patch.height,
        height_measure: patch.height_measure.as_deref(),
        birth_date: patch.birth_date,
        fitness_goal_id: patch.goal,
    };
    let updated = users::update_profile(&state.pool, user.id, &update)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(profile_response(&state, updated).await?))
}
