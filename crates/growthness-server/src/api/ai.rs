//! `POST /api/ai/generate`: cache-or-generate a plan for the caller's goal
//! and write it into their habits, routines and meals.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::{error, info};

use growthness_core::plan::{PlanError, generate_plan_for_user};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::serve_cmd::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/generate", post(generate).get(method_not_supported))
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::MissingGoal => AppError::bad_request(err.to_string()),
            PlanError::Generation(_) | PlanError::DataFormat(_) => {
                error!(error = %err, "plan generation failed");
                AppError::internal_message("Error generating data")
            }
            PlanError::InvalidFrequency(_) => {
                error!(error = %err, "plan materialization failed");
                AppError::internal_message(err.to_string())
            }
            PlanError::Unexpected(e) => {
                error!(error = %format!("{e:#}"), "plan flow failed");
                AppError::internal_message("An unexpected error occurred.")
            }
        }
    }
}

async fn generate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let request: Value =
        serde_json::from_slice(&body).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let outcome =
        generate_plan_for_user(&state.pool, state.generator.as_ref(), user.id, &request).await?;

    info!(
        user_id = %user.id,
        source = ?outcome.source,
        habits = outcome.summary.habits,
        routine_exercises = outcome.summary.routine_exercises,
        meals = outcome.summary.meals,
        "plan applied"
    );
    Ok(Json(json!({"detail": "OK"})))
}

async fn method_not_supported() -> AppError {
    AppError::bad_request("Method Not Supported")
}
