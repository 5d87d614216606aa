use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use growthness_core::llm::PlanGenerator;
use growthness_core::token::TokenConfig;

use crate::api;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: TokenConfig,
    pub generator: Arc<dyn PlanGenerator>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", api::auth::router())
        .nest("/api/habits", api::habits::habit_router())
        .nest("/api/habit-logs", api::habits::log_router())
        .nest("/api/exercises", api::exercises::exercise_router())
        .nest("/api/routines", api::exercises::routine_router())
        .nest(
            "/api/routine-exercises",
            api::exercises::routine_exercise_router(),
        )
        .nest("/api/exercise-logs", api::exercises::log_router())
        .nest("/api/training-goals", api::exercises::training_goal_router())
        .nest("/api/foods", api::diets::food_router())
        .nest("/api/meals", api::diets::meal_router())
        .nest("/api/profile", api::profile::router())
        .nest("/api/ai", api::ai::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("growthness listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("growthness shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
