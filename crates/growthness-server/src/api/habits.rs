use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use growthness_db::models::{Habit, HabitLog};
use growthness_db::queries::habits::{self, NewHabit};

use super::{created, deleted, today};
use crate::auth::AuthUser;
use crate::error::{AppError, JsonBody, Path, Query};
use crate::serve_cmd::AppState;

pub fn habit_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_habits).post(create_habit))
        .route(
            "/{id}",
            get(get_habit).put(update_habit).delete(delete_habit),
        )
}

pub fn log_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_logs).post(create_log))
        .route("/{id}", get(get_log).delete(delete_log))
}

#[derive(Debug, Deserialize)]
struct HabitRequest {
    name: String,
    goal: f64,
    measure: Option<String>,
    frequencies: Option<Vec<String>>,
}

impl HabitRequest {
    fn as_new(&self) -> NewHabit<'_> {
        NewHabit {
            name: &self.name,
            goal: self.goal,
            measure: self.measure.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LogFilter {
    habit: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct HabitLogRequest {
    habit: Uuid,
    date: Option<NaiveDate>,
    amount: f64,
}

/// Sorted, deduplicated frequency names; 400 if any is unknown.
async fn checked_frequencies(state: &AppState, names: &[String]) -> Result<Vec<String>, AppError> {
    let mut wanted = names.to_vec();
    wanted.sort();
    wanted.dedup();

    let known = habits::resolve_frequencies(&state.pool, &wanted)
        .await
        .map_err(AppError::internal)?;
    if let Some(unknown) = wanted.iter().find(|name| !known.contains(name)) {
        return Err(AppError::bad_request(format!("Invalid frequency: {unknown}")));
    }
    Ok(wanted)
}

fn habit_missing() -> AppError {
    AppError::not_found("Habit not found.")
}

async fn list_habits(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Habit>>, AppError> {
    let rows = habits::list_habits(&state.pool, user.id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows))
}

async fn create_habit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<HabitRequest>,
) -> Result<Response, AppError> {
    let frequencies =
        checked_frequencies(&state, req.frequencies.as_deref().unwrap_or_default()).await?;
    let habit = habits::create_habit(&state.pool, user.id, &req.as_new(), &frequencies)
        .await
        .map_err(AppError::internal)?;
    Ok(created(habit))
}

async fn get_habit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Habit>, AppError> {
    habits::get_habit(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?
        .map(Json)
        .ok_or_else(habit_missing)
}

async fn update_habit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<HabitRequest>,
) -> Result<Json<Habit>, AppError> {
    let frequencies = match req.frequencies.as_deref() {
        Some(names) => Some(checked_frequencies(&state, names).await?),
        None => None,
    };
    habits::update_habit(
        &state.pool,
        user.id,
        id,
        &req.as_new(),
        frequencies.as_deref(),
    )
    .await
    .map_err(AppError::internal)?
    .map(Json)
    .ok_or_else(habit_missing)
}

async fn delete_habit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = habits::delete_habit(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?;
    deleted(removed, "Habit not found.")
}

async fn list_logs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(filter): Query<LogFilter>,
) -> Result<Json<Vec<HabitLog>>, AppError> {
    let rows = habits::list_habit_logs(&state.pool, user.id, filter.habit)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows))
}

async fn create_log(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<HabitLogRequest>,
) -> Result<Response, AppError> {
    habits::get_habit(&state.pool, user.id, req.habit)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(habit_missing)?;

    let log = habits::insert_habit_log(
        &state.pool,
        req.habit,
        req.date.unwrap_or_else(today),
        req.amount,
    )
    .await
    .map_err(AppError::internal)?;
    Ok(created(log))
}

async fn get_log(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<HabitLog>, AppError> {
    habits::get_habit_log(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Habit log not found."))
}

async fn delete_log(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = habits::delete_habit_log(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?;
    deleted(removed, "Habit log not found.")
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::test_support::TestApp;

    #[tokio::test]
    async fn habit_crud() {
        let app = TestApp::new().await;
        let (_, token) = app.user("habits@example.com").await;

        let resp = app
            .request(
                Method::POST,
                "/api/habits",
                Some(&token),
                Some(json!({
                    "name": "Ler",
                    "goal": 20,
                    "measure": "páginas",
                    "frequencies": ["weekly", "daily", "daily"]
                })),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED);
        assert_eq!(resp.json["frequencies"], json!(["daily", "weekly"]));
        let id = resp.json["id"].as_str().unwrap().to_string();

        let resp = app
            .request(Method::PUT, &format!("/api/habits/{id}"), Some(&token),
                Some(json!({"name": "Ler mais", "goal": 30})))
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.json["name"], "Ler mais");
        assert_eq!(
            resp.json["frequencies"],
            json!(["daily", "weekly"]),
            "omitted frequencies are kept"
        );

        let resp = app
            .request(Method::GET, "/api/habits", Some(&token), None)
            .await;
        assert_eq!(resp.json.as_array().unwrap().len(), 1);

        let resp = app
            .request(Method::DELETE, &format!("/api/habits/{id}"), Some(&token), None)
            .await;
        assert_eq!(resp.status, StatusCode::NO_CONTENT);

        let resp = app
            .request(Method::GET, &format!("/api/habits/{id}"), Some(&token), None)
            .await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);

        app.finish().await;
    }

    #[tokio::test]
    async fn unknown_frequency_is_400() {
        let app = TestApp::new().await;
        let (_, token) = app.user("freq@example.com").await;

        let resp = app
            .request(
                Method::POST,
                "/api/habits",
                Some(&token),
                Some(json!({"name": "Meditar", "goal": 10, "frequencies": ["hourly"]})),
            )
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.json["detail"], "Invalid frequency: hourly");

        app.finish().await;
    }

    #[tokio::test]
    async fn malformed_ids_are_json_400s() {
        let app = TestApp::new().await;
        let (_, token) = app.user("badid@example.com").await;

        for uri in ["/api/habits/abc", "/api/habit-logs/12", "/api/habit-logs?habit=nope"] {
            let resp = app.request(Method::GET, uri, Some(&token), None).await;
            assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(resp.json["detail"].is_string(), "{uri}: {}", resp.json);
        }

        app.finish().await;
    }

    #[tokio::test]
    async fn habits_are_private() {
        let app = TestApp::new().await;
        let (_, owner) = app.user("owner@example.com").await;
        let (_, other) = app.user("other@example.com").await;

        let resp = app
            .request(Method::POST, "/api/habits", Some(&owner),
                Some(json!({"name": "Correr", "goal": 5})))
            .await;
        let id = resp.json["id"].as_str().unwrap().to_string();

        let resp = app
            .request(Method::GET, &format!("/api/habits/{id}"), Some(&other), None)
            .await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);

        let resp = app
            .request(Method::POST, "/api/habit-logs", Some(&other),
                Some(json!({"habit": id, "date": "2026-03-01", "amount": 3})))
            .await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);

        let resp = app
            .request(Method::DELETE, &format!("/api/habits/{id}"), Some(&other), None)
            .await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);

        app.finish().await;
    }

    #[tokio::test]
    async fn habit_logs_filter_by_habit() {
        let app = TestApp::new().await;
        let (_, token) = app.user("logs@example.com").await;

        let mut ids = Vec::new();
        for name in ["Água", "Passos"] {
            let resp = app
                .request(Method::POST, "/api/habits", Some(&token),
                    Some(json!({"name": name, "goal": 1})))
                .await;
            ids.push(resp.json["id"].as_str().unwrap().to_string());
        }

        for (habit, amount) in [(&ids[0], 1.5), (&ids[0], 2.0), (&ids[1], 9000.0)] {
            let resp = app
                .request(Method::POST, "/api/habit-logs", Some(&token),
                    Some(json!({"habit": habit, "date": "2026-03-01", "amount": amount})))
                .await;
            assert_eq!(resp.status, StatusCode::CREATED);
        }

        let resp = app
            .request(Method::GET, "/api/habit-logs", Some(&token), None)
            .await;
        assert_eq!(resp.json.as_array().unwrap().len(), 3);

        let resp = app
            .request(Method::GET, &format!("/api/habit-logs?habit={}", ids[0]), Some(&token), None)
            .await;
        let logs = resp.json.as_array().unwrap();
        assert_eq!(logs.len(), 2);
        let log_id = logs[0]["id"].as_str().unwrap().to_string();

        let resp = app
            .request(Method::GET, &format!("/api/habit-logs/{log_id}"), Some(&token), None)
            .await;
        assert_eq!(resp.status, StatusCode::OK);

        let resp = app
            .request(Method::DELETE, &format!("/api/habit-logs/{log_id}"), Some(&token), None)
            .await;
        assert_eq!(resp.status, StatusCode::NO_CONTENT);

        app.finish().await;
    }
}
