//! HTTP handlers, one module per resource group. Each exposes the routers
//! that [`crate::serve_cmd::build_router`] nests under `/api`.

pub mod ai;
pub mod auth;
pub mod diets;
pub mod exercises;
pub mod habits;
pub mod profile;

#[cfg(test)]
pub mod test_support;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `201 Created` with `value` as the body.
fn created<T: Serialize>(value: T) -> Response {
    (StatusCode::CREATED, Json(value)).into_response()
}

/// `204 No Content` when a row was deleted, otherwise a 404 with `missing`.
fn deleted(removed: bool, missing: &str) -> Result<StatusCode, crate::error::AppError> {
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(crate::error::AppError::not_found(missing))
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
