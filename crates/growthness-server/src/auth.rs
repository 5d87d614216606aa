//! Bearer-token authentication for handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use tracing::debug;

use growthness_core::token::validate_token;
use growthness_db::models::User;
use growthness_db::queries::users;

use crate::error::AppError;
use crate::serve_cmd::AppState;

/// The account behind a valid `Authorization: Bearer <token>` header.
/// Handlers that take it reject anonymous requests with 401.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::unauthorized("Authentication credentials were not provided.")
            })?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("Authorization header must be a Bearer token."))?;

        let claims = validate_token(&state.tokens, token, Utc::now()).map_err(|e| {
            debug!(error = %e, "rejected access token");
            AppError::unauthorized("Given token not valid for any token type")
        })?;

        let user = users::get_user(&state.pool, claims.user_id)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        Ok(Self(user))
    }
}
