//! Registration, token issuance, password changes and password resets.

use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use growthness_core::password::{PasswordError, check_strength, hash_password, verify_password};
use growthness_core::token::{
    issue_reset_token, issue_token, reset_token_user, validate_reset_token,
};
use growthness_db::queries::is_unique_violation;
use growthness_db::queries::users::{self, NewUser};

use super::created;
use crate::auth::AuthUser;
use crate::error::{AppError, JsonBody};
use crate::serve_cmd::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(token))
        .route("/protected", get(protected))
        .route("/change-password", post(change_password))
        .route("/password-reset-request", post(password_reset_request))
        .route("/password-reset-confirm", post(password_reset_confirm))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    password2: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
    confirm_password: String,
}

#[derive(Debug, Deserialize)]
struct ResetRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
struct ResetConfirmRequest {
    token: String,
    new_password: String,
    confirm_password: String,
}

/// Minimal shape check: one `@`, a non-empty local part and a dotted domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn hashing_failed(err: PasswordError) -> AppError {
    AppError::internal(anyhow::Error::new(err))
}

// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_off_thread(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::internal(anyhow::Error::new(e).context("hashing task failed")))?
        .map_err(hashing_failed)
}

async fn verify_off_thread(password: String, stored: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AppError::internal(anyhow::Error::new(e).context("verify task failed")))?
        .map_err(hashing_failed)
}

async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<Response, AppError> {
    let email = req.email.trim();
    if !is_valid_email(email) {
        return Err(AppError::bad_request("Enter a valid email address."));
    }
    if req.password != req.password2 {
        return Err(AppError::bad_request("Passwords do not match."));
    }
    check_strength(&req.password).map_err(|e| AppError::bad_request(e.to_string()))?;

    let hash = hash_off_thread(req.password).await?;
    let new = NewUser {
        email,
        password_hash: Some(&hash),
        first_name: &req.first_name,
        last_name: &req.last_name,
    };
    match users::insert_user(&state.pool, &new).await {
        Ok(user) => {
            info!(user_id = %user.id, "user registered");
            Ok(created(json!({"message": "User registered successfully"})))
        }
        Err(e) if is_unique_violation(&e) => Err(AppError::bad_request(
            "A user with that email already exists.",
        )),
        Err(e) => Err(AppError::internal(e)),
    }
}

async fn token(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TokenRequest>,
) -> Result<Json<Value>, AppError> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(AppError::bad_request("Email and password are required."));
    };

    let bad_credentials =
        || AppError::unauthorized("No active account found with the given credentials");

    let user = users::get_user_by_email(&state.pool, email.trim())
        .await
        .map_err(AppError::internal)?
        .ok_or_else(bad_credentials)?;
    let stored = user.password_hash.clone().ok_or_else(bad_credentials)?;
    if !verify_off_thread(password, stored).await? {
        return Err(bad_credentials());
    }

    let issued = issue_token(&state.tokens, user.id, Utc::now());
    info!(user_id = %user.id, "access token issued");
    Ok(Json(json!({
        "access": issued.token,
        "token_type": "Bearer",
        "expires_at": issued.expires_at,
    })))
}

async fn protected(AuthUser(_user): AuthUser) -> Json<Value> {
    Json(json!({"message": "This is a protected view!"}))
}

async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let old_ok = match user.password_hash.clone() {
        Some(stored) => verify_off_thread(req.old_password, stored).await?,
        None => false,
    };
    if !old_ok {
        return Err(AppError::bad_request("Old password is incorrect."));
    }
    if req.new_password != req.confirm_password {
        return Err(AppError::bad_request("New passwords do not match."));
    }
    check_strength(&req.new_password).map_err(|e| AppError::bad_request(e.to_string()))?;

    let hash = hash_off_thread(req.new_password).await?;
    users::update_password_hash(&state.pool, user.id, &hash)
        .await
        .map_err(AppError::internal)?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(json!({"message": "Password updated successfully"})))
}

/// Issue a reset token for a known e-mail. There is no mail transport;
/// the link goes to the log.
async fn password_reset_request(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ResetRequest>,
) -> Result<Json<Value>, AppError> {
    let user = users::get_user_by_email(&state.pool, req.email.trim())
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| {
            AppError::bad_request("There is no user registered with this email address.")
        })?;

    let issued = issue_reset_token(
        &state.tokens,
        user.id,
        user.password_hash.as_deref(),
        Utc::now(),
    );
    info!(
        user_id = %user.id,
        expires_at = %issued.expires_at,
        link = %format!("/reset-password/{}/", issued.token),
        "password reset link issued"
    );
    Ok(Json(json!({"message": "Password reset link sent."})))
}

async fn password_reset_confirm(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ResetConfirmRequest>,
) -> Result<Json<Value>, AppError> {
    if req.new_password != req.confirm_password {
        return Err(AppError::bad_request("Passwords do not match."));
    }

    let bad_token = || AppError::bad_request("Invalid or expired token.");
    let user_id = reset_token_user(&req.token).map_err(|_| bad_token())?;
    let user = users::get_user(&state.pool, user_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::bad_request("Invalid user."))?;
    validate_reset_token(
        &state.tokens,
        &req.token,
        user.password_hash.as_deref(),
        Utc::now(),
    )
    .map_err(|_| bad_token())?;

    check_strength(&req.new_password).map_err(|e| AppError::bad_request(e.to_string()))?;

    let hash = hash_off_thread(req.new_password).await?;
    users::update_password_hash(&state.pool, user.id, &hash)
        .await
        .map_err(AppError::internal)?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(json!({"message": "Password has been reset successfully."})))
}
