//! Database query functions for the `users` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

/// Fields for a new account.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Partial profile update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileUpdate<'a> {
    pub weight: Option<f64>,
    pub weight_measure: Option<&'a str>,
    pub height: Option<f64>,
    pub height_measure: Option<&'a str>,
    pub birth_date: Option<NaiveDate>,
    pub fitness_goal_id: Option<i32>,
}

/// Insert a new user. Fails with a unique violation if the e-mail is taken.
pub async fn insert_user(pool: &PgPool, new: &NewUser<'_>) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, first_name, last_name) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.first_name)
    .bind(new.last_name)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert user {:?}", new.email))?;

    Ok(user)
}

/// Fetch a user by ID.
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// Fetch a user by e-mail (exact match).
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user by email")?;

    Ok(user)
}

/// Replace a user's password hash.
pub async fn update_password_hash(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<()> {
    let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update password")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("user {id} not found");
    }

    Ok(())
}

/// Apply a partial profile update and return the updated user.
pub async fn update_profile(pool: &PgPool, id: Uuid, update: &ProfileUpdate<'_>) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET \
             weight = COALESCE($2, weight), \
             weight_measure = COALESCE($3, weight_measure), \
             height = COALESCE($4, height), \
             height_measure = COALESCE($5, height_measure), \
             birth_date = COALESCE($6, birth_date), \
             fitness_goal_id = COALESCE($7, fitness_goal_id) \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(update.weight)
    .bind(update.weight_measure)
    .bind(update.height)
    .bind(update.height_measure)
    .bind(update.birth_date)
    .bind(update.fitness_goal_id)
    .fetch_optional(pool)
    .await
    .context("failed to update profile")?;

    user.with_context(|| format!("user {id} not found"))
}
