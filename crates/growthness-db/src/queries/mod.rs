//! Query functions, one module per table group.
//!
//! Single-statement functions that also run inside the plan materialization
//! transaction take any [`sqlx::PgExecutor`]; multi-statement get-or-create
//! helpers take a `&mut PgConnection` so they can be handed `&mut *tx`.

pub mod diets;
pub mod exercises;
pub mod habits;
pub mod plan_cache;
pub mod profile;
pub mod users;

/// Whether `err` (or any error it wraps) is a PostgreSQL unique violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        database_error_kind(err),
        Some(sqlx::error::ErrorKind::UniqueViolation)
    )
}

/// Whether `err` (or any error it wraps) is a PostgreSQL foreign key violation.
pub fn is_foreign_key_violation(err: &anyhow::Error) -> bool {
    matches!(
        database_error_kind(err),
        Some(sqlx::error::ErrorKind::ForeignKeyViolation)
    )
}

fn database_error_kind(err: &anyhow::Error) -> Option<sqlx::error::ErrorKind> {
    err.chain().find_map(|cause| match cause.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => Some(db_err.kind()),
        _ => None,
    })
}
