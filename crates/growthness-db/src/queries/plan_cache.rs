//! Database query functions for the `plan_cache` table.
//!
//! Entries are keyed by the literal goal string: no case folding, no
//! whitespace trimming. The first stored plan for a goal wins and is never
//! replaced.

use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};

use crate::models::CachedPlan;

/// Fetch the cached plan for `goal`, if any.
pub async fn lookup<'e>(executor: impl PgExecutor<'e>, goal: &str) -> Result<Option<CachedPlan>> {
    let plan = sqlx::query_as::<_, CachedPlan>("SELECT * FROM plan_cache WHERE goal = $1")
        .bind(goal)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("failed to look up cached plan for goal {goal:?}"))?;

    Ok(plan)
}

/// Store `plan_data` under `goal` unless an entry already exists, and return
/// whichever entry is now stored.
pub async fn store(pool: &PgPool, goal: &str, plan_data: &serde_json::Value) -> Result<CachedPlan> {
    let row = sqlx::query_as::<_, CachedPlan>(
        "WITH ins AS ( \
             INSERT INTO plan_cache (goal, plan_data) VALUES ($1, $2) \
             ON CONFLICT (goal) DO NOTHING \
             RETURNING * \
         ) \
         SELECT * FROM ins \
         UNION ALL \
         SELECT * FROM plan_cache WHERE goal = $1 \
         LIMIT 1",
    )
    .bind(goal)
    .bind(plan_data)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to store plan for goal {goal:?}"))?;

    if let Some(row) = row {
        return Ok(row);
    }

    // Lost the race to a writer whose row was not yet visible to our snapshot.
    lookup(pool, goal)
        .await?
        .with_context(|| format!("cached plan for goal {goal:?} vanished after conflict"))
}

/// Number of cached plans.
pub async fn count(pool: &PgPool) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM plan_cache")
        .fetch_one(pool)
        .await
        .context("failed to count cached plans")?;

    Ok(n)
}
