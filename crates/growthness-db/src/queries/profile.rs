//! Database query functions for the `fitness_goals` reference table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::FitnessGoal;

/// List every selectable fitness goal, in seed order.
pub async fn list_fitness_goals(pool: &PgPool) -> Result<Vec<FitnessGoal>> {
    let goals = sqlx::query_as::<_, FitnessGoal>("SELECT * FROM fitness_goals ORDER BY id")
        .fetch_all(pool)
        .await
        .context("failed to list fitness goals")?;

    Ok(goals)
}

/// Fetch a fitness goal by ID.
pub async fn get_fitness_goal(pool: &PgPool, id: i32) -> Result<Option<FitnessGoal>> {
    let goal = sqlx::query_as::<_, FitnessGoal>("SELECT * FROM fitness_goals WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch fitness goal")?;

    Ok(goal)
}
