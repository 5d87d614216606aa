//! Plan service layer.
//!
//! Turns a plan request into rows for a user: look the goal up in the plan
//! cache, call the generator on a miss, store what it produced, then
//! materialize. A cached plan is materialized again on every request that
//! hits it.

use anyhow::Context;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use growthness_db::queries::plan_cache;

use super::document::PlanDocument;
use super::error::PlanError;
use super::materialize::{MaterializeSummary, materialize_plan};
use crate::llm::PlanGenerator;

/// Where the materialized plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Cache,
    Generated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOutcome {
    pub source: PlanSource,
    pub summary: MaterializeSummary,
}

/// Extract the cache key from a request body. Only an empty or missing
/// string is rejected; the goal is otherwise used verbatim.
pub fn goal_of(request: &Value) -> Result<&str, PlanError> {
    request
        .get("goal")
        .and_then(Value::as_str)
        .filter(|goal| !goal.is_empty())
        .ok_or(PlanError::MissingGoal)
}

/// Fetch the plan for the request's goal, generating and caching it if
/// needed. The generator sees the whole request body.
pub async fn get_or_generate_plan(
    pool: &PgPool,
    generator: &dyn PlanGenerator,
    request: &Value,
) -> Result<(PlanDocument, PlanSource), PlanError> {
    let goal = goal_of(request)?;

    if let Some(cached) = plan_cache::lookup(pool, goal).await? {
        info!(goal, "plan cache hit");
        let plan = PlanDocument::from_value(cached.plan_data)
            .map_err(|e| PlanError::DataFormat(e.to_string()))?;
        return Ok((plan, PlanSource::Cache));
    }

    info!(goal, generator = generator.name(), "plan cache miss, generating");
    let plan = generator.generate(request).await.map_err(|e| {
        warn!(goal, error = %e, "plan generation failed");
        PlanError::from(e)
    })?;

    let plan_data = serde_json::to_value(&plan).context("failed to serialize plan")?;
    let stored = plan_cache::store(pool, goal, &plan_data).await?;

    if stored.plan_data == plan_data {
        return Ok((plan, PlanSource::Generated));
    }

    // A concurrent request cached its plan first; use the stored one.
    info!(goal, "plan cache already filled by a concurrent request");
    let plan = PlanDocument::from_value(stored.plan_data)
        .map_err(|e| PlanError::DataFormat(e.to_string()))?;
    Ok((plan, PlanSource::Generated))
}

/// Resolve the plan for `request` and write it into `user_id`'s rows.
///
/// A generation failure leaves nothing behind. A materialization failure
/// rolls back its own rows but keeps the freshly cached plan.
pub async fn generate_plan_for_user(
    pool: &PgPool,
    generator: &dyn PlanGenerator,
    user_id: Uuid,
    request: &Value,
) -> Result<PlanOutcome, PlanError> {
    let (plan, source) = get_or_generate_plan(pool, generator, request).await?;

    let today = Utc::now().date_naive();
    let summary = materialize_plan(pool, user_id, &plan, today).await?;

    Ok(PlanOutcome { source, summary })
}
