//! Database query functions for the `habits`, `habit_frequencies`,
//! `frequencies` and `habit_logs` tables.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::{Habit, HabitLog};

/// Column list producing a [`Habit`] row, frequencies included.
const HABIT_SELECT: &str = "SELECT h.id, h.user_id, h.name, h.goal, h.measure, \
     ARRAY(SELECT hf.frequency FROM habit_frequencies hf \
           WHERE hf.habit_id = h.id ORDER BY hf.frequency) AS frequencies, \
     h.created_at \
     FROM habits h";

/// Fields for a new or replaced habit.
#[derive(Debug, Clone, Copy)]
pub struct NewHabit<'a> {
    pub name: &'a str,
    pub goal: f64,
    pub measure: Option<&'a str>,
}

/// Return the subset of `names` that exist in the `frequencies` table.
pub async fn resolve_frequencies<'e>(
    executor: impl PgExecutor<'e>,
    names: &[String],
) -> Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM frequencies WHERE name = ANY($1) ORDER BY name")
            .bind(names)
            .fetch_all(executor)
            .await
            .context("failed to resolve frequencies")?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Insert a habit row without frequencies.
pub async fn insert_habit<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    habit: &NewHabit<'_>,
) -> Result<Habit> {
    let row = sqlx::query_as::<_, Habit>(
        "INSERT INTO habits (user_id, name, goal, measure) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, user_id, name, goal, measure, ARRAY[]::text[] AS frequencies, created_at",
    )
    .bind(user_id)
    .bind(habit.name)
    .bind(habit.goal)
    .bind(habit.measure)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert habit {:?}", habit.name))?;

    Ok(row)
}

/// Link a habit to frequencies by name. Already-linked names are skipped.
pub async fn attach_frequencies<'e>(
    executor: impl PgExecutor<'e>,
    habit_id: Uuid,
    frequencies: &[String],
) -> Result<()> {
    sqlx::query(
        "INSERT INTO habit_frequencies (habit_id, frequency) \
         SELECT $1, f FROM UNNEST($2::text[]) AS f \
         ON CONFLICT DO NOTHING",
    )
    .bind(habit_id)
    .bind(frequencies)
    .execute(executor)
    .await
    .with_context(|| format!("failed to attach frequencies to habit {habit_id}"))?;

    Ok(())
}

/// Insert a habit row and its frequencies inside one transaction.
///
/// The caller is expected to have validated `frequencies` with
/// [`resolve_frequencies`]; an unknown name fails the foreign key.
pub async fn create_habit(
    pool: &PgPool,
    user_id: Uuid,
    habit: &NewHabit<'_>,
    frequencies: &[String],
) -> Result<Habit> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let mut row = insert_habit(&mut *tx, user_id, habit).await?;
    attach_frequencies(&mut *tx, row.id, frequencies).await?;

    tx.commit().await.context("failed to commit transaction")?;

    let mut sorted = frequencies.to_vec();
    sorted.sort();
    sorted.dedup();
    row.frequencies = sorted;
    Ok(row)
}

/// List a user's habits, oldest first.
pub async fn list_habits(pool: &PgPool, user_id: Uuid) -> Result<Vec<Habit>> {
    let query = format!("{HABIT_SELECT} WHERE h.user_id = $1 ORDER BY h.created_at ASC");
    let habits = sqlx::query_as::<_, Habit>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("failed to list habits")?;

    Ok(habits)
}

/// Fetch one of a user's habits.
pub async fn get_habit(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<Habit>> {
    let query = format!("{HABIT_SELECT} WHERE h.id = $1 AND h.user_id = $2");
    let habit = sqlx::query_as::<_, Habit>(&query)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch habit")?;

    Ok(habit)
}

/// Replace a habit's fields and, when given, its frequency set.
///
/// Returns `None` when the habit does not exist or belongs to someone else.
pub async fn update_habit(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    habit: &NewHabit<'_>,
    frequencies: Option<&[String]>,
) -> Result<Option<Habit>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let updated = sqlx::query(
        "UPDATE habits SET name = $1, goal = $2, measure = $3 \
         WHERE id = $4 AND user_id = $5",
    )
    .bind(habit.name)
    .bind(habit.goal)
    .bind(habit.measure)
    .bind(id)
    .bind(user_id)
    .execute(&mut *tx)
    .await
    .context("failed to update habit")?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    if let Some(frequencies) = frequencies {
        replace_frequencies(&mut tx, id, frequencies).await?;
    }

    tx.commit().await.context("failed to commit transaction")?;

    get_habit(pool, user_id, id).await
}

async fn replace_frequencies(
    conn: &mut PgConnection,
    habit_id: Uuid,
    frequencies: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM habit_frequencies WHERE habit_id = $1")
        .bind(habit_id)
        .execute(&mut *conn)
        .await
        .context("failed to clear habit frequencies")?;

    attach_frequencies(&mut *conn, habit_id, frequencies).await
}

/// Delete one of a user's habits (logs cascade). Returns whether a row went.
pub async fn delete_habit(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM habits WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to delete habit")?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Habit logs
// ---------------------------------------------------------------------------

/// Insert a log entry for a habit.
pub async fn insert_habit_log<'e>(
    executor: impl PgExecutor<'e>,
    habit_id: Uuid,
    date: NaiveDate,
    amount: f64,
) -> Result<HabitLog> {
    let log = sqlx::query_as::<_, HabitLog>(
        "INSERT INTO habit_logs (habit_id, date, amount) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(habit_id)
    .bind(date)
    .bind(amount)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert log for habit {habit_id}"))?;

    Ok(log)
}

/// List logs of the user's habits, newest date first. `habit_id` narrows
/// the list to one habit.
pub async fn list_habit_logs(
    pool: &PgPool,
    user_id: Uuid,
    habit_id: Option<Uuid>,
) -> Result<Vec<HabitLog>> {
    let logs = sqlx::query_as::<_, HabitLog>(
        "SELECT l.* FROM habit_logs l \
         JOIN habits h ON h.id = l.habit_id \
         WHERE h.user_id = $1 AND ($2::uuid IS NULL OR l.habit_id = $2) \
         ORDER BY l.date DESC, l.created_at DESC",
    )
    .bind(user_id)
    .bind(habit_id)
    .fetch_all(pool)
    .await
    .context("failed to list habit logs")?;

    Ok(logs)
}

/// Fetch one log entry, if it belongs to one of the user's habits.
pub async fn get_habit_log(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<HabitLog>> {
    let log = sqlx::query_as::<_, HabitLog>(
        "SELECT l.* FROM habit_logs l \
         JOIN habits h ON h.id = l.habit_id \
         WHERE l.id = $1 AND h.user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch habit log")?;

    Ok(log)
}

/// Delete a log entry of one of the user's habits.
pub async fn delete_habit_log(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        "DELETE FROM habit_logs l USING habits h \
         WHERE l.habit_id = h.id AND l.id = $1 AND h.user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("failed to delete habit log")?;

    Ok(result.rows_affected() > 0)
}
