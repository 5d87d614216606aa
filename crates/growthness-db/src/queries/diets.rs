//! Database query functions for the `foods`, `meals` and `meal_foods` tables.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::{Food, Meal, MealFood, MealFoodDetail};

// ---------------------------------------------------------------------------
// Foods
// ---------------------------------------------------------------------------

/// Nutrition values of a food, per serving.
#[derive(Debug, Clone, Copy)]
pub struct NewFood<'a> {
    pub name: &'a str,
    pub calories: i32,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

/// Insert a food. Fails with a unique violation on a duplicate name.
pub async fn insert_food(pool: &PgPool, new: &NewFood<'_>) -> Result<Food> {
    let food = sqlx::query_as::<_, Food>(
        "INSERT INTO foods (name, calories, protein, carbs, fat) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.calories)
    .bind(new.protein)
    .bind(new.carbs)
    .bind(new.fat)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert food {:?}", new.name))?;

    Ok(food)
}

/// List all foods by name.
pub async fn list_foods(pool: &PgPool) -> Result<Vec<Food>> {
    let foods = sqlx::query_as::<_, Food>("SELECT * FROM foods ORDER BY name")
        .fetch_all(pool)
        .await
        .context("failed to list foods")?;

    Ok(foods)
}

pub async fn get_food(pool: &PgPool, id: Uuid) -> Result<Option<Food>> {
    let food = sqlx::query_as::<_, Food>("SELECT * FROM foods WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch food")?;

    Ok(food)
}

/// Return the food named `new.name`, creating it with `new`'s nutrition if
/// absent. An existing food keeps its stored values.
pub async fn get_or_create_food(conn: &mut PgConnection, new: &NewFood<'_>) -> Result<Food> {
    let row = sqlx::query_as::<_, Food>(
        "WITH ins AS ( \
             INSERT INTO foods (name, calories, protein, carbs, fat) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (name) DO NOTHING \
             RETURNING * \
         ) \
         SELECT * FROM ins \
         UNION ALL \
         SELECT * FROM foods WHERE name = $1 \
         LIMIT 1",
    )
    .bind(new.name)
    .bind(new.calories)
    .bind(new.protein)
    .bind(new.carbs)
    .bind(new.fat)
    .fetch_optional(&mut *conn)
    .await
    .with_context(|| format!("failed to get or create food {:?}", new.name))?;

    if let Some(row) = row {
        return Ok(row);
    }

    sqlx::query_as::<_, Food>("SELECT * FROM foods WHERE name = $1")
        .bind(new.name)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to fetch food {:?}", new.name))
}

// ---------------------------------------------------------------------------
// Meals
// ---------------------------------------------------------------------------

/// Insert a meal. Fails with a unique violation on a duplicate
/// `(user, name, date)`.
pub async fn insert_meal<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    name: &str,
    date: NaiveDate,
) -> Result<Meal> {
    let meal = sqlx::query_as::<_, Meal>(
        "INSERT INTO meals (user_id, name, date) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(name)
    .bind(date)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert meal {name:?}"))?;

    Ok(meal)
}

#[derive(sqlx::FromRow)]
struct MealUpsert {
    #[sqlx(flatten)]
    meal: Meal,
    created: bool,
}

/// Return the user's meal `name` on `date`, creating it if absent. The flag
/// is true when this call inserted the row.
pub async fn get_or_create_meal(
    conn: &mut PgConnection,
    user_id: Uuid,
    name: &str,
    date: NaiveDate,
) -> Result<(Meal, bool)> {
    let row = sqlx::query_as::<_, MealUpsert>(
        "WITH ins AS ( \
             INSERT INTO meals (user_id, name, date) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, name, date) DO NOTHING \
             RETURNING * \
         ) \
         SELECT ins.*, TRUE AS created FROM ins \
         UNION ALL \
         SELECT meals.*, FALSE AS created FROM meals \
         WHERE user_id = $1 AND name = $2 AND date = $3 \
         LIMIT 1",
    )
    .bind(user_id)
    .bind(name)
    .bind(date)
    .fetch_optional(&mut *conn)
    .await
    .with_context(|| format!("failed to get or create meal {name:?}"))?;

    if let Some(row) = row {
        return Ok((row.meal, row.created));
    }

    // Inserted concurrently after our snapshot was taken.
    let meal = sqlx::query_as::<_, Meal>(
        "SELECT * FROM meals WHERE user_id = $1 AND name = $2 AND date = $3",
    )
    .bind(user_id)
    .bind(name)
    .bind(date)
    .fetch_one(&mut *conn)
    .await
    .with_context(|| format!("failed to fetch meal {name:?}"))?;
    Ok((meal, false))
}

/// Add a food to a meal.
pub async fn insert_meal_food<'e>(
    executor: impl PgExecutor<'e>,
    meal_id: Uuid,
    food_id: Uuid,
    servings: f64,
) -> Result<MealFood> {
    let row = sqlx::query_as::<_, MealFood>(
        "INSERT INTO meal_foods (meal_id, food_id, servings) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(meal_id)
    .bind(food_id)
    .bind(servings)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to add food {food_id} to meal {meal_id}"))?;

    Ok(row)
}

/// Insert a meal and its `(food_id, servings)` entries in one transaction.
pub async fn create_meal_with_foods(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    date: NaiveDate,
    foods: &[(Uuid, f64)],
) -> Result<Meal> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let meal = insert_meal(&mut *tx, user_id, name, date).await?;
    for (food_id, servings) in foods {
        insert_meal_food(&mut *tx, meal.id, *food_id, *servings).await?;
    }

    tx.commit().await.context("failed to commit transaction")?;
    Ok(meal)
}

/// List a user's meals, newest date first.
pub async fn list_meals(pool: &PgPool, user_id: Uuid) -> Result<Vec<Meal>> {
    let meals = sqlx::query_as::<_, Meal>(
        "SELECT * FROM meals WHERE user_id = $1 ORDER BY date DESC, name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list meals")?;

    Ok(meals)
}

pub async fn get_meal(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>("SELECT * FROM meals WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch meal")?;

    Ok(meal)
}

/// The foods of a meal with their servings, by food name.
pub async fn list_meal_foods(pool: &PgPool, meal_id: Uuid) -> Result<Vec<MealFoodDetail>> {
    let rows = sqlx::query_as::<_, MealFoodDetail>(
        "SELECT mf.servings, f.* \
         FROM meal_foods mf \
         JOIN foods f ON f.id = mf.food_id \
         WHERE mf.meal_id = $1 \
         ORDER BY f.name",
    )
    .bind(meal_id)
    .fetch_all(pool)
    .await
    .context("failed to list meal foods")?;

    Ok(rows)
}

pub async fn delete_meal(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM meals WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to delete meal")?;

    Ok(result.rows_affected() > 0)
}
