use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use growthness_db::models::{Food, Meal, MealFoodDetail};
use growthness_db::queries::diets::{self, NewFood};
use growthness_db::queries::{is_foreign_key_violation, is_unique_violation};

use super::{created, deleted, today};
use crate::auth::AuthUser;
use crate::error::{AppError, JsonBody, Path};
use crate::serve_cmd::AppState;

pub fn food_router() -> Router<AppState> {
    Router::new().route("/", get(list_foods).post(create_food))
}

pub fn meal_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meals).post(create_meal))
        .route("/{id}", get(get_meal).delete(delete_meal))
}

#[derive(Debug, Deserialize)]
struct FoodRequest {
    name: String,
    calories: i32,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MealRequest {
    name: String,
    date: Option<NaiveDate>,
    #[serde(default)]
    foods: Vec<MealFoodRequest>,
}

#[derive(Debug, Deserialize)]
struct MealFoodRequest {
    food: Uuid,
    #[serde(default = "one_serving")]
    servings: f64,
}

fn one_serving() -> f64 {
    1.0
}

#[derive(Debug, Serialize)]
struct MealDetail {
    #[serde(flatten)]
    meal: Meal,
    foods: Vec<MealFoodDetail>,
}

async fn list_foods(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<Food>>, AppError> {
    let rows = diets::list_foods(&state.pool)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows))
}

async fn create_food(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    JsonBody(req): JsonBody<FoodRequest>,
) -> Result<Response, AppError> {
    if req.calories < 0 {
        return Err(AppError::bad_request("Calories cannot be negative."));
    }
    let new = NewFood {
        name: &req.name,
        calories: req.calories,
        protein: req.protein,
        carbs: req.carbs,
        fat: req.fat,
    };
    match diets::insert_food(&state.pool, &new).await {
        Ok(food) => Ok(created(food)),
        Err(e) if is_unique_violation(&e) => Err(AppError::conflict(
            "A food with this name already exists.",
        )),
        Err(e) => Err(AppError::internal(e)),
    }
}

async fn list_meals(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Meal>>, AppError> {
    let rows = diets::list_meals(&state.pool, user.id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows))
}

async fn meal_detail(state: &AppState, meal: Meal) -> Result<MealDetail, AppError> {
    let foods = diets::list_meal_foods(&state.pool, meal.id)
        .await
        .map_err(AppError::internal)?;
    Ok(MealDetail { meal, foods })
}

async fn create_meal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<MealRequest>,
) -> Result<Response, AppError> {
    if req.foods.iter().any(|f| f.servings <= 0.0) {
        return Err(AppError::bad_request("Servings must be positive."));
    }
    let foods: Vec<(Uuid, f64)> = req.foods.iter().map(|f| (f.food, f.servings)).collect();
    let date = req.date.unwrap_or_else(today);

    let meal = match diets::create_meal_with_foods(&state.pool, user.id, &req.name, date, &foods)
        .await
    {
        Ok(meal) => meal,
        Err(e) if is_foreign_key_violation(&e) => {
            return Err(AppError::not_found("Food not found."));
        }
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::conflict(
                "A meal with this name already exists for this date.",
            ));
        }
        Err(e) => return Err(AppError::internal(e)),
    };

    Ok(created(meal_detail(&state, meal).await?))
}

async fn get_meal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MealDetail>, AppError> {
    let meal = diets::get_meal(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found("Meal not found."))?;
    Ok(Json(meal_detail(&state, meal).await?))
}

async fn delete_meal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = diets::delete_meal(&state.pool, user.id, id)
        .await
        .map_err(AppError::internal)?;
    deleted(removed, "Meal not found.")
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::test_support::TestApp;

    #[tokio::test]
    async fn foods_are_unique_by_name() {
        let app = TestApp::new().await;
        let (_, token) = app.user("foods@example.com").await;

        let body = json!({"name": "Banana", "calories": 89, "protein": 1.1});
        let resp = app
            .request(Method::POST, "/api/foods", Some(&token), Some(body.clone()))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED);
        let resp = app
            .request(Method::POST, "/api/foods", Some(&token), Some(body))
            .await;
        assert_eq!(resp.status, StatusCode::CONFLICT);

        let resp = app
            .request(Method::POST, "/api/foods", Some(&token),
                Some(json!({"name": "Vazio", "calories": -1})))
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);

        let resp = app.request(Method::GET, "/api/foods", Some(&token), None).await;
        assert_eq!(resp.json.as_array().unwrap().len(), 1);

        app.finish().await;
    }

    #[tokio::test]
    async fn meals_with_foods() {
        let app = TestApp::new().await;
        let (_, token) = app.user("meals@example.com").await;
        let (_, other) = app.user("meals-other@example.com").await;

        let resp = app
            .request(Method::POST, "/api/foods", Some(&token),
                Some(json!({"name": "Aveia", "calories": 150})))
            .await;
        let oats = resp.json["id"].as_str().unwrap().to_string();

        let body = json!({
            "name": "Café da manhã",
            "date": "2026-03-10",
            "foods": [{"food": oats, "servings": 2}]
        });
        let resp = app
            .request(Method::POST, "/api/meals", Some(&token), Some(body.clone()))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED);
        assert_eq!(resp.json["foods"][0]["servings"], 2.0);
        assert_eq!(resp.json["foods"][0]["food"]["name"], "Aveia");
        let meal = resp.json["id"].as_str().unwrap().to_string();

        let resp = app
            .request(Method::POST, "/api/meals", Some(&token), Some(body))
            .await;
        assert_eq!(resp.status, StatusCode::CONFLICT);

        let resp = app
            .request(Method::POST, "/api/meals", Some(&token), Some(json!({
                "name": "Almoço",
                "foods": [{"food": uuid::Uuid::new_v4()}]
            })))
            .await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.json["detail"], "Food not found.");

        let resp = app
            .request(Method::GET, &format!("/api/meals/{meal}"), Some(&other), None)
            .await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);

        let resp = app
            .request(Method::DELETE, &format!("/api/meals/{meal}"), Some(&token), None)
            .await;
        assert_eq!(resp.status, StatusCode::NO_CONTENT);

        let resp = app.request(Method::GET, "/api/meals", Some(&token), None).await;
        assert_eq!(resp.json, json!([]));

        app.finish().await;
    }
}
