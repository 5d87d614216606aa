use sqlx::PgPool;

use growthness_core::password::hash_password;
use growthness_core::plan::PlanDocument;
use growthness_db::models::User;
use growthness_db::queries::users::{self, NewUser};

/// Insert a user without a password.
pub async fn create_user(pool: &PgPool, email: &str) -> User {
    users::insert_user(
        pool,
        &NewUser {
            email,
            password_hash: None,
            first_name: "Test",
            last_name: "User",
        },
    )
    .await
    .expect("insert test user")
}

/// Insert a user whose password is `password`.
pub async fn create_user_with_password(pool: &PgPool, email: &str, password: &str) -> User {
    let hash = hash_password(password).expect("hash test password");
    users::insert_user(
        pool,
        &NewUser {
            email,
            password_hash: Some(&hash),
            first_name: "",
            last_name: "",
        },
    )
    .await
    .expect("insert test user")
}

/// A small plan touching every table the materializer writes.
pub fn sample_plan() -> PlanDocument {
    let value = serde_json::json!({
        "habits": [
            {"name": "Beber água", "goal": 2, "measure": "litros", "frequency": "daily"}
        ],
        "exercises": [
            {"day": "Segunda-feira", "routine": [
                {"exercise": "Agachamento com barra", "weight": 20, "reps": 15},
                {"exercise": "Corrida", "exercise_type": "cardio", "duration": 30, "pace": 6.0}
            ]}
        ],
        "diet": [
            {"meal": "Café da manhã", "foods": [
                {"name": "Banana", "calories": 89, "protein": 1.1, "carbs": 23, "fat": 0.3}
            ]}
        ]
    });
    PlanDocument::from_value(value).expect("sample plan is valid")
}
