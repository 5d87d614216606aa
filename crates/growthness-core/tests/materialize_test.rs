//! Integration tests for plan materialization.

use chrono::NaiveDate;
use serde_json::json;

use growthness_core::plan::{PlanDocument, PlanError, materialize_plan};
use growthness_db::models::ExerciseType;
use growthness_db::queries::{diets, exercises, habits};
use growthness_test_utils::{count_rows, create_test_db, create_user, drop_test_db, sample_plan};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
}

fn plan(value: serde_json::Value) -> PlanDocument {
    PlanDocument::from_value(value).expect("valid plan")
}

#[tokio::test]
async fn sample_plan_writes_every_table() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "all@example.com").await;

    let summary = materialize_plan(&pool, user.id, &sample_plan(), today())
        .await
        .expect("materialize should succeed");

    assert_eq!(summary.habits, 1);
    assert_eq!(summary.routine_exercises, 2);
    assert_eq!(summary.meals, 1);
    assert_eq!(summary.meal_foods, 1);

    let user_habits = habits::list_habits(&pool, user.id).await.unwrap();
    assert_eq!(user_habits.len(), 1);
    assert_eq!(user_habits[0].name, "Beber água");
    assert_eq!(user_habits[0].frequencies, vec!["daily".to_string()]);

    let routines = exercises::list_routines(&pool, user.id).await.unwrap();
    assert_eq!(routines.len(), 1);
    assert_eq!(routines[0].week_start_date, today());

    let entries = exercises::list_routine_exercises(&pool, user.id, None)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    let run = entries
        .iter()
        .find(|e| e.exercise_name == "Corrida")
        .unwrap();
    assert_eq!(run.exercise_type, ExerciseType::Cardio);
    assert_eq!(run.routine_exercise.duration, Some(30));
    let squat = entries
        .iter()
        .find(|e| e.exercise_name == "Agachamento com barra")
        .unwrap();
    assert_eq!(squat.exercise_type, ExerciseType::Gym);
    assert_eq!(squat.routine_exercise.weight_goal, Some(20));
    assert_eq!(squat.routine_exercise.reps_goal, Some(15));

    let meals = diets::list_meals(&pool, user.id).await.unwrap();
    assert_eq!(meals.len(), 1);
    assert_eq!(meals[0].date, today());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn day_labels_are_translated() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "days@example.com").await;

    let doc = plan(json!({
        "exercises": [
            {"day": "Segunda-feira", "routine": [{"exercise": "Remada", "weight": 30, "reps": 12}]},
            {"day": "Funday", "routine": [{"exercise": "Prancha"}]}
        ]
    }));
    materialize_plan(&pool, user.id, &doc, today()).await.unwrap();

    let entries = exercises::list_routine_exercises(&pool, user.id, None)
        .await
        .unwrap();
    let day_of = |name: &str| {
        entries
            .iter()
            .find(|e| e.exercise_name == name)
            .and_then(|e| e.routine_exercise.day_of_week.clone())
            .unwrap()
    };
    assert_eq!(day_of("Remada"), "monday");
    assert_eq!(day_of("Prancha"), "Funday");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn explicit_week_start_is_used() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "week@example.com").await;

    let week = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    let doc = plan(json!({
        "exercises": [
            {"day": "Terça-feira", "week_start_date": "2026-06-01",
             "routine": [{"exercise": "Flexão"}]},
            {"day": "Quarta-feira", "week_start_date": "2026-06-01",
             "routine": [{"exercise": "Barra fixa"}]}
        ]
    }));
    materialize_plan(&pool, user.id, &doc, today()).await.unwrap();

    let routines = exercises::list_routines(&pool, user.id).await.unwrap();
    assert_eq!(routines.len(), 1, "both days share the week's routine");
    assert_eq!(routines[0].week_start_date, week);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn shared_foods_are_deduplicated() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "banana@example.com").await;

    let doc = plan(json!({
        "diet": [
            {"meal": "Café da manhã", "foods": [{"name": "Banana", "calories": 89}]},
            {"meal": "Lanche", "foods": [{"name": "Banana", "calories": 105, "servings": 2}]}
        ]
    }));
    let summary = materialize_plan(&pool, user.id, &doc, today()).await.unwrap();
    assert_eq!(summary.meal_foods, 2);

    assert_eq!(count_rows(&pool, "foods").await, 1);
    assert_eq!(count_rows(&pool, "meal_foods").await, 2);

    let foods = diets::list_foods(&pool).await.unwrap();
    assert_eq!(foods[0].calories, 89, "first definition wins");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn exercises_are_shared_across_users() {
    let (pool, db_name) = create_test_db().await;
    let a = create_user(&pool, "a@example.com").await;
    let b = create_user(&pool, "b@example.com").await;

    materialize_plan(&pool, a.id, &sample_plan(), today())
        .await
        .unwrap();
    materialize_plan(&pool, b.id, &sample_plan(), today())
        .await
        .unwrap();

    assert_eq!(count_rows(&pool, "exercises").await, 2);
    assert_eq!(count_rows(&pool, "foods").await, 1);
    assert_eq!(count_rows(&pool, "routines").await, 2);
    assert_eq!(count_rows(&pool, "habits").await, 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn unknown_frequency_rolls_back_everything() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "freq@example.com").await;

    let doc = plan(json!({
        "habits": [
            {"name": "Dormir bem", "goal": 8, "frequency": "daily"},
            {"name": "Meditar", "goal": 10, "frequency": "hourly"}
        ],
        "diet": [{"meal": "Jantar", "foods": [{"name": "Arroz"}]}]
    }));

    let err = materialize_plan(&pool, user.id, &doc, today())
        .await
        .unwrap_err();
    match err {
        PlanError::InvalidFrequency(freq) => assert_eq!(freq, "hourly"),
        other => panic!("expected InvalidFrequency, got {other:?}"),
    }

    assert_eq!(count_rows(&pool, "habits").await, 0);
    assert_eq!(count_rows(&pool, "meals").await, 0);
    assert_eq!(count_rows(&pool, "foods").await, 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn frequency_list_must_fully_resolve() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "freq-list@example.com").await;

    let ok = plan(json!({
        "habits": [{"name": "Correr", "goal": 3, "frequency": ["weekly", "daily", "weekly"]}]
    }));
    materialize_plan(&pool, user.id, &ok, today()).await.unwrap();
    let created = habits::list_habits(&pool, user.id).await.unwrap();
    assert_eq!(
        created[0].frequencies,
        vec!["daily".to_string(), "weekly".to_string()]
    );

    let partial = plan(json!({
        "habits": [{"name": "Ler", "goal": 20, "frequency": ["daily", "yearly"]}]
    }));
    let err = materialize_plan(&pool, user.id, &partial, today())
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidFrequency(_)));

    let empty = plan(json!({"habits": [{"name": "Nada", "goal": 1, "frequency": []}]}));
    let err = materialize_plan(&pool, user.id, &empty, today())
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidFrequency(_)));

    assert_eq!(count_rows(&pool, "habits").await, 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn habit_logs_are_created() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "hlogs@example.com").await;

    let doc = plan(json!({
        "habits": [{"name": "Caminhar", "goal": 8000, "logs": [
            {"date": "2026-05-01", "amount": 7500},
            {"date": "2026-05-02", "amount": 9100}
        ]}]
    }));
    let summary = materialize_plan(&pool, user.id, &doc, today()).await.unwrap();
    assert_eq!(summary.habit_logs, 2);

    let created = habits::list_habits(&pool, user.id).await.unwrap();
    assert_eq!(created[0].measure.as_deref(), Some("steps"));
    let logs = habits::list_habit_logs(&pool, user.id, None).await.unwrap();
    assert_eq!(logs.len(), 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn repeat_run_reuses_meals_without_counting_them() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "repeat@example.com").await;

    let first = materialize_plan(&pool, user.id, &sample_plan(), today())
        .await
        .unwrap();
    let second = materialize_plan(&pool, user.id, &sample_plan(), today())
        .await
        .unwrap();

    assert_eq!(first.meals, 1);
    assert_eq!(second.meals, 0);
    assert_eq!(second.meal_foods, 1);
    assert_eq!(count_rows(&pool, "meals").await, 1);
    assert_eq!(count_rows(&pool, "meal_foods").await, 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn out_of_range_target_rolls_back() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "huge@example.com").await;

    let doc = plan(json!({
        "habits": [{"name": "Caminhar", "goal": 5000, "frequency": "daily"}],
        "exercises": [{"day": "Quarta-feira", "routine": [
            {"exercise": "Remada", "weight": 30, "reps": 1e12}
        ]}]
    }));
    let err = materialize_plan(&pool, user.id, &doc, today())
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::DataFormat(ref msg) if msg.contains("reps")), "{err}");

    assert_eq!(count_rows(&pool, "habits").await, 0);
    assert_eq!(count_rows(&pool, "routine_exercises").await, 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}
