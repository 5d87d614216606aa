//! Integration tests for the cache-or-generate plan service.

use serde_json::json;

use growthness_core::llm::GenerateError;
use growthness_core::plan::{PlanDocument, PlanError, PlanSource, generate_plan_for_user};
use growthness_db::queries::{habits, plan_cache};
use growthness_test_utils::{
    StubGenerator, count_rows, create_test_db, create_user, drop_test_db, sample_plan,
};

fn water_only() -> PlanDocument {
    PlanDocument::from_value(json!({
        "habits": [{"name": "Beber água", "goal": 2, "measure": "litros"}]
    }))
    .unwrap()
}

#[tokio::test]
async fn unseen_goal_generates_once_and_caches() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "miss@example.com").await;
    let generator = StubGenerator::returning(water_only());

    let request = json!({"goal": "lose weight", "available_days": ["Segunda-feira"]});
    let outcome = generate_plan_for_user(&pool, &generator, user.id, &request)
        .await
        .expect("plan flow should succeed");

    assert_eq!(outcome.source, PlanSource::Generated);
    assert_eq!(outcome.summary.habits, 1);
    assert_eq!(generator.calls(), 1);
    assert_eq!(generator.last_request(), Some(request.clone()));
    assert_eq!(plan_cache::count(&pool).await.unwrap(), 1);

    let created = habits::list_habits(&pool, user.id).await.unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "Beber água");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn cached_goal_skips_the_generator() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "hit@example.com").await;

    let cached = serde_json::to_value(sample_plan()).unwrap();
    plan_cache::store(&pool, "gain muscle", &cached).await.unwrap();

    let generator = StubGenerator::returning(water_only());
    let outcome = generate_plan_for_user(&pool, &generator, user.id, &json!({"goal": "gain muscle"}))
        .await
        .unwrap();

    assert_eq!(outcome.source, PlanSource::Cache);
    assert_eq!(generator.calls(), 0);
    assert_eq!(outcome.summary.routine_exercises, 2);
    assert_eq!(plan_cache::count(&pool).await.unwrap(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn repeated_requests_rematerialize_the_cached_plan() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "repeat@example.com").await;
    let generator = StubGenerator::returning(water_only());
    let request = json!({"goal": "lose weight"});

    let first = generate_plan_for_user(&pool, &generator, user.id, &request)
        .await
        .unwrap();
    let second = generate_plan_for_user(&pool, &generator, user.id, &request)
        .await
        .unwrap();

    assert_eq!(first.source, PlanSource::Generated);
    assert_eq!(second.source, PlanSource::Cache);
    assert_eq!(generator.calls(), 1);
    assert_eq!(count_rows(&pool, "habits").await, 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn goal_keys_are_literal() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "literal@example.com").await;
    let generator = StubGenerator::returning(water_only());

    for goal in ["lose weight", "Lose weight", "lose weight "] {
        generate_plan_for_user(&pool, &generator, user.id, &json!({ "goal": goal }))
            .await
            .unwrap();
    }

    assert_eq!(generator.calls(), 3);
    assert_eq!(plan_cache::count(&pool).await.unwrap(), 3);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn missing_goal_touches_nothing() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "nogoal@example.com").await;
    let generator = StubGenerator::returning(water_only());

    for request in [json!({}), json!({"goal": ""}), json!({"goal": null})] {
        let err = generate_plan_for_user(&pool, &generator, user.id, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::MissingGoal));
    }

    assert_eq!(generator.calls(), 0);
    assert_eq!(plan_cache::count(&pool).await.unwrap(), 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn generation_failure_caches_nothing() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "genfail@example.com").await;

    let generator = StubGenerator::failing(|| GenerateError::Status {
        status: 503,
        body: "overloaded".into(),
    });
    let err = generate_plan_for_user(&pool, &generator, user.id, &json!({"goal": "x"}))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::Generation(_)));

    let generator = StubGenerator::failing(|| GenerateError::DataFormat("not json".into()));
    let err = generate_plan_for_user(&pool, &generator, user.id, &json!({"goal": "x"}))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::DataFormat(_)));

    assert_eq!(plan_cache::count(&pool).await.unwrap(), 0);
    assert_eq!(count_rows(&pool, "habits").await, 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn materialization_failure_keeps_the_cache_row() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "keep@example.com").await;

    let bad = PlanDocument::from_value(json!({
        "habits": [{"name": "Meditar", "goal": 10, "frequency": "hourly"}]
    }))
    .unwrap();
    let generator = StubGenerator::returning(bad);

    let err = generate_plan_for_user(&pool, &generator, user.id, &json!({"goal": "calm"}))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidFrequency(_)));

    assert_eq!(plan_cache::count(&pool).await.unwrap(), 1);
    assert_eq!(count_rows(&pool, "habits").await, 0);

    // The next request reuses the (still failing) cached plan.
    let err = generate_plan_for_user(&pool, &generator, user.id, &json!({"goal": "calm"}))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidFrequency(_)));
    assert_eq!(generator.calls(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn malformed_cache_entry_is_a_data_format_error() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "corrupt@example.com").await;

    plan_cache::store(&pool, "broken", &json!({"habits": "nope"}))
        .await
        .unwrap();

    let generator = StubGenerator::returning(water_only());
    let err = generate_plan_for_user(&pool, &generator, user.id, &json!({"goal": "broken"}))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::DataFormat(_)));
    assert_eq!(generator.calls(), 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}
