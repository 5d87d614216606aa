//! Integration tests for habit, frequency and habit log queries.

use chrono::NaiveDate;
use uuid::Uuid;

use growthness_db::queries::habits::{self, NewHabit};
use growthness_test_utils::{create_test_db, create_user, drop_test_db};

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn water() -> NewHabit<'static> {
    NewHabit {
        name: "Beber água",
        goal: 2.0,
        measure: Some("litros"),
    }
}

#[tokio::test]
async fn resolve_frequencies_returns_known_names_only() {
    let (pool, db_name) = create_test_db().await;

    let resolved = habits::resolve_frequencies(&pool, &names(&["weekly", "hourly", "daily"]))
        .await
        .unwrap();
    assert_eq!(resolved, names(&["daily", "weekly"]));

    let none = habits::resolve_frequencies(&pool, &names(&["Daily"]))
        .await
        .unwrap();
    assert!(none.is_empty(), "lookup is case sensitive");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn create_habit_attaches_frequencies() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "habits@example.com").await;

    let habit = habits::create_habit(&pool, user.id, &water(), &names(&["weekly", "daily"]))
        .await
        .expect("create_habit should succeed");
    assert_eq!(habit.name, "Beber água");
    assert_eq!(habit.frequencies, names(&["daily", "weekly"]));

    let fetched = habits::get_habit(&pool, user.id, habit.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.frequencies, names(&["daily", "weekly"]));
    assert_eq!(fetched.measure.as_deref(), Some("litros"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn create_habit_with_unknown_frequency_leaves_nothing() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "bad-freq@example.com").await;

    let result = habits::create_habit(&pool, user.id, &water(), &names(&["hourly"])).await;
    assert!(result.is_err());

    let all = habits::list_habits(&pool, user.id).await.unwrap();
    assert!(all.is_empty(), "habit insert must roll back");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn habits_are_scoped_to_their_owner() {
    let (pool, db_name) = create_test_db().await;
    let owner = create_user(&pool, "owner@example.com").await;
    let other = create_user(&pool, "other@example.com").await;

    let habit = habits::create_habit(&pool, owner.id, &water(), &names(&["daily"]))
        .await
        .unwrap();

    assert_eq!(habits::list_habits(&pool, owner.id).await.unwrap().len(), 1);
    assert!(habits::list_habits(&pool, other.id).await.unwrap().is_empty());
    assert!(
        habits::get_habit(&pool, other.id, habit.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(!habits::delete_habit(&pool, other.id, habit.id).await.unwrap());
    assert!(habits::delete_habit(&pool, owner.id, habit.id).await.unwrap());
    assert!(habits::list_habits(&pool, owner.id).await.unwrap().is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_habit_replaces_fields_and_frequencies() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "update@example.com").await;

    let habit = habits::create_habit(&pool, user.id, &water(), &names(&["daily"]))
        .await
        .unwrap();

    let changed = NewHabit {
        name: "Dormir bem",
        goal: 8.0,
        measure: Some("horas"),
    };

    // Fields only: frequencies stay.
    let updated = habits::update_habit(&pool, user.id, habit.id, &changed, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Dormir bem");
    assert_eq!(updated.goal, 8.0);
    assert_eq!(updated.frequencies, names(&["daily"]));

    let freqs = names(&["monthly"]);
    let updated = habits::update_habit(&pool, user.id, habit.id, &changed, Some(freqs.as_slice()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.frequencies, names(&["monthly"]));

    let missing = habits::update_habit(&pool, user.id, Uuid::new_v4(), &changed, None)
        .await
        .unwrap();
    assert!(missing.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn habit_logs_list_filter_and_delete() {
    let (pool, db_name) = create_test_db().await;
    let user = create_user(&pool, "logs@example.com").await;
    let other = create_user(&pool, "logs-other@example.com").await;

    let a = habits::create_habit(&pool, user.id, &water(), &names(&["daily"]))
        .await
        .unwrap();
    let b = habits::create_habit(
        &pool,
        user.id,
        &NewHabit {
            name: "Caminhar",
            goal: 10_000.0,
            measure: None,
        },
        &names(&["daily"]),
    )
    .await
    .unwrap();

    let d1 = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
    habits::insert_habit_log(&pool, a.id, d1, 1.5).await.unwrap();
    let latest = habits::insert_habit_log(&pool, a.id, d2, 2.0).await.unwrap();
    habits::insert_habit_log(&pool, b.id, d1, 8000.0).await.unwrap();

    let all = habits::list_habit_logs(&pool, user.id, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].date, d2, "newest first");

    let only_a = habits::list_habit_logs(&pool, user.id, Some(a.id))
        .await
        .unwrap();
    assert_eq!(only_a.len(), 2);
    assert!(only_a.iter().all(|l| l.habit_id == a.id));

    assert!(
        habits::list_habit_logs(&pool, other.id, None)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        habits::get_habit_log(&pool, other.id, latest.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(!habits::delete_habit_log(&pool, other.id, latest.id).await.unwrap());
    assert!(habits::delete_habit_log(&pool, user.id, latest.id).await.unwrap());

    // Deleting a habit removes its logs.
    habits::delete_habit(&pool, user.id, a.id).await.unwrap();
    let remaining = habits::list_habit_logs(&pool, user.id, None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].habit_id, b.id);

    pool.close().await;
    drop_test_db(&db_name).await;
}
