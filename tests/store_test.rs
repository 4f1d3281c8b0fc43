mod common;

use std::sync::Arc;
use chrono::Utc;
use common::*;
use habit_coach_lib::error::ErrorKind;
use habit_coach_lib::models::week::DateRange;
use habit_coach_lib::models::{FrequencyUnit, RecommendationType, WeeklyRecommendationRecord};
use habit_coach_lib::store::{HabitSource, JsonStore, LogSource, RecommendationStore, WeekKey, WeekStatSource};

fn record(habit_id: i64, week_start: &str, ty: RecommendationType, text: &str) -> WeeklyRecommendationRecord {
    WeeklyRecommendationRecord::new(USER, habit_id, week(week_start), ty, text.into(), text.into())
}

fn two_habits() -> habit_coach_lib::store::Dataset {
    dataset(
        vec![
            habit(2, USER, "Read", 1, FrequencyUnit::Day),
            habit(1, USER, "Run", 3, FrequencyUnit::Week),
            inactive(habit(3, USER, "Old", 1, FrequencyUnit::Day)),
            habit(4, OTHER_USER, "Theirs", 1, FrequencyUnit::Day),
        ],
        vec![
            done(1, date(2026, 10, 14)),
            missed(1, date(2026, 10, 12), None),
            done(2, date(2026, 10, 13)),
        ],
        vec![
            week_stat(date(2026, 9, 28), 60.0),
            week_stat(date(2026, 10, 12), 80.0),
            week_stat(date(2026, 10, 5), 70.0),
        ],
    )
}

#[tokio::test]
async fn test_sources_filter_and_order() {
    let store = JsonStore::in_memory(two_habits());

    let active: Vec<i64> = store.active_habits_for(USER).await.unwrap().iter().map(|h| h.id).collect();
    assert_eq!(active, vec![1, 2]);
    let all: Vec<i64> = store.habits_for(USER).await.unwrap().iter().map(|h| h.id).collect();
    assert_eq!(all, vec![1, 2, 3]);

    let logs = store
        .logs_for_habit(1, USER, DateRange::since(date(2026, 10, 1)))
        .await
        .unwrap();
    assert_eq!(logs[0].date, date(2026, 10, 12), "logs come back in date order");
    assert!(store
        .logs_for_habit(1, OTHER_USER, DateRange::since(date(2026, 10, 1)))
        .await
        .unwrap()
        .is_empty());

    let stats = store
        .week_stats_for(USER, DateRange::since(date(2026, 10, 1)))
        .await
        .unwrap();
    let weeks: Vec<_> = stats.iter().map(|s| s.week_start_date).collect();
    assert_eq!(weeks, vec![date(2026, 10, 12), date(2026, 10, 5)], "newest first");
}

#[tokio::test]
async fn test_missing_file_opens_empty_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("habits.json");

    let store = JsonStore::open(&path).await.unwrap();
    assert!(store.snapshot().habits.is_empty());
    assert!(!path.exists(), "opening never writes");

    let store = JsonStore::new(two_habits(), Some(path.clone()));
    store
        .replace_week(
            USER,
            week("2026-10-12"),
            vec![record(1, "2026-10-12", RecommendationType::ReduceScope, "smaller")],
        )
        .await
        .unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists(), "temp file is renamed away");

    let reopened = JsonStore::open(&path).await.unwrap();
    let records = reopened.snapshot().weekly_recommendations;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].week_start_date.to_string(), "2026-10-12");
    assert_eq!(reopened.snapshot().habits.len(), 4);
}

#[tokio::test]
async fn test_corrupt_file_is_an_upstream_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habits.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = JsonStore::open(&path).await.err().unwrap();
    assert_eq!(err.kind, ErrorKind::Upstream);
}

#[tokio::test]
async fn test_dropped_transaction_changes_nothing() {
    let mut data = two_habits();
    data.weekly_recommendations = vec![record(1, "2026-10-12", RecommendationType::ReduceScope, "old")];
    let store = JsonStore::in_memory(data);

    {
        let mut tx = store.begin(WeekKey::new(USER, week("2026-10-12"))).await;
        assert_eq!(tx.delete_week(), 1);
        tx.insert_all(vec![record(2, "2026-10-12", RecommendationType::AddStretch, "new")])
            .unwrap();
    }

    let tx = store.begin(WeekKey::new(USER, week("2026-10-12"))).await;
    tx.rollback();

    let records = store.snapshot().weekly_recommendations;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].suggestion, "old");
}

#[tokio::test]
async fn test_insert_rejects_invalid_records() {
    let store = JsonStore::in_memory(two_habits());
    let key = WeekKey::new(USER, week("2026-10-12"));

    let mut tx = store.begin(key).await;
    tx.delete_week();
    let duplicate = vec![
        record(1, "2026-10-12", RecommendationType::ReduceScope, "a"),
        record(1, "2026-10-12", RecommendationType::ReduceScope, "b"),
    ];
    assert_eq!(tx.insert_all(duplicate).unwrap_err().kind, ErrorKind::Persistence);

    let wrong_week = vec![record(1, "2026-10-05", RecommendationType::ReduceScope, "a")];
    assert!(tx.insert_all(wrong_week).is_err());

    let foreign_habit = vec![record(4, "2026-10-12", RecommendationType::ReduceScope, "a")];
    assert!(tx.insert_all(foreign_habit).is_err(), "habit 4 belongs to another user");

    let mut long_details = record(1, "2026-10-12", RecommendationType::ReduceScope, "a");
    long_details.details = Some("x".repeat(1001));
    assert!(tx.insert_all(vec![long_details]).is_err());

    let ok = vec![record(1, "2026-10-12", RecommendationType::ReduceScope, "a")];
    assert_eq!(tx.insert_all(ok).unwrap(), 1);
    let committed = tx.commit().await.unwrap();
    assert_eq!(committed.len(), 1);
    assert_eq!(store.snapshot().weekly_recommendations.len(), 1);
}

#[tokio::test]
async fn test_open_transaction_blocks_same_week_only() {
    let store = Arc::new(JsonStore::in_memory(two_habits()));
    let key = WeekKey::new(USER, week("2026-10-12"));

    let tx = store.begin(key).await;

    // A different week is independent
    let other = store.begin(WeekKey::new(USER, week("2026-10-05"))).await;
    other.rollback();

    let contender = store.clone();
    let handle = tokio::spawn(async move {
        let mut tx = contender.begin(key).await;
        tx.delete_week();
        tx.insert_all(vec![record(2, "2026-10-12", RecommendationType::AddStretch, "second")])
            .unwrap();
        tx.commit().await.unwrap();
    });

    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert!(!handle.is_finished(), "second transaction waits for the first");

    drop(tx);
    handle.await.unwrap();
    assert_eq!(store.snapshot().weekly_recommendations[0].suggestion, "second");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_replacements_never_interleave() {
    let store = Arc::new(JsonStore::in_memory(two_habits()));

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let text = format!("run {}", i);
            store
                .replace_week(
                    USER,
                    week("2026-10-12"),
                    vec![
                        record(1, "2026-10-12", RecommendationType::ReduceScope, &text),
                        record(2, "2026-10-12", RecommendationType::AddStretch, &text),
                    ],
                )
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let records = store.snapshot().weekly_recommendations;
    assert_eq!(records.len(), 2, "each replacement removes the previous set");
    assert_eq!(records[0].suggestion, records[1].suggestion, "sets are never mixed");
}

#[tokio::test]
async fn test_mark_acted_upon_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habits.json");
    let mut data = two_habits();
    data.weekly_recommendations = vec![record(1, "2026-10-12", RecommendationType::ScheduleAdjustment, "move it")];
    let store = JsonStore::new(data, Some(path.clone()));

    let key = store.snapshot().weekly_recommendations[0].key();
    let at = Utc::now();
    store.mark_acted_upon(key, at).await.unwrap();

    let reopened = JsonStore::open(&path).await.unwrap();
    let record = &reopened.snapshot().weekly_recommendations[0];
    assert!(record.is_acted_upon);
    assert_eq!(record.acted_upon_date, Some(at));
    assert!(reopened.pending_recommendations(USER, 10).await.unwrap().is_empty());
}
