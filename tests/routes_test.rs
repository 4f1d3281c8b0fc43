mod common;

use common::*;
use habit_coach_lib::cli::Commands;
use habit_coach_lib::models::FrequencyUnit;
use habit_coach_lib::routes::{self, MAX_ANALYSIS_DAYS};
use habit_coach_lib::state::AppState;

fn state() -> AppState {
    let store = memory_store(dataset(
        vec![habit(1, USER, "Gym", 4, FrequencyUnit::Week)],
        vec![
            missed(1, date(2026, 10, 13), Some("too busy")),
            missed(1, date(2026, 10, 14), Some("busy at work")),
            done(1, date(2026, 10, 16)),
        ],
        vec![],
    ));
    AppState::new(store, context())
}

#[tokio::test]
async fn test_failure_analysis_window_is_bounded() {
    let state = state();

    for days in [0, -3, MAX_ANALYSIS_DAYS + 1, 100_000_000] {
        let err = routes::get_failure_analysis(&state, USER, days).await.unwrap_err();
        assert!(err.contains("Analysis period"), "{} days should be rejected: {}", days, err);
    }

    let report = routes::get_failure_analysis(&state, USER, MAX_ANALYSIS_DAYS).await.unwrap();
    assert_eq!(report.analysis_period_days, MAX_ANALYSIS_DAYS);
    assert_eq!(report.habits[&1].total_failures, 2);
}

#[tokio::test]
async fn test_metrics_follow_served_commands() {
    let state = state();
    assert_eq!(routes::get_metrics(&state).bundles_generated, 0);

    routes::get_recommendations(&state, USER).await.unwrap();
    routes::get_habit_recommendations(&state, USER, 1).await.unwrap();
    routes::get_failure_analysis(&state, USER, 14).await.unwrap();

    let metrics = routes::get_metrics(&state);
    assert_eq!(metrics.bundles_generated, 2);
    assert_eq!(metrics.failure_analyses, 1);
    assert_eq!(metrics.weekly_generations, 0);
}

#[tokio::test]
async fn test_dispatch_renders_json() {
    let state = state();

    let output = habit_coach_lib::dispatch(&state, Commands::Weekly { user: USER, week: "2026-10-12".into() }, true)
        .await
        .unwrap();
    assert!(!output.contains('\n'), "compact output is a single line");
    let records: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert!(records.is_array());

    let err = habit_coach_lib::dispatch(
        &state,
        Commands::Act {
            user: USER,
            week: "2026-10-12".into(),
            habit: 1,
            recommendation_type: "do_more".into(),
        },
        false,
    )
    .await
    .unwrap_err();
    assert!(err.contains("unknown recommendation type"));

    let err = habit_coach_lib::dispatch(&state, Commands::Failures { user: USER, days: 100_000_000 }, false)
        .await
        .unwrap_err();
    assert!(err.contains("Analysis period"));
}
