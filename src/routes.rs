use crate::analytics::FailureAnalysisReport;
use crate::brain::WeekOverview;
use crate::metrics::MetricsSnapshot;
use crate::models::{RecommendationBundle, RecommendationKey, RecommendationType, WeekStart, WeeklyRecommendationRecord};
use crate::state::app::AppState;

/// Longest failure analysis window the command surface accepts
pub const MAX_ANALYSIS_DAYS: i64 = 3650;

/// Full recommendation bundle for a user
pub async fn get_recommendations(state: &AppState, user_id: i64) -> Result<RecommendationBundle, String> {
    state
        .engine()
        .generate_recommendations(user_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_habit_recommendations(
    state: &AppState,
    user_id: i64,
    habit_id: i64,
) -> Result<RecommendationBundle, String> {
    state
        .engine()
        .habit_recommendation_bundle(habit_id, user_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_failure_analysis(
    state: &AppState,
    user_id: i64,
    days: i64,
) -> Result<FailureAnalysisReport, String> {
    if days <= 0 || days > MAX_ANALYSIS_DAYS {
        return Err(format!(
            "Analysis period must be between 1 and {} days, got {}",
            MAX_ANALYSIS_DAYS, days
        ));
    }
    state
        .analyzer()
        .failure_analysis(user_id, days)
        .await
        .map_err(|e| e.to_string())
}

/// Regenerate a week's recommendations, replacing any earlier set
pub async fn generate_weekly_recommendations(
    state: &AppState,
    user_id: i64,
    week_start_date: &str,
) -> Result<Vec<WeeklyRecommendationRecord>, String> {
    state
        .weekly()
        .generate_weekly_recommendations(user_id, week_start_date)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_week_overview(
    state: &AppState,
    user_id: i64,
    week_start_date: &str,
) -> Result<WeekOverview, String> {
    state
        .weekly()
        .week_overview(user_id, week_start_date)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_pending_recommendations(
    state: &AppState,
    user_id: i64,
    limit: usize,
) -> Result<Vec<WeeklyRecommendationRecord>, String> {
    state
        .weekly()
        .pending_recommendations(user_id, limit)
        .await
        .map_err(|e| e.to_string())
}

pub async fn mark_recommendation_acted_upon(
    state: &AppState,
    user_id: i64,
    week_start_date: &str,
    habit_id: i64,
    recommendation_type: &str,
) -> Result<WeeklyRecommendationRecord, String> {
    let week = week_start_date.parse::<WeekStart>().map_err(|e| e.to_string())?;
    let recommendation_type = recommendation_type.parse::<RecommendationType>()?;
    let key = RecommendationKey {
        user_id,
        week_start_date: week,
        habit_id,
        recommendation_type,
    };
    state
        .weekly()
        .mark_acted_upon(key)
        .await
        .map_err(|e| e.to_string())
}

pub fn get_metrics(state: &AppState) -> MetricsSnapshot {
    state.metrics_snapshot()
}
