use std::sync::Arc;
use chrono::Utc;
use serde::Serialize;
use crate::analytics::failures::repeated_from_summary;
use crate::analytics::{DayCount, FailureAnalyzer, FailurePatternSummary, RepeatedFailure};
use crate::config::Thresholds;
use crate::error::CoachError;
use crate::models::{
    Habit, RecommendationKey, RecommendationType, WeekStat, WeekStart, WeeklyRecommendationRecord,
};
use crate::state::context::EngineContext;
use crate::store::CoachStore;

pub const DEFAULT_PENDING_LIMIT: usize = 10;

/// What one habit did during one week.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekEvidence {
    /// Completion percentage, None when the habit has no entries in the week
    pub completion: Option<f64>,
    /// Repeated failure categories, most frequent first
    pub repeated: Vec<RepeatedFailure>,
    /// Failure-day histogram, worst day first
    pub failure_days: Vec<DayCount>,
}

impl WeekEvidence {
    pub fn from_summary(summary: &FailurePatternSummary, t: &Thresholds) -> Self {
        let completion = (summary.total_days_tracked > 0).then(|| {
            let completed = summary.total_days_tracked - summary.total_failures;
            completed as f64 / summary.total_days_tracked as f64 * 100.0
        });
        WeekEvidence {
            completion,
            repeated: repeated_from_summary(summary, t.weekly_repeated_failure_min),
            failure_days: summary.common_failure_days.clone(),
        }
    }
}

/// Records the five weekly rules produce for one habit, in rule order.
///
/// A habit with no entries in the week has no completion value, so the
/// scope, stretch and consistency rules stay silent for it instead of
/// treating the week as 0% complete.
pub fn weekly_records(
    habit: &Habit,
    week: WeekStart,
    evidence: &WeekEvidence,
    t: &Thresholds,
) -> Vec<WeeklyRecommendationRecord> {
    let record = |ty: RecommendationType, suggestion: String, details: String| {
        WeeklyRecommendationRecord::new(habit.user_id, habit.id, week, ty, suggestion, details)
    };
    let name = &habit.name;
    let mut records = Vec::new();

    if let Some(completion) = evidence.completion {
        if completion < t.weekly_low_completion {
            records.push(record(
                RecommendationType::ReduceScope,
                format!("Consider reducing the scope of '{}'", name),
                format!(
                    "This week you completed '{}' only {:.0}% of the time. This suggests the habit \
                     might be too ambitious. Try reducing the frequency or difficulty, and rebuild from there.",
                    name, completion
                ),
            ));
        }
    }

    if let Some(top) = evidence.repeated.first() {
        records.push(record(
            RecommendationType::RedesignHabit,
            format!("Redesign '{}' to address '{}'", name, top.pattern),
            format!(
                "This week, '{}' failed {} times due to '{}'. Next week, try a different approach \
                 that accounts for this barrier.",
                name, top.occurrences, top.pattern
            ),
        ));
    }

    if let Some(completion) = evidence.completion {
        if completion >= t.weekly_stretch_completion {
            records.push(record(
                RecommendationType::AddStretch,
                format!("Add a stretch goal to '{}'", name),
                format!(
                    "Great job! You completed '{}' {:.0}% of the time. Next week, challenge yourself \
                     by increasing the frequency or difficulty. This will help you continue growing.",
                    name, completion
                ),
            ));
        } else if completion >= t.weekly_consistency_completion {
            records.push(record(
                RecommendationType::ConsistencyImprovement,
                format!("Build consistency with '{}'", name),
                format!(
                    "You're doing well with '{}' at {:.0}% completion. Next week, focus on the {:.0}% \
                     you missed and aim for 90%+.",
                    name,
                    completion,
                    100.0 - completion
                ),
            ));
        }
    }

    if let Some(worst) = evidence.failure_days.first() {
        records.push(record(
            RecommendationType::ScheduleAdjustment,
            format!("Adjust '{}' schedule on {}s", name, worst.day),
            format!(
                "You missed '{}' most often on {}s ({} times). Try scheduling it at a different time \
                 on that day, or prepare in advance.",
                name, worst.day, worst.count
            ),
        ));
    }

    records
}

/// One week at a glance: its stat row and what was recommended for it.
#[derive(Serialize, Debug, Clone)]
pub struct WeekOverview {
    pub user_id: i64,
    pub week_start_date: WeekStart,
    pub week_stat: Option<WeekStat>,
    pub recommendations: Vec<WeeklyRecommendationRecord>,
    pub has_recommendations: bool,
}

/// Derives and persists the recommendations for a completed week.
#[derive(Clone)]
pub struct WeeklyRecommendationGenerator {
    store: Arc<dyn CoachStore>,
    analyzer: FailureAnalyzer,
    context: EngineContext,
}

impl WeeklyRecommendationGenerator {
    pub fn new(store: Arc<dyn CoachStore>, context: EngineContext) -> Self {
        let analyzer = FailureAnalyzer::new(store.clone(), context.clone());
        WeeklyRecommendationGenerator { store, analyzer, context }
    }

    /// Regenerate the week identified by `week_start_date` (YYYY-MM-DD, a
    /// Monday). Replaces every earlier record of that week.
    pub async fn generate_weekly_recommendations(
        &self,
        user_id: i64,
        week_start_date: &str,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        let week: WeekStart = week_start_date.parse()?;
        self.generate_for_week(user_id, week).await
    }

    pub async fn generate_for_week(
        &self,
        user_id: i64,
        week: WeekStart,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        let result = self.derive_and_replace(user_id, week).await;
        match &result {
            Ok(records) => {
                self.context.metrics.record_weekly_generation(records.len());
                tracing::info!(
                    user_id = user_id,
                    week = %week,
                    records = records.len(),
                    "Weekly recommendations generated"
                );
            }
            Err(e) => {
                self.context.metrics.record_weekly_failure();
                tracing::error!(
                    user_id = user_id,
                    week = %week,
                    error = %e,
                    "Weekly recommendation generation failed"
                );
            }
        }
        result
    }

    async fn derive_and_replace(
        &self,
        user_id: i64,
        week: WeekStart,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        let t = &self.context.thresholds;
        let habits = self.store.active_habits_for(user_id).await?;

        let mut records = Vec::new();
        for habit in &habits {
            let summary = self.analyzer.patterns_in_range(habit.id, user_id, week.range()).await?;
            let evidence = WeekEvidence::from_summary(&summary, t);
            let produced = weekly_records(habit, week, &evidence, t);
            tracing::debug!(
                habit_id = habit.id,
                week = %week,
                completion = ?evidence.completion,
                produced = produced.len(),
                "Weekly rules evaluated"
            );
            records.extend(produced);
        }

        self.store.replace_week(user_id, week, records).await
    }

    /// Records not yet acted upon, newest week first
    pub async fn pending_recommendations(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        self.store.pending_recommendations(user_id, limit).await
    }

    pub async fn mark_acted_upon(&self, key: RecommendationKey) -> Result<WeeklyRecommendationRecord, CoachError> {
        let record = self.store.mark_acted_upon(key, Utc::now()).await?;
        tracing::info!(
            user_id = key.user_id,
            habit_id = key.habit_id,
            week = %key.week_start_date,
            recommendation_type = %key.recommendation_type,
            "Recommendation marked as acted upon"
        );
        Ok(record)
    }

    pub async fn recommendations_by_week(
        &self,
        user_id: i64,
        week_start_date: &str,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        let week: WeekStart = week_start_date.parse()?;
        self.store.recommendations_for_week(user_id, week).await
    }

    pub async fn week_overview(&self, user_id: i64, week_start_date: &str) -> Result<WeekOverview, CoachError> {
        let week: WeekStart = week_start_date.parse()?;
        let week_stat = self.store.week_stat(user_id, week).await?;
        let recommendations = self.store.recommendations_for_week(user_id, week).await?;
        Ok(WeekOverview {
            user_id,
            week_start_date: week,
            week_stat,
            has_recommendations: !recommendations.is_empty(),
            recommendations,
        })
    }
}
