use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::NaiveDate;
use serde::Serialize;
use crate::analytics::patterns::{extract_patterns, FailureCategory, PatternCounts};
use crate::error::CoachError;
use crate::models::log::round2;
use crate::models::week::DateRange;
use crate::models::{FailurePattern, HabitLogEntry};
use crate::state::context::EngineContext;
use crate::store::CoachStore;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DayCount {
    pub day: String,
    pub count: usize,
}

/// Failure statistics of one habit over one window.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FailurePatternSummary {
    pub habit_id: i64,
    pub total_days_tracked: usize,
    pub total_failures: usize,
    pub failure_rate: f64,
    pub patterns: PatternCounts,
    pub common_failure_days: Vec<DayCount>,
    pub consecutive_failures: usize,
    pub last_failure_date: Option<NaiveDate>,
}

impl FailurePatternSummary {
    pub fn empty(habit_id: i64) -> Self {
        FailurePatternSummary {
            habit_id,
            total_days_tracked: 0,
            total_failures: 0,
            failure_rate: 0.0,
            patterns: PatternCounts::default(),
            common_failure_days: Vec::new(),
            consecutive_failures: 0,
            last_failure_date: None,
        }
    }

    /// Summarize `logs`, expected in date order. `top_days` bounds the
    /// failure-day histogram.
    pub fn from_logs(habit_id: i64, logs: &[HabitLogEntry], top_days: usize) -> Self {
        if logs.is_empty() {
            return Self::empty(habit_id);
        }

        let failed: Vec<&HabitLogEntry> = logs.iter().filter(|l| l.is_failure()).collect();
        let total_failures = failed.len();
        let failure_rate = round2(total_failures as f64 / logs.len() as f64 * 100.0);

        let patterns = extract_patterns(failed.iter().filter_map(|l| l.failure_note()));

        FailurePatternSummary {
            habit_id,
            total_days_tracked: logs.len(),
            total_failures,
            failure_rate,
            patterns,
            common_failure_days: failure_days(&failed, top_days),
            consecutive_failures: trailing_failures(logs),
            last_failure_date: failed.iter().map(|l| l.date).max(),
        }
    }
}

/// Weekday histogram of failed entries, most frequent first.
/// Equal counts keep the order in which the days were first seen.
fn failure_days(failed: &[&HabitLogEntry], top: usize) -> Vec<DayCount> {
    let mut days: Vec<DayCount> = Vec::new();
    for log in failed {
        let name = log.weekday_name();
        match days.iter_mut().find(|d| d.day == name) {
            Some(day) => day.count += 1,
            None => days.push(DayCount { day: name, count: 1 }),
        }
    }
    days.sort_by(|a, b| b.count.cmp(&a.count));
    days.truncate(top);
    days
}

/// Length of the run of failures ending at the most recent entry.
fn trailing_failures(logs: &[HabitLogEntry]) -> usize {
    let mut sorted: Vec<&HabitLogEntry> = logs.iter().collect();
    sorted.sort_by_key(|l| l.date);
    sorted
        .iter()
        .rev()
        .take_while(|l| l.is_failure())
        .count()
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RepeatedFailure {
    pub pattern: FailureCategory,
    pub occurrences: usize,
    pub percentage: f64,
}

/// Categories seen at least `min_occurrences` times, most frequent first.
pub fn repeated_from_summary(summary: &FailurePatternSummary, min_occurrences: usize) -> Vec<RepeatedFailure> {
    let mut repeated: Vec<RepeatedFailure> = summary
        .patterns
        .iter()
        .filter(|(_, count)| *count >= min_occurrences)
        .map(|(pattern, occurrences)| RepeatedFailure {
            pattern,
            occurrences,
            percentage: share_of(occurrences, summary.total_failures),
        })
        .collect();
    repeated.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    repeated
}

/// Every observed category with its share of failures, most frequent first.
pub fn patterns_from_summary(summary: &FailurePatternSummary) -> Vec<FailurePattern> {
    let mut patterns: Vec<FailurePattern> = summary
        .patterns
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(category, frequency)| FailurePattern {
            pattern: category.as_str().to_string(),
            frequency,
            percentage: share_of(frequency, summary.total_failures),
        })
        .collect();
    patterns.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    patterns
}

fn share_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(count as f64 / total as f64 * 100.0)
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CriticalHabit {
    pub habit_id: i64,
    pub habit_name: String,
    pub failure_rate: f64,
    pub total_failures: usize,
    pub total_days_tracked: usize,
    pub consecutive_failures: usize,
}

/// Diagnostics payload for one user.
#[derive(Serialize, Debug, Clone)]
pub struct FailureAnalysisReport {
    pub user_id: i64,
    pub analysis_period_days: i64,
    pub total_habits: usize,
    pub habits_with_failures: usize,
    pub top_failure_reasons: PatternCounts,
    pub critical_habits: Vec<CriticalHabit>,
    pub habits: BTreeMap<i64, FailurePatternSummary>,
}

/// Failure statistics over a user's log history.
#[derive(Clone)]
pub struct FailureAnalyzer {
    store: Arc<dyn CoachStore>,
    context: EngineContext,
}

impl FailureAnalyzer {
    pub fn new(store: Arc<dyn CoachStore>, context: EngineContext) -> Self {
        FailureAnalyzer { store, context }
    }

    /// Summary over entries dated on or after `today - window_days`
    pub async fn patterns_for_habit(
        &self,
        habit_id: i64,
        user_id: i64,
        window_days: i64,
    ) -> Result<FailurePatternSummary, CoachError> {
        let range = DateRange::trailing(self.context.today(), window_days);
        self.patterns_in_range(habit_id, user_id, range).await
    }

    pub async fn patterns_in_range(
        &self,
        habit_id: i64,
        user_id: i64,
        range: DateRange,
    ) -> Result<FailurePatternSummary, CoachError> {
        let logs = self.store.logs_for_habit(habit_id, user_id, range).await?;
        Ok(FailurePatternSummary::from_logs(
            habit_id,
            &logs,
            self.context.thresholds.top_failure_days,
        ))
    }

    /// One independent summary per active habit
    pub async fn patterns_for_user(
        &self,
        user_id: i64,
        window_days: i64,
    ) -> Result<BTreeMap<i64, FailurePatternSummary>, CoachError> {
        let habits = self.store.active_habits_for(user_id).await?;
        let mut summaries = BTreeMap::new();
        for habit in habits {
            let summary = self.patterns_for_habit(habit.id, user_id, window_days).await?;
            summaries.insert(habit.id, summary);
        }
        Ok(summaries)
    }

    pub async fn repeated_failures(
        &self,
        habit_id: i64,
        user_id: i64,
        window_days: i64,
    ) -> Result<Vec<RepeatedFailure>, CoachError> {
        let summary = self.patterns_for_habit(habit_id, user_id, window_days).await?;
        Ok(repeated_from_summary(&summary, self.context.thresholds.repeated_failure_min))
    }

    pub async fn failure_patterns(
        &self,
        habit_id: i64,
        user_id: i64,
        window_days: i64,
    ) -> Result<Vec<FailurePattern>, CoachError> {
        let summary = self.patterns_for_habit(habit_id, user_id, window_days).await?;
        Ok(patterns_from_summary(&summary))
    }

    /// Categories over every failed, noted entry of the user, counted from
    /// the raw notes rather than summed per habit.
    pub async fn top_failure_reasons_across_habits(
        &self,
        user_id: i64,
        window_days: i64,
    ) -> Result<PatternCounts, CoachError> {
        let range = DateRange::trailing(self.context.today(), window_days);
        let logs = self.store.logs_for_user(user_id, range).await?;
        Ok(extract_patterns(logs.iter().filter_map(|l| l.failure_note())))
    }

    /// Active habits failing at least `failure_rate_threshold` percent of the
    /// time over the standard failure window, worst first.
    pub async fn critical_habits(
        &self,
        user_id: i64,
        failure_rate_threshold: f64,
    ) -> Result<Vec<CriticalHabit>, CoachError> {
        let window = self.context.thresholds.failure_window_days;
        let habits = self.store.active_habits_for(user_id).await?;

        let mut critical = Vec::new();
        for habit in habits {
            let summary = self.patterns_for_habit(habit.id, user_id, window).await?;
            if summary.failure_rate >= failure_rate_threshold {
                critical.push(CriticalHabit {
                    habit_id: habit.id,
                    habit_name: habit.name,
                    failure_rate: summary.failure_rate,
                    total_failures: summary.total_failures,
                    total_days_tracked: summary.total_days_tracked,
                    consecutive_failures: summary.consecutive_failures,
                });
            }
        }

        critical.sort_by(|a, b| {
            b.failure_rate
                .partial_cmp(&a.failure_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(critical)
    }

    pub async fn failure_analysis(&self, user_id: i64, days: i64) -> Result<FailureAnalysisReport, CoachError> {
        let all_habits = self.store.habits_for(user_id).await?;
        let habits = self.patterns_for_user(user_id, days).await?;
        let top_failure_reasons = self.top_failure_reasons_across_habits(user_id, days).await?;
        let critical_habits = self
            .critical_habits(user_id, self.context.thresholds.report_critical_failure_rate)
            .await?;

        let habits_with_failures = habits.values().filter(|s| s.total_failures > 0).count();
        self.context.metrics.record_failure_analysis();
        tracing::info!(
            user_id = user_id,
            days = days,
            habits = habits.len(),
            habits_with_failures = habits_with_failures,
            critical = critical_habits.len(),
            "Failure analysis computed"
        );

        Ok(FailureAnalysisReport {
            user_id,
            analysis_period_days: days,
            total_habits: all_habits.len(),
            habits_with_failures,
            top_failure_reasons,
            critical_habits,
            habits,
        })
    }
}
