pub mod rules;
pub mod weekly;

use std::sync::Arc;
use chrono::{NaiveDate, Utc};
use crate::analytics::failures::{patterns_from_summary, repeated_from_summary};
use crate::analytics::FailureAnalyzer;
use crate::error::CoachError;
use crate::models::log::{completion_percentage, round2};
use crate::models::week::DateRange;
use crate::models::{Habit, HabitRecommendation, RecommendationBundle, RecommendationDetails, WeekStat};
use crate::state::context::EngineContext;
use crate::store::CoachStore;
use rules::HabitEvidence;

pub use weekly::{WeekOverview, WeeklyRecommendationGenerator};

const ONBOARDING_MESSAGE: &str = "Create your first habit to get started!";
const ONBOARDING_STEP: &str = "Add a habit to begin tracking";

/// Week stats of one user cut to each rule's lookback, newest first.
#[derive(Debug, Clone, Default)]
struct WeekWindows {
    scope: Vec<WeekStat>,
    stretch: Vec<WeekStat>,
    new_habit: Vec<WeekStat>,
}

impl WeekWindows {
    fn from_stats(stats: &[WeekStat], today: NaiveDate, ctx: &EngineContext) -> Self {
        let t = &ctx.thresholds;
        let within = |days: i64| -> Vec<WeekStat> {
            let range = DateRange::trailing(today, days);
            stats
                .iter()
                .filter(|s| range.contains(s.week_start_date))
                .cloned()
                .collect()
        };
        WeekWindows {
            scope: within(t.scope_lookback_days),
            stretch: within(t.stretch_lookback_days),
            new_habit: within(t.new_habit_lookback_days),
        }
    }
}

/// Applies the rule set across a user's active habits and summarizes the
/// result. Never writes.
#[derive(Clone)]
pub struct DecisionEngine {
    store: Arc<dyn CoachStore>,
    analyzer: FailureAnalyzer,
    context: EngineContext,
}

impl DecisionEngine {
    pub fn new(store: Arc<dyn CoachStore>, context: EngineContext) -> Self {
        let analyzer = FailureAnalyzer::new(store.clone(), context.clone());
        DecisionEngine { store, analyzer, context }
    }

    pub fn analyzer(&self) -> &FailureAnalyzer {
        &self.analyzer
    }

    pub async fn generate_recommendations(&self, user_id: i64) -> Result<RecommendationBundle, CoachError> {
        let habits = self.store.active_habits_for(user_id).await?;

        if habits.is_empty() {
            tracing::info!(user_id = user_id, "No active habits, returning onboarding bundle");
            self.context.metrics.record_bundle(0);
            return Ok(RecommendationBundle {
                user_id,
                generated_at: Utc::now(),
                habit_recommendations: Vec::new(),
                system_recommendations: vec![ONBOARDING_MESSAGE.to_string()],
                total_habits_tracked: 0,
                average_completion_rate: 0.0,
                habits_needing_attention: 0,
                next_steps: vec![ONBOARDING_STEP.to_string()],
            });
        }

        let windows = self.load_week_windows(user_id).await?;

        let mut habit_recommendations = Vec::new();
        let mut rate_sum = 0.0;
        for habit in &habits {
            let rate = self.current_completion_rate(habit.id, user_id).await?;
            rate_sum += rate;
            habit_recommendations.extend(self.evaluate_habit(habit, user_id, rate, &windows).await?);
        }

        let average_completion_rate = round2(rate_sum / habits.len() as f64);
        let system_recommendations = self
            .system_recommendations(user_id, &windows, average_completion_rate)
            .await?;
        let next_steps = prioritize(&habit_recommendations, self.context.thresholds.max_next_steps);

        tracing::info!(
            user_id = user_id,
            habits = habits.len(),
            recommendations = habit_recommendations.len(),
            average_completion_rate = average_completion_rate,
            "Recommendations generated"
        );
        self.context.metrics.record_bundle(habit_recommendations.len());

        Ok(RecommendationBundle {
            user_id,
            generated_at: Utc::now(),
            habits_needing_attention: habit_recommendations.len(),
            habit_recommendations,
            system_recommendations,
            total_habits_tracked: habits.len(),
            average_completion_rate,
            next_steps,
        })
    }

    /// Rules 1 to 3 for a single habit, in rule order
    pub async fn generate_habit_recommendations(
        &self,
        habit: &Habit,
        user_id: i64,
    ) -> Result<Vec<HabitRecommendation>, CoachError> {
        let windows = self.load_week_windows(user_id).await?;
        let rate = self.current_completion_rate(habit.id, user_id).await?;
        self.evaluate_habit(habit, user_id, rate, &windows).await
    }

    /// Bundle for one habit owned by `user_id`. No system messages.
    pub async fn habit_recommendation_bundle(
        &self,
        habit_id: i64,
        user_id: i64,
    ) -> Result<RecommendationBundle, CoachError> {
        let habit = self
            .store
            .habit(habit_id)
            .await?
            .filter(|h| h.user_id == user_id)
            .ok_or_else(|| {
                CoachError::not_found(format!("Habit {} not found", habit_id), "habit_recommendations")
                    .with_context(format!("user_id: {}", user_id))
            })?;

        let recommendations = self.generate_habit_recommendations(&habit, user_id).await?;
        let rate = self.current_completion_rate(habit.id, user_id).await?;
        let next_steps = recommendations.iter().map(|r| format!("• {}", r.title)).collect();

        self.context.metrics.record_bundle(recommendations.len());
        Ok(RecommendationBundle {
            user_id,
            generated_at: Utc::now(),
            habits_needing_attention: recommendations.len(),
            habit_recommendations: recommendations,
            system_recommendations: Vec::new(),
            total_habits_tracked: 1,
            average_completion_rate: rate,
            next_steps,
        })
    }

    /// Completion over the trailing window, 2dp, 0.0 without logs
    pub async fn current_completion_rate(&self, habit_id: i64, user_id: i64) -> Result<f64, CoachError> {
        let range = DateRange::trailing(self.context.today(), self.context.thresholds.current_rate_window_days);
        let logs = self.store.logs_for_habit(habit_id, user_id, range).await?;
        Ok(round2(completion_percentage(&logs)))
    }

    async fn load_week_windows(&self, user_id: i64) -> Result<WeekWindows, CoachError> {
        let t = &self.context.thresholds;
        let longest = t
            .scope_lookback_days
            .max(t.stretch_lookback_days)
            .max(t.new_habit_lookback_days);
        let today = self.context.today();
        let stats = self
            .store
            .week_stats_for(user_id, DateRange::trailing(today, longest))
            .await?;
        Ok(WeekWindows::from_stats(&stats, today, &self.context))
    }

    async fn evaluate_habit(
        &self,
        habit: &Habit,
        user_id: i64,
        current_completion_rate: f64,
        windows: &WeekWindows,
    ) -> Result<Vec<HabitRecommendation>, CoachError> {
        let t = &self.context.thresholds;
        let summary = self
            .analyzer
            .patterns_for_habit(habit.id, user_id, t.failure_window_days)
            .await?;
        let failure_patterns = patterns_from_summary(&summary);
        let repeated = repeated_from_summary(&summary, t.repeated_failure_min);

        let evidence = HabitEvidence {
            habit,
            current_completion_rate,
            failure_patterns: &failure_patterns,
        };

        let recommendations: Vec<HabitRecommendation> = [
            rules::reduce_scope(&evidence, &windows.scope, t),
            rules::redesign_habit(&evidence, &repeated, t),
            rules::add_stretch(&evidence, &windows.stretch, t),
        ]
        .into_iter()
        .flatten()
        .collect();

        tracing::debug!(
            habit_id = habit.id,
            user_id = user_id,
            fired = recommendations.len(),
            "Habit rules evaluated"
        );
        Ok(recommendations)
    }

    async fn system_recommendations(
        &self,
        user_id: i64,
        windows: &WeekWindows,
        average_completion_rate: f64,
    ) -> Result<Vec<String>, CoachError> {
        let t = &self.context.thresholds;
        let mut messages = Vec::new();

        if let Some(RecommendationDetails::EnableNewHabit { weeks_at_threshold, .. }) =
            rules::ready_for_new_habit(&windows.new_habit, t)
        {
            messages.push(format!(
                "🎉 You've demonstrated {:.0}%+ completion for {} weeks! \
                 You're ready to add a new habit to your routine.",
                t.new_habit_completion, weeks_at_threshold
            ));
        }

        if let Some(message) = completion_band_message(average_completion_rate, t) {
            messages.push(message);
        }

        let critical = self
            .analyzer
            .critical_habits(user_id, t.critical_failure_rate)
            .await?;
        if !critical.is_empty() {
            messages.push(format!(
                "⚠️ {} habit(s) have high failure rates. Consider pausing one to focus on the others.",
                critical.len()
            ));
        }

        let reasons = self
            .analyzer
            .top_failure_reasons_across_habits(user_id, t.failure_window_days)
            .await?;
        if let Some((category, _)) = reasons.most_frequent() {
            messages.push(format!(
                "🔍 Your most common failure reason is '{}'. Try to address this barrier proactively.",
                category
            ));
        }

        Ok(messages)
    }
}

/// Fixed message for the overall completion band, none between the
/// progress and excellent thresholds.
fn completion_band_message(average: f64, t: &crate::config::Thresholds) -> Option<String> {
    if average < t.low_overall_completion {
        Some(format!(
            "💡 Your overall completion is below {:.0}%. Try focusing on just 2-3 core habits before adding more.",
            t.low_overall_completion
        ))
    } else if average < t.progress_overall_completion {
        Some("📈 You're making progress! Consider scheduling a weekly review to identify and fix obstacles.".to_string())
    } else if average >= t.excellent_overall_completion {
        Some(format!(
            "🏆 You're tracking habits consistently at {:.0}%+! Keep up this excellent momentum!",
            t.excellent_overall_completion
        ))
    } else {
        None
    }
}

/// Numbered next steps, most urgent first. Equal priorities keep rule order.
fn prioritize(recommendations: &[HabitRecommendation], max: usize) -> Vec<String> {
    let mut sorted: Vec<&HabitRecommendation> = recommendations.iter().collect();
    sorted.sort_by_key(|r| r.priority.rank());
    sorted
        .iter()
        .take(max)
        .enumerate()
        .map(|(i, r)| format!("{}. {} for '{}'", i + 1, r.title, r.habit_name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Thresholds;
    use crate::models::{Priority, Trend};

    fn rec(name: &str, title: &str, priority: Priority) -> HabitRecommendation {
        HabitRecommendation {
            habit_id: 1,
            habit_name: name.into(),
            title: title.into(),
            description: String::new(),
            action_items: vec![],
            priority,
            reason: String::new(),
            current_completion_rate: 0.0,
            trend: Trend::Stable,
            failure_patterns: vec![],
            details: RecommendationDetails::RedesignHabit {
                failure_count: 3,
                failure_type: "time".into(),
            },
        }
    }

    #[test]
    fn test_prioritize_is_stable_and_capped() {
        let recs = vec![
            rec("Read", "Stretch", Priority::Medium),
            rec("Run", "Reduce", Priority::High),
            rec("Yoga", "Stretch", Priority::Medium),
            rec("Swim", "Redesign", Priority::High),
            rec("Walk", "Stretch", Priority::Low),
            rec("Code", "Fix", Priority::Critical),
        ];
        let steps = prioritize(&recs, 5);
        assert_eq!(
            steps,
            vec![
                "1. Fix for 'Code'",
                "2. Reduce for 'Run'",
                "3. Redesign for 'Swim'",
                "4. Stretch for 'Read'",
                "5. Stretch for 'Yoga'",
            ]
        );
    }

    #[test]
    fn test_completion_bands() {
        let t = Thresholds::default();
        assert!(completion_band_message(49.99, &t).unwrap().starts_with("💡"));
        assert!(completion_band_message(50.0, &t).unwrap().starts_with("📈"));
        assert!(completion_band_message(69.99, &t).unwrap().starts_with("📈"));
        assert_eq!(completion_band_message(70.0, &t), None);
        assert_eq!(completion_band_message(84.99, &t), None);
        assert!(completion_band_message(85.0, &t).unwrap().starts_with("🏆"));
    }

    #[test]
    fn test_week_windows_cut_by_lookback() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let stat = |y, m, d| WeekStat {
            user_id: 1,
            week_start_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            average_completion_percentage: 80.0,
            total_days_tracked: 7,
            total_habits_completed: 0,
            best_day_completion: 0.0,
        };
        let stats = vec![stat(2026, 10, 12), stat(2026, 10, 5), stat(2026, 9, 28), stat(2026, 9, 21)];
        let windows = WeekWindows::from_stats(&stats, today, &EngineContext::default());
        assert_eq!(windows.scope.len(), 2);
        assert_eq!(windows.new_habit.len(), 3);
        assert_eq!(windows.stretch.len(), 4);
    }
}
