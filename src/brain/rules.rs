//! The four recommendation rules.
//!
//! Each rule is a pure function over data already loaded by the engine, so it
//! can be evaluated against hand-built week stats and failure lists. A rule
//! that lacks the data it needs abstains by returning `None`.

use crate::analytics::RepeatedFailure;
use crate::config::Thresholds;
use crate::models::log::round2;
use crate::models::{
    FailurePattern, Habit, HabitRecommendation, Priority, RecommendationDetails, Trend, WeekStat,
};

/// Per-habit inputs shared by every rule.
#[derive(Debug, Clone, Copy)]
pub struct HabitEvidence<'a> {
    pub habit: &'a Habit,
    /// Completion over the trailing 7 days, 0.0 without logs
    pub current_completion_rate: f64,
    pub failure_patterns: &'a [FailurePattern],
}

impl<'a> HabitEvidence<'a> {
    #[allow(clippy::too_many_arguments)]
    fn recommendation(
        &self,
        title: &str,
        description: String,
        action_items: Vec<String>,
        priority: Priority,
        reason: String,
        trend: Trend,
        details: RecommendationDetails,
    ) -> HabitRecommendation {
        HabitRecommendation {
            habit_id: self.habit.id,
            habit_name: self.habit.name.clone(),
            title: title.to_string(),
            description,
            action_items,
            priority,
            reason,
            current_completion_rate: self.current_completion_rate,
            trend,
            failure_patterns: self.failure_patterns.to_vec(),
            details,
        }
    }
}

/// "2 weeks" for whole weeks, "10 days" otherwise.
fn window_phrase(days: i64) -> String {
    if days > 0 && days % 7 == 0 {
        format!("{} weeks", days / 7)
    } else {
        format!("{} days", days)
    }
}

/// Reduce scope: the most recent weeks in the lookback are all bad.
///
/// `weeks` holds the user's week stats inside the scope lookback, newest
/// first. Only the newest `bad_weeks_required` rows are considered.
pub fn reduce_scope(
    evidence: &HabitEvidence<'_>,
    weeks: &[WeekStat],
    t: &Thresholds,
) -> Option<HabitRecommendation> {
    let required = t.bad_weeks_required;
    if weeks.len() < required {
        return None;
    }

    let bad_weeks_count = weeks
        .iter()
        .take(required)
        .filter(|w| w.average_completion_percentage < t.bad_week_completion)
        .count();
    if bad_weeks_count < required {
        return None;
    }

    let habit = evidence.habit;
    Some(evidence.recommendation(
        "Consider Reducing Habit Scope",
        format!(
            "Your '{}' habit has had {} consecutive weeks with low completion (< {:.0}%). \
             This suggests the current scope might be too ambitious.",
            habit.name, required, t.bad_week_completion
        ),
        vec![
            format!(
                "Reduce frequency from {}x per {} to a smaller number",
                habit.target_frequency, habit.frequency_unit
            ),
            "Break the habit into smaller, more achievable steps".to_string(),
            "Consider setting a specific time or trigger for the habit".to_string(),
            "Review and remove any obstacles to completion".to_string(),
        ],
        Priority::High,
        format!(
            "{} consecutive weeks below {:.0}% completion threshold",
            required, t.bad_week_completion
        ),
        Trend::Down,
        RecommendationDetails::ReduceScope {
            bad_weeks_count,
            suggested_reduction: habit.frequency_change(habit.reduced_frequency()),
        },
    ))
}

/// Redesign: one failure category dominates the failure window.
///
/// `repeated` is the habit's repeated-failure list, most frequent first.
pub fn redesign_habit(
    evidence: &HabitEvidence<'_>,
    repeated: &[RepeatedFailure],
    t: &Thresholds,
) -> Option<HabitRecommendation> {
    let top = repeated.first()?;
    if top.occurrences < t.redesign_min_occurrences {
        return None;
    }

    let habit = evidence.habit;
    let pattern = top.pattern.as_str();
    Some(evidence.recommendation(
        "Redesign Habit for Better Success",
        format!(
            "Your '{}' habit consistently fails due to '{}' (occurred {} times in the last {}). \
             The habit design might not be compatible with your lifestyle.",
            habit.name,
            pattern,
            top.occurrences,
            window_phrase(t.failure_window_days)
        ),
        vec![
            format!("Address the '{}' barrier directly", pattern),
            format!("Redesign the habit to work around {}", pattern),
            "Consider changing the time, location, or method of habit execution".to_string(),
            "Create a specific implementation plan for the new design".to_string(),
            "Test the redesigned habit for 1-2 weeks".to_string(),
        ],
        Priority::High,
        format!("Same failure pattern ({}) repeated {} times", pattern, top.occurrences),
        Trend::Down,
        RecommendationDetails::RedesignHabit {
            failure_count: top.occurrences,
            failure_type: pattern.to_string(),
        },
    ))
}

/// Add stretch: every week in the stretch lookback is stable and the
/// newest week is not clearly above the oldest.
///
/// `weeks` holds the week stats inside the stretch lookback, newest first.
pub fn add_stretch(
    evidence: &HabitEvidence<'_>,
    weeks: &[WeekStat],
    t: &Thresholds,
) -> Option<HabitRecommendation> {
    if weeks.len() < t.stretch_min_weeks {
        return None;
    }
    let (newest, oldest) = match (weeks.first(), weeks.last()) {
        (Some(newest), Some(oldest)) => (newest, oldest),
        _ => return None,
    };

    let stable = weeks
        .iter()
        .all(|w| w.average_completion_percentage >= t.stretch_min_completion);
    if !stable {
        return None;
    }

    let trend = newest.average_completion_percentage - oldest.average_completion_percentage;
    if trend >= t.stretch_max_trend {
        return None;
    }

    let stability_score =
        weeks.iter().map(|w| w.average_completion_percentage).sum::<f64>() / weeks.len() as f64;
    let habit = evidence.habit;
    let stretched = habit.stretched_frequency();

    Some(evidence.recommendation(
        "You're Ready for a Stretch Goal!",
        format!(
            "You've maintained excellent consistency with '{}' at {:.0}% completion. \
             Since your performance has plateaued, it's time to challenge yourself with a stretch goal.",
            habit.name, stability_score
        ),
        vec![
            format!(
                "Increase frequency from {}x to {}x per {}",
                habit.target_frequency, stretched, habit.frequency_unit
            ),
            "Or increase quality/duration of each completion".to_string(),
            "Add a numerical target (e.g., 'run 5km' instead of 'run')".to_string(),
            "Track your progress on the stretch goal for 2-3 weeks".to_string(),
        ],
        Priority::Medium,
        format!("Consistent {:.0}% completion with stable trend", stability_score),
        Trend::Stable,
        RecommendationDetails::AddStretch {
            stability_score,
            trend_days: (weeks.len() * 7) as u32,
            suggested_stretch: habit.frequency_change(stretched),
        },
    ))
}

/// New-habit readiness: the newest `new_habit_weeks` rows in the lookback
/// all reach the threshold. Returns the system-level payload when ready.
pub fn ready_for_new_habit(weeks: &[WeekStat], t: &Thresholds) -> Option<RecommendationDetails> {
    let required = t.new_habit_weeks;
    if required == 0 || weeks.len() < required {
        return None;
    }

    let recent = &weeks[..required];
    if !recent
        .iter()
        .all(|w| w.average_completion_percentage >= t.new_habit_completion)
    {
        return None;
    }

    let mean = recent.iter().map(|w| w.average_completion_percentage).sum::<f64>() / required as f64;
    Some(RecommendationDetails::EnableNewHabit {
        weeks_at_threshold: required,
        consistency_score: round2(mean),
    })
}
