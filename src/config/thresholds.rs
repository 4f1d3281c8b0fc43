use serde::{Deserialize, Serialize};

/// Fixed rule thresholds and window sizes.
///
/// Percentages are on a 0-100 scale, windows are in days. Every field can be
/// overridden from the `[thresholds]` table of `coach.toml`; omitted fields
/// keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    // Reduce scope
    pub bad_week_completion: f64,
    pub bad_weeks_required: usize,
    pub scope_lookback_days: i64,

    // Redesign habit
    pub redesign_min_occurrences: usize,
    pub failure_window_days: i64,
    pub repeated_failure_min: usize,

    // Add stretch
    pub stretch_min_completion: f64,
    pub stretch_max_trend: f64,
    pub stretch_lookback_days: i64,
    pub stretch_min_weeks: usize,

    // Enable new habit
    pub new_habit_completion: f64,
    pub new_habit_weeks: usize,
    pub new_habit_lookback_days: i64,

    // Engine summary
    pub current_rate_window_days: i64,
    pub low_overall_completion: f64,
    pub progress_overall_completion: f64,
    pub excellent_overall_completion: f64,
    pub critical_failure_rate: f64,
    pub report_critical_failure_rate: f64,
    pub max_next_steps: usize,
    pub top_failure_days: usize,

    // Weekly generator
    pub weekly_low_completion: f64,
    pub weekly_consistency_completion: f64,
    pub weekly_stretch_completion: f64,
    pub weekly_repeated_failure_min: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            bad_week_completion: 50.0,
            bad_weeks_required: 2,
            scope_lookback_days: 14,

            redesign_min_occurrences: 3,
            failure_window_days: 14,
            repeated_failure_min: 2,

            stretch_min_completion: 70.0,
            stretch_max_trend: 10.0,
            stretch_lookback_days: 28,
            stretch_min_weeks: 2,

            new_habit_completion: 85.0,
            new_habit_weeks: 3,
            new_habit_lookback_days: 21,

            current_rate_window_days: 7,
            low_overall_completion: 50.0,
            progress_overall_completion: 70.0,
            excellent_overall_completion: 85.0,
            critical_failure_rate: 60.0,
            report_critical_failure_rate: 50.0,
            max_next_steps: 5,
            top_failure_days: 3,

            weekly_low_completion: 30.0,
            weekly_consistency_completion: 70.0,
            weekly_stretch_completion: 85.0,
            weekly_repeated_failure_min: 2,
        }
    }
}
