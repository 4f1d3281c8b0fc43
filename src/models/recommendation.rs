use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use crate::models::week::WeekStart;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    ReduceScope,
    RedesignHabit,
    AddStretch,
    EnableNewHabit,
    ConsistencyImprovement,
    ScheduleAdjustment,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::ReduceScope => "reduce_scope",
            RecommendationType::RedesignHabit => "redesign_habit",
            RecommendationType::AddStretch => "add_stretch",
            RecommendationType::EnableNewHabit => "enable_new_habit",
            RecommendationType::ConsistencyImprovement => "consistency_improvement",
            RecommendationType::ScheduleAdjustment => "schedule_adjustment",
        }
    }
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reduce_scope" => Ok(RecommendationType::ReduceScope),
            "redesign_habit" => Ok(RecommendationType::RedesignHabit),
            "add_stretch" => Ok(RecommendationType::AddStretch),
            "enable_new_habit" => Ok(RecommendationType::EnableNewHabit),
            "consistency_improvement" => Ok(RecommendationType::ConsistencyImprovement),
            "schedule_adjustment" => Ok(RecommendationType::ScheduleAdjustment),
            other => Err(format!("unknown recommendation type '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Sort rank, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// One failure category observed for a habit, with its share of all failures.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FailurePattern {
    pub pattern: String,
    pub frequency: usize,
    pub percentage: f64,
}

/// Rule-specific payload, tagged by recommendation type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "recommendation_type", rename_all = "snake_case")]
pub enum RecommendationDetails {
    ReduceScope {
        bad_weeks_count: usize,
        suggested_reduction: String,
    },
    RedesignHabit {
        failure_count: usize,
        failure_type: String,
    },
    AddStretch {
        stability_score: f64,
        trend_days: u32,
        suggested_stretch: String,
    },
    EnableNewHabit {
        weeks_at_threshold: usize,
        consistency_score: f64,
    },
}

impl RecommendationDetails {
    pub fn recommendation_type(&self) -> RecommendationType {
        match self {
            RecommendationDetails::ReduceScope { .. } => RecommendationType::ReduceScope,
            RecommendationDetails::RedesignHabit { .. } => RecommendationType::RedesignHabit,
            RecommendationDetails::AddStretch { .. } => RecommendationType::AddStretch,
            RecommendationDetails::EnableNewHabit { .. } => RecommendationType::EnableNewHabit,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HabitRecommendation {
    pub habit_id: i64,
    pub habit_name: String,
    pub title: String,
    pub description: String,
    pub action_items: Vec<String>,
    pub priority: Priority,
    pub reason: String,
    /// Completion over the trailing 7 days at generation time
    pub current_completion_rate: f64,
    pub trend: Trend,
    pub failure_patterns: Vec<FailurePattern>,
    #[serde(flatten)]
    pub details: RecommendationDetails,
}

impl HabitRecommendation {
    pub fn recommendation_type(&self) -> RecommendationType {
        self.details.recommendation_type()
    }
}

/// Everything the decision engine derives for one user in one pass.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RecommendationBundle {
    pub user_id: i64,
    pub generated_at: DateTime<Utc>,
    pub habit_recommendations: Vec<HabitRecommendation>,
    pub system_recommendations: Vec<String>,
    pub total_habits_tracked: usize,
    /// Mean of each habit's own 7-day completion rate. Not the same metric as
    /// WeekStat::average_completion_percentage.
    pub average_completion_rate: f64,
    pub habits_needing_attention: usize,
    pub next_steps: Vec<String>,
}

/// Natural key of a persisted weekly recommendation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecommendationKey {
    pub user_id: i64,
    pub week_start_date: WeekStart,
    pub habit_id: i64,
    pub recommendation_type: RecommendationType,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeeklyRecommendationRecord {
    pub user_id: i64,
    pub habit_id: i64,
    pub week_start_date: WeekStart,
    pub recommendation_type: RecommendationType,
    pub suggestion: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub is_acted_upon: bool,
    #[serde(default)]
    pub acted_upon_date: Option<DateTime<Utc>>,
}

impl WeeklyRecommendationRecord {
    pub fn new(
        user_id: i64,
        habit_id: i64,
        week_start_date: WeekStart,
        recommendation_type: RecommendationType,
        suggestion: String,
        details: String,
    ) -> Self {
        WeeklyRecommendationRecord {
            user_id,
            habit_id,
            week_start_date,
            recommendation_type,
            suggestion,
            details: Some(details),
            is_acted_upon: false,
            acted_upon_date: None,
        }
    }

    pub fn key(&self) -> RecommendationKey {
        RecommendationKey {
            user_id: self.user_id,
            week_start_date: self.week_start_date,
            habit_id: self.habit_id,
            recommendation_type: self.recommendation_type,
        }
    }
}
