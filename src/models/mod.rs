pub mod habit;
pub mod log;
pub mod week;
pub mod recommendation;

pub use habit::{FrequencyUnit, Habit};
pub use log::HabitLogEntry;
pub use week::{WeekStat, WeekStart};
pub use recommendation::{
    FailurePattern, HabitRecommendation, Priority, RecommendationBundle,
    RecommendationDetails, RecommendationKey, RecommendationType, Trend,
    WeeklyRecommendationRecord,
};
