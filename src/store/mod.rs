//! Data access for the engine.
//!
//! The engine only ever talks to the traits below. `JsonStore` is the bundled
//! implementation: a single JSON dataset file held in memory and rewritten
//! atomically on every committed change.

pub mod json;
pub mod transaction;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::error::CoachError;
use crate::models::{Habit, HabitLogEntry, RecommendationKey, WeekStat, WeekStart, WeeklyRecommendationRecord};
use crate::models::week::DateRange;

pub use json::{Dataset, JsonStore};
pub use transaction::{WeekKey, WeekTransaction};

#[async_trait]
pub trait HabitSource: Send + Sync {
    /// Active habits of a user, ordered by id
    async fn active_habits_for(&self, user_id: i64) -> Result<Vec<Habit>, CoachError>;

    /// All habits of a user, active or not, ordered by id
    async fn habits_for(&self, user_id: i64) -> Result<Vec<Habit>, CoachError>;

    async fn habit(&self, habit_id: i64) -> Result<Option<Habit>, CoachError>;
}

#[async_trait]
pub trait LogSource: Send + Sync {
    /// Entries of one habit inside `range`, ordered by date
    async fn logs_for_habit(
        &self,
        habit_id: i64,
        user_id: i64,
        range: DateRange,
    ) -> Result<Vec<HabitLogEntry>, CoachError>;

    /// Entries of every habit of a user inside `range`, ordered by date
    async fn logs_for_user(
        &self,
        user_id: i64,
        range: DateRange,
    ) -> Result<Vec<HabitLogEntry>, CoachError>;
}

#[async_trait]
pub trait WeekStatSource: Send + Sync {
    /// Week stats whose week_start_date falls inside `range`, newest first
    async fn week_stats_for(&self, user_id: i64, range: DateRange) -> Result<Vec<WeekStat>, CoachError>;

    async fn week_stat(&self, user_id: i64, week: WeekStart) -> Result<Option<WeekStat>, CoachError>;
}

#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Delete every record for (user, week) and insert `records`, atomically.
    /// On error the previous set is left untouched.
    async fn replace_week(
        &self,
        user_id: i64,
        week: WeekStart,
        records: Vec<WeeklyRecommendationRecord>,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError>;

    async fn recommendations_for_week(
        &self,
        user_id: i64,
        week: WeekStart,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError>;

    /// Records not yet acted upon, newest week first
    async fn pending_recommendations(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError>;

    async fn mark_acted_upon(
        &self,
        key: RecommendationKey,
        at: DateTime<Utc>,
    ) -> Result<WeeklyRecommendationRecord, CoachError>;
}

/// Everything the engines need from storage.
pub trait CoachStore: HabitSource + LogSource + WeekStatSource + RecommendationStore {}

impl<T> CoachStore for T where T: HabitSource + LogSource + WeekStatSource + RecommendationStore {}
