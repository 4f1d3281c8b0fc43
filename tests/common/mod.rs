#![allow(dead_code)]

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use habit_coach_lib::error::CoachError;
use habit_coach_lib::models::week::DateRange;
use habit_coach_lib::models::{
    FrequencyUnit, Habit, HabitLogEntry, RecommendationKey, WeekStat, WeekStart, WeeklyRecommendationRecord,
};
use habit_coach_lib::state::{Clock, EngineContext};
use habit_coach_lib::store::{Dataset, HabitSource, JsonStore, LogSource, RecommendationStore, WeekStatSource};

pub const USER: i64 = 1;
pub const OTHER_USER: i64 = 2;

/// Fixed "today" for every test: a Monday.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn days_ago(days: i64) -> NaiveDate {
    today() - Duration::days(days)
}

pub fn week(s: &str) -> WeekStart {
    s.parse().unwrap()
}

pub fn context() -> EngineContext {
    EngineContext::default().with_clock(Clock::Fixed(today()))
}

pub fn habit(id: i64, user_id: i64, name: &str, target: u32, unit: FrequencyUnit) -> Habit {
    Habit {
        id,
        user_id,
        name: name.to_string(),
        description: None,
        category: None,
        target_frequency: target,
        frequency_unit: unit,
        is_active: true,
    }
}

pub fn inactive(mut habit: Habit) -> Habit {
    habit.is_active = false;
    habit
}

pub fn done(habit_id: i64, date: NaiveDate) -> HabitLogEntry {
    HabitLogEntry {
        habit_id,
        user_id: USER,
        date,
        completed: true,
        value: None,
        notes: None,
    }
}

pub fn missed(habit_id: i64, date: NaiveDate, note: Option<&str>) -> HabitLogEntry {
    HabitLogEntry {
        habit_id,
        user_id: USER,
        date,
        completed: false,
        value: None,
        notes: note.map(str::to_string),
    }
}

pub fn week_stat(week_start: NaiveDate, completion: f64) -> WeekStat {
    WeekStat {
        user_id: USER,
        week_start_date: week_start,
        average_completion_percentage: completion,
        total_days_tracked: 7,
        total_habits_completed: 0,
        best_day_completion: 0.0,
    }
}

pub fn dataset(habits: Vec<Habit>, logs: Vec<HabitLogEntry>, week_stats: Vec<WeekStat>) -> Dataset {
    Dataset {
        habits,
        logs,
        week_stats,
        weekly_recommendations: Vec::new(),
    }
}

pub fn memory_store(dataset: Dataset) -> Arc<JsonStore> {
    Arc::new(JsonStore::in_memory(dataset))
}

/// Store whose log source is unreachable. Everything else delegates.
pub struct FailingLogs {
    pub inner: JsonStore,
}

impl FailingLogs {
    pub fn new(dataset: Dataset) -> Self {
        FailingLogs {
            inner: JsonStore::in_memory(dataset),
        }
    }
}

#[async_trait]
impl HabitSource for FailingLogs {
    async fn active_habits_for(&self, user_id: i64) -> Result<Vec<Habit>, CoachError> {
        self.inner.active_habits_for(user_id).await
    }

    async fn habits_for(&self, user_id: i64) -> Result<Vec<Habit>, CoachError> {
        self.inner.habits_for(user_id).await
    }

    async fn habit(&self, habit_id: i64) -> Result<Option<Habit>, CoachError> {
        self.inner.habit(habit_id).await
    }
}

#[async_trait]
impl LogSource for FailingLogs {
    async fn logs_for_habit(
        &self,
        habit_id: i64,
        _user_id: i64,
        _range: DateRange,
    ) -> Result<Vec<HabitLogEntry>, CoachError> {
        Err(CoachError::upstream("log source unavailable", "logs").with_context(format!("habit_id: {}", habit_id)))
    }

    async fn logs_for_user(&self, _user_id: i64, _range: DateRange) -> Result<Vec<HabitLogEntry>, CoachError> {
        Err(CoachError::upstream("log source unavailable", "logs"))
    }
}

#[async_trait]
impl WeekStatSource for FailingLogs {
    async fn week_stats_for(&self, user_id: i64, range: DateRange) -> Result<Vec<WeekStat>, CoachError> {
        self.inner.week_stats_for(user_id, range).await
    }

    async fn week_stat(&self, user_id: i64, week: WeekStart) -> Result<Option<WeekStat>, CoachError> {
        self.inner.week_stat(user_id, week).await
    }
}

#[async_trait]
impl RecommendationStore for FailingLogs {
    async fn replace_week(
        &self,
        user_id: i64,
        week: WeekStart,
        records: Vec<WeeklyRecommendationRecord>,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        self.inner.replace_week(user_id, week, records).await
    }

    async fn recommendations_for_week(
        &self,
        user_id: i64,
        week: WeekStart,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        self.inner.recommendations_for_week(user_id, week).await
    }

    async fn pending_recommendations(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        self.inner.pending_recommendations(user_id, limit).await
    }

    async fn mark_acted_upon(
        &self,
        key: RecommendationKey,
        at: DateTime<Utc>,
    ) -> Result<WeeklyRecommendationRecord, CoachError> {
        self.inner.mark_acted_upon(key, at).await
    }
}
