use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use serde::{Serialize, Deserialize};
use tokio::sync::Mutex as AsyncMutex;
use crate::error::CoachError;
use crate::models::{Habit, HabitLogEntry, RecommendationKey, WeekStat, WeekStart, WeeklyRecommendationRecord};
use crate::models::week::DateRange;
use crate::store::transaction::{WeekKey, WeekTransaction};
use crate::store::{HabitSource, LogSource, RecommendationStore, WeekStatSource};

/// Full contents of the data file.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Dataset {
    pub habits: Vec<Habit>,
    pub logs: Vec<HabitLogEntry>,
    pub week_stats: Vec<WeekStat>,
    pub weekly_recommendations: Vec<WeeklyRecommendationRecord>,
}

/// Dataset kept in memory and written back to a JSON file on every commit.
/// Without a path the store is purely in-memory.
pub struct JsonStore {
    path: Option<PathBuf>,
    data: RwLock<Dataset>,
    week_locks: Mutex<HashMap<WeekKey, Arc<AsyncMutex<()>>>>,
    commit_lock: AsyncMutex<()>,
}

impl JsonStore {
    pub fn new(dataset: Dataset, path: Option<PathBuf>) -> Self {
        JsonStore {
            path,
            data: RwLock::new(dataset),
            week_locks: Mutex::new(HashMap::new()),
            commit_lock: AsyncMutex::new(()),
        }
    }

    pub fn in_memory(dataset: Dataset) -> Self {
        Self::new(dataset, None)
    }

    /// Open the data file, starting empty if it does not exist yet
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CoachError> {
        let path = path.into();
        let dataset = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<Dataset>(&content)
                .map_err(|e| CoachError::upstream(
                    format!("Failed to parse data file: {}", e),
                    "store_open"
                ).with_context(format!("path: {:?}", path)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = ?path, "Data file not found, starting with an empty dataset");
                Dataset::default()
            }
            Err(e) => {
                return Err(CoachError::upstream(
                    format!("Failed to read data file: {}", e),
                    "store_open"
                ).with_context(format!("path: {:?}", path)));
            }
        };

        tracing::debug!(
            path = ?path,
            habits = dataset.habits.len(),
            logs = dataset.logs.len(),
            week_stats = dataset.week_stats.len(),
            "Data file loaded"
        );
        Ok(Self::new(dataset, Some(path)))
    }

    /// Copy of the current dataset
    pub fn snapshot(&self) -> Dataset {
        self.data.read().clone()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Dataset> {
        self.data.read()
    }

    fn week_lock(&self, key: WeekKey) -> Arc<AsyncMutex<()>> {
        self.week_locks
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Forget the lock of a week nobody holds or waits for
    pub(crate) fn release_week_lock(&self, key: WeekKey) {
        let mut locks = self.week_locks.lock();
        if locks.get(&key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&key);
        }
    }

    /// Start a replace-all transaction for one (user, week).
    /// Waits while another transaction on the same key is open.
    pub async fn begin(&self, key: WeekKey) -> WeekTransaction<'_> {
        let guard = self.week_lock(key).lock_owned().await;
        WeekTransaction::new(self, key, guard)
    }

    /// Run `change` against a copy of the dataset, persist the copy and only
    /// then make it visible. Any error leaves the current dataset as it was.
    pub(crate) async fn apply<F, R>(&self, change: F) -> Result<R, CoachError>
    where
        F: FnOnce(&mut Dataset) -> Result<R, CoachError> + Send,
        R: Send,
    {
        let _commit = self.commit_lock.lock().await;
        let mut next = self.data.read().clone();
        let out = change(&mut next)?;
        self.persist(&next).await?;
        *self.data.write() = next;
        Ok(out)
    }

    /// Write the dataset next to the target file, then rename over it
    async fn persist(&self, dataset: &Dataset) -> Result<(), CoachError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoachError::persistence(
                    format!("Failed to create directory: {}", e),
                    "io"
                ).with_context(format!("path: {:?}", parent)))?;
        }

        let json = serde_json::to_string_pretty(dataset)
            .map_err(|e| CoachError::persistence(
                format!("Failed to serialize dataset: {}", e),
                "json_serialize"
            ))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| CoachError::persistence(
                format!("Failed to write data file: {}", e),
                "io"
            ).with_context(format!("path: {:?}", tmp)))?;

        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| CoachError::persistence(
                format!("Failed to replace data file: {}", e),
                "io"
            ).with_context(format!("path: {:?}", path)))?;

        Ok(())
    }
}

#[async_trait]
impl HabitSource for JsonStore {
    async fn active_habits_for(&self, user_id: i64) -> Result<Vec<Habit>, CoachError> {
        let mut habits: Vec<Habit> = self.data.read()
            .habits
            .iter()
            .filter(|h| h.user_id == user_id && h.is_active)
            .cloned()
            .collect();
        habits.sort_by_key(|h| h.id);
        Ok(habits)
    }

    async fn habits_for(&self, user_id: i64) -> Result<Vec<Habit>, CoachError> {
        let mut habits: Vec<Habit> = self.data.read()
            .habits
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        habits.sort_by_key(|h| h.id);
        Ok(habits)
    }

    async fn habit(&self, habit_id: i64) -> Result<Option<Habit>, CoachError> {
        Ok(self.data.read().habits.iter().find(|h| h.id == habit_id).cloned())
    }
}

#[async_trait]
impl LogSource for JsonStore {
    async fn logs_for_habit(
        &self,
        habit_id: i64,
        user_id: i64,
        range: DateRange,
    ) -> Result<Vec<HabitLogEntry>, CoachError> {
        let mut logs: Vec<HabitLogEntry> = self.data.read()
            .logs
            .iter()
            .filter(|l| l.habit_id == habit_id && l.user_id == user_id && range.contains(l.date))
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.date);
        Ok(logs)
    }

    async fn logs_for_user(&self, user_id: i64, range: DateRange) -> Result<Vec<HabitLogEntry>, CoachError> {
        let mut logs: Vec<HabitLogEntry> = self.data.read()
            .logs
            .iter()
            .filter(|l| l.user_id == user_id && range.contains(l.date))
            .cloned()
            .collect();
        logs.sort_by_key(|l| (l.date, l.habit_id));
        Ok(logs)
    }
}

#[async_trait]
impl WeekStatSource for JsonStore {
    async fn week_stats_for(&self, user_id: i64, range: DateRange) -> Result<Vec<WeekStat>, CoachError> {
        let mut stats: Vec<WeekStat> = self.data.read()
            .week_stats
            .iter()
            .filter(|s| s.user_id == user_id && range.contains(s.week_start_date))
            .cloned()
            .collect();
        stats.sort_by(|a, b| b.week_start_date.cmp(&a.week_start_date));
        Ok(stats)
    }

    async fn week_stat(&self, user_id: i64, week: WeekStart) -> Result<Option<WeekStat>, CoachError> {
        Ok(self.data.read()
            .week_stats
            .iter()
            .find(|s| s.user_id == user_id && s.week_start_date == week.date())
            .cloned())
    }
}

#[async_trait]
impl RecommendationStore for JsonStore {
    async fn replace_week(
        &self,
        user_id: i64,
        week: WeekStart,
        records: Vec<WeeklyRecommendationRecord>,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        let mut tx = self.begin(WeekKey::new(user_id, week)).await;
        let removed = tx.delete_week();
        tx.insert_all(records)?;
        let inserted = tx.commit().await?;
        tracing::debug!(
            user_id = user_id,
            week = %week,
            removed = removed,
            inserted = inserted.len(),
            "Replaced weekly recommendations"
        );
        Ok(inserted)
    }

    async fn recommendations_for_week(
        &self,
        user_id: i64,
        week: WeekStart,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        let key = WeekKey::new(user_id, week);
        Ok(self.data.read()
            .weekly_recommendations
            .iter()
            .filter(|r| key.matches(r))
            .cloned()
            .collect())
    }

    async fn pending_recommendations(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        let mut pending: Vec<WeeklyRecommendationRecord> = self.data.read()
            .weekly_recommendations
            .iter()
            .filter(|r| r.user_id == user_id && !r.is_acted_upon)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.week_start_date.cmp(&a.week_start_date));
        pending.truncate(limit);
        Ok(pending)
    }

    async fn mark_acted_upon(
        &self,
        key: RecommendationKey,
        at: DateTime<Utc>,
    ) -> Result<WeeklyRecommendationRecord, CoachError> {
        let week_key = WeekKey::new(key.user_id, key.week_start_date);
        let week_guard = self.week_lock(week_key).lock_owned().await;

        let result = self.apply(move |data| {
            let record = data
                .weekly_recommendations
                .iter_mut()
                .find(|r| r.key() == key)
                .ok_or_else(|| CoachError::not_found(
                    format!(
                        "No {} recommendation for habit {} in week {}",
                        key.recommendation_type, key.habit_id, key.week_start_date
                    ),
                    "mark_acted_upon"
                ))?;
            record.is_acted_upon = true;
            record.acted_upon_date = Some(at);
            Ok(record.clone())
        })
        .await;

        drop(week_guard);
        self.release_week_lock(week_key);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendationType;

    fn week(s: &str) -> WeekStart {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_week_locks_are_released() {
        let store = JsonStore::in_memory(Dataset::default());
        let key = WeekKey::new(1, week("2026-10-12"));

        let tx = store.begin(key).await;
        assert_eq!(store.week_locks.lock().len(), 1);
        tx.rollback();
        assert!(store.week_locks.lock().is_empty());

        store.replace_week(1, week("2026-10-05"), Vec::new()).await.unwrap();
        let missing = RecommendationKey {
            user_id: 1,
            week_start_date: week("2026-09-28"),
            habit_id: 7,
            recommendation_type: RecommendationType::ReduceScope,
        };
        assert!(store.mark_acted_upon(missing, Utc::now()).await.is_err());
        assert!(store.week_locks.lock().is_empty(), "no lock outlives its transaction");
    }

    #[tokio::test]
    async fn test_waiting_transaction_keeps_lock() {
        let store = Arc::new(JsonStore::in_memory(Dataset::default()));
        let key = WeekKey::new(1, week("2026-10-12"));

        let first = store.begin(key).await;
        let contender = store.clone();
        let waiter = tokio::spawn(async move {
            let tx = contender.begin(key).await;
            tx.rollback();
        });
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }

        first.rollback();
        assert_eq!(store.week_locks.lock().len(), 1, "the waiter still references the lock");
        waiter.await.unwrap();
        assert!(store.week_locks.lock().is_empty());
    }
}
