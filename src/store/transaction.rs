use std::collections::HashSet;
use serde::{Serialize, Deserialize};
use tokio::sync::OwnedMutexGuard;
use crate::error::CoachError;
use crate::models::{RecommendationKey, WeekStart, WeeklyRecommendationRecord};
use crate::store::json::JsonStore;

const MAX_SUGGESTION_CHARS: usize = 500;
const MAX_DETAILS_CHARS: usize = 1000;

/// The unit of replacement: one user's recommendations for one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    pub user_id: i64,
    pub week: WeekStart,
}

impl WeekKey {
    pub fn new(user_id: i64, week: WeekStart) -> Self {
        WeekKey { user_id, week }
    }

    pub fn matches(&self, record: &WeeklyRecommendationRecord) -> bool {
        record.user_id == self.user_id && record.week_start_date == self.week
    }
}

/// Staged replace-all of one week's recommendations.
///
/// Holds the per-week lock from `begin` until commit or drop, so two
/// regenerations of the same (user, week) never interleave. Nothing reaches
/// the store before `commit`; dropping the transaction rolls it back.
pub struct WeekTransaction<'a> {
    store: &'a JsonStore,
    key: WeekKey,
    lock: Option<OwnedMutexGuard<()>>,
    delete_existing: bool,
    staged: Vec<WeeklyRecommendationRecord>,
    finished: bool,
}

impl<'a> WeekTransaction<'a> {
    pub(crate) fn new(store: &'a JsonStore, key: WeekKey, lock: OwnedMutexGuard<()>) -> Self {
        WeekTransaction {
            store,
            key,
            lock: Some(lock),
            delete_existing: false,
            staged: Vec::new(),
            finished: false,
        }
    }

    pub fn key(&self) -> WeekKey {
        self.key
    }

    /// Mark every existing record of the week for deletion.
    /// Returns how many records will be removed on commit.
    pub fn delete_week(&mut self) -> usize {
        self.delete_existing = true;
        self.staged.clear();
        self.store
            .read()
            .weekly_recommendations
            .iter()
            .filter(|r| self.key.matches(r))
            .count()
    }

    /// Stage records for insertion. The whole batch is rejected if any record
    /// violates the table constraints.
    pub fn insert_all(&mut self, records: Vec<WeeklyRecommendationRecord>) -> Result<usize, CoachError> {
        let data = self.store.read();

        let mut seen: HashSet<RecommendationKey> = self.staged.iter().map(|r| r.key()).collect();
        if !self.delete_existing {
            seen.extend(
                data.weekly_recommendations
                    .iter()
                    .filter(|r| self.key.matches(r))
                    .map(|r| r.key()),
            );
        }

        for record in &records {
            if !self.key.matches(record) {
                return Err(CoachError::persistence(
                    "Record does not belong to the transaction's week",
                    "weekly_insert"
                ).with_context(format!(
                    "expected user {} week {}, got user {} week {}",
                    self.key.user_id, self.key.week, record.user_id, record.week_start_date
                )));
            }

            let owned = data
                .habits
                .iter()
                .any(|h| h.id == record.habit_id && h.user_id == record.user_id);
            if !owned {
                return Err(CoachError::persistence(
                    format!("Habit {} does not exist for user {}", record.habit_id, record.user_id),
                    "weekly_insert"
                ));
            }

            if record.suggestion.chars().count() > MAX_SUGGESTION_CHARS {
                return Err(CoachError::persistence(
                    format!("Suggestion exceeds {} characters", MAX_SUGGESTION_CHARS),
                    "weekly_insert"
                ).with_context(format!("habit_id: {}", record.habit_id)));
            }

            let details_len = record.details.as_deref().map_or(0, |d| d.chars().count());
            if details_len > MAX_DETAILS_CHARS {
                return Err(CoachError::persistence(
                    format!("Details exceed {} characters", MAX_DETAILS_CHARS),
                    "weekly_insert"
                ).with_context(format!("habit_id: {}", record.habit_id)));
            }

            if !seen.insert(record.key()) {
                return Err(CoachError::persistence(
                    format!(
                        "Duplicate {} recommendation for habit {}",
                        record.recommendation_type, record.habit_id
                    ),
                    "weekly_insert"
                ));
            }
        }
        drop(data);

        let count = records.len();
        self.staged.extend(records);
        Ok(count)
    }

    /// Apply the staged delete and inserts as one change.
    pub async fn commit(mut self) -> Result<Vec<WeeklyRecommendationRecord>, CoachError> {
        let key = self.key;
        let delete_existing = self.delete_existing;
        let staged = std::mem::take(&mut self.staged);
        self.finished = true;

        let result = self.store
            .apply(move |data| {
                if delete_existing {
                    data.weekly_recommendations.retain(|r| !key.matches(r));
                }
                data.weekly_recommendations.extend(staged.iter().cloned());
                Ok(staged)
            })
            .await;

        match &result {
            Ok(records) => tracing::debug!(
                user_id = key.user_id,
                week = %key.week,
                inserted = records.len(),
                "Weekly transaction committed"
            ),
            Err(e) => tracing::warn!(
                user_id = key.user_id,
                week = %key.week,
                error = %e,
                "Weekly transaction commit failed, rolled back"
            ),
        }
        result
    }

    /// Discard everything staged.
    pub fn rollback(mut self) {
        self.finished = true;
        tracing::debug!(user_id = self.key.user_id, week = %self.key.week, "Weekly transaction rolled back");
    }
}

impl Drop for WeekTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                user_id = self.key.user_id,
                week = %self.key.week,
                staged = self.staged.len(),
                "Weekly transaction dropped without commit, rolled back"
            );
        }
        drop(self.lock.take());
        self.store.release_week_lock(self.key);
    }
}
