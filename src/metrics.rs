use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use serde::Serialize;

/// Counters for engine activity.
/// All metrics are atomic counters for thread-safety
#[derive(Clone, Default, Debug)]
pub struct Metrics {
    /// Recommendation bundles produced (full and single-habit)
    pub bundles_generated: Arc<AtomicU64>,
    /// Habit-level recommendations emitted
    pub habit_recommendations: Arc<AtomicU64>,
    /// Successful weekly replace-all generations
    pub weekly_generations: Arc<AtomicU64>,
    /// Weekly records written by those generations
    pub weekly_records_written: Arc<AtomicU64>,
    /// Weekly generations that failed and rolled back
    pub weekly_generation_failures: Arc<AtomicU64>,
    /// Failure analysis reports served
    pub failure_analyses: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub bundles_generated: u64,
    pub habit_recommendations: u64,
    pub weekly_generations: u64,
    pub weekly_records_written: u64,
    pub weekly_generation_failures: u64,
    pub failure_analyses: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bundle(&self, recommendations: usize) {
        self.bundles_generated.fetch_add(1, Ordering::Relaxed);
        self.habit_recommendations.fetch_add(recommendations as u64, Ordering::Relaxed);
    }

    pub fn record_weekly_generation(&self, records: usize) {
        self.weekly_generations.fetch_add(1, Ordering::Relaxed);
        self.weekly_records_written.fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn record_weekly_failure(&self) {
        self.weekly_generation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure_analysis(&self) {
        self.failure_analyses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bundles_generated: self.bundles_generated.load(Ordering::Relaxed),
            habit_recommendations: self.habit_recommendations.load(Ordering::Relaxed),
            weekly_generations: self.weekly_generations.load(Ordering::Relaxed),
            weekly_records_written: self.weekly_records_written.load(Ordering::Relaxed),
            weekly_generation_failures: self.weekly_generation_failures.load(Ordering::Relaxed),
            failure_analyses: self.failure_analyses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let handle = metrics.clone();
        handle.record_bundle(3);
        handle.record_weekly_generation(4);
        handle.record_weekly_failure();
        let snap = metrics.snapshot();
        assert_eq!(snap.bundles_generated, 1);
        assert_eq!(snap.habit_recommendations, 3);
        assert_eq!(snap.weekly_records_written, 4);
        assert_eq!(snap.weekly_generation_failures, 1);
        assert_eq!(snap.failure_analyses, 0);
    }
}
