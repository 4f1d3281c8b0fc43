use std::sync::Arc;
use crate::analytics::FailureAnalyzer;
use crate::brain::{DecisionEngine, WeeklyRecommendationGenerator};
use crate::metrics::MetricsSnapshot;
use crate::state::context::EngineContext;
use crate::store::{CoachStore, JsonStore};

/// Application-wide state container.
/// Holds the store and the engines built on top of it; every command
/// receives it explicitly.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub context: EngineContext,
    engine: DecisionEngine,
    weekly: WeeklyRecommendationGenerator,
}

impl AppState {
    pub fn new(store: Arc<JsonStore>, context: EngineContext) -> Self {
        let source: Arc<dyn CoachStore> = store.clone();
        AppState {
            engine: DecisionEngine::new(source.clone(), context.clone()),
            weekly: WeeklyRecommendationGenerator::new(source, context.clone()),
            store,
            context,
        }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn analyzer(&self) -> &FailureAnalyzer {
        self.engine.analyzer()
    }

    pub fn weekly(&self) -> &WeeklyRecommendationGenerator {
        &self.weekly
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.context.metrics.snapshot()
    }
}
