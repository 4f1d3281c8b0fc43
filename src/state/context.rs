use chrono::{Local, NaiveDate};
use crate::config::Thresholds;
use crate::metrics::Metrics;

/// Source of "today" for trailing windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Settings every engine component is constructed with.
#[derive(Clone, Default)]
pub struct EngineContext {
    pub thresholds: Thresholds,
    pub clock: Clock,
    pub metrics: Metrics,
}

impl EngineContext {
    pub fn new(thresholds: Thresholds) -> Self {
        EngineContext {
            thresholds,
            ..Default::default()
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}
