use chrono::NaiveDate;
use serde::{Serialize, Deserialize};

/// One day's record for one habit. Written by the logging side, read-only here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HabitLogEntry {
    pub habit_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub completed: bool,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl HabitLogEntry {
    pub fn is_failure(&self) -> bool {
        !self.completed
    }

    /// Note text of a failed entry, if it carries any non-blank text.
    pub fn failure_note(&self) -> Option<&str> {
        if self.completed {
            return None;
        }
        self.notes
            .as_deref()
            .filter(|n| !n.trim().is_empty())
    }

    /// Day name used by the failure-day histogram ("Monday", ...).
    pub fn weekday_name(&self) -> String {
        self.date.format("%A").to_string()
    }
}

/// Percentage of completed entries, 0.0 for an empty slice.
pub fn completion_percentage(logs: &[HabitLogEntry]) -> f64 {
    if logs.is_empty() {
        return 0.0;
    }
    let completed = logs.iter().filter(|l| l.completed).count();
    completed as f64 / logs.len() as f64 * 100.0
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
