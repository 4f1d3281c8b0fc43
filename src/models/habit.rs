use serde::{Serialize, Deserialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    Day,
    Week,
    Month,
}

impl FrequencyUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyUnit::Day => "day",
            FrequencyUnit::Week => "week",
            FrequencyUnit::Month => "month",
        }
    }
}

impl Default for FrequencyUnit {
    fn default() -> Self {
        FrequencyUnit::Day
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-defined recurring action with a target frequency.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Habit {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_target_frequency")]
    pub target_frequency: u32,
    #[serde(default)]
    pub frequency_unit: FrequencyUnit,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_target_frequency() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

impl Habit {
    /// Frequency after dropping one repetition, never below once per unit.
    pub fn reduced_frequency(&self) -> u32 {
        self.target_frequency.saturating_sub(1).max(1)
    }

    pub fn stretched_frequency(&self) -> u32 {
        self.target_frequency.saturating_add(1)
    }

    /// Render a frequency change, e.g. "5x → 4x per week".
    pub fn frequency_change(&self, to: u32) -> String {
        format!("{}x → {}x per {}", self.target_frequency, to, self.frequency_unit)
    }
}
