use chrono::{Datelike, Days, Duration, NaiveDate, Weekday};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

/// Aggregated statistics for one user and one Monday-anchored week.
/// Produced by the summary aggregator; only read here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeekStat {
    pub user_id: i64,
    pub week_start_date: NaiveDate,
    pub average_completion_percentage: f64,
    #[serde(default)]
    pub total_days_tracked: u32,
    #[serde(default)]
    pub total_habits_completed: u32,
    #[serde(default)]
    pub best_day_completion: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeekStartError {
    #[error("invalid week start '{0}': expected YYYY-MM-DD")]
    Malformed(String),
    #[error("week start {0} is a {1}, not a Monday")]
    NotMonday(NaiveDate, Weekday),
}

/// Identifier of a week: the ISO date of its Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekStart(NaiveDate);

impl WeekStart {
    pub fn new(date: NaiveDate) -> Result<Self, WeekStartError> {
        match date.weekday() {
            Weekday::Mon => Ok(WeekStart(date)),
            other => Err(WeekStartError::NotMonday(date, other)),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Sunday closing the week, saturating at the last representable date.
    pub fn end_date(&self) -> NaiveDate {
        self.0.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX)
    }

    pub fn range(&self) -> DateRange {
        DateRange::between(self.0, self.end_date())
    }
}

impl FromStr for WeekStart {
    type Err = WeekStartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 10 {
            return Err(WeekStartError::Malformed(s.to_string()));
        }
        let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map_err(|_| WeekStartError::Malformed(s.to_string()))?;
        WeekStart::new(date)
    }
}

impl TryFrom<String> for WeekStart {
    type Error = WeekStartError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekStart> for String {
    fn from(week: WeekStart) -> Self {
        week.to_string()
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Inclusive calendar-date range. An open end means "up to any date".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn since(start: NaiveDate) -> Self {
        DateRange { start, end: None }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end: Some(end) }
    }

    /// Everything on or after `today - days`. Windows reaching past the
    /// earliest representable date start there.
    pub fn trailing(today: NaiveDate, days: i64) -> Self {
        let start = Duration::try_days(days)
            .and_then(|window| today.checked_sub_signed(window))
            .unwrap_or(NaiveDate::MIN);
        DateRange::since(start)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.map_or(true, |end| date <= end)
    }
}
