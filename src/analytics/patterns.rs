use serde::{Serialize, Deserialize, Serializer};
use serde::ser::SerializeMap;
use std::fmt;

/// Why a habit attempt failed, as far as the note text tells.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Time,
    Tired,
    Motivation,
    Forgot,
    Sick,
    Travel,
    Weather,
    OtherPriority,
    Other,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::Time => "time",
            FailureCategory::Tired => "tired",
            FailureCategory::Motivation => "motivation",
            FailureCategory::Forgot => "forgot",
            FailureCategory::Sick => "sick",
            FailureCategory::Travel => "travel",
            FailureCategory::Weather => "weather",
            FailureCategory::OtherPriority => "other_priority",
            FailureCategory::Other => "other",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword table, tried top to bottom. The first category with a keyword
/// contained in the lowercased note wins.
const KEYWORD_TABLE: &[(FailureCategory, &[&str])] = &[
    (FailureCategory::Time, &["busy", "rush", "time", "schedule", "conflict", "late", "early"]),
    (FailureCategory::Tired, &["tired", "fatigue", "exhausted", "sleep", "energy"]),
    (FailureCategory::Motivation, &["motivation", "unmotivated", "lazy", "no reason"]),
    (FailureCategory::Forgot, &["forgot", "forget", "missed", "didn't remember"]),
    (FailureCategory::Sick, &["sick", "ill", "health", "doctor", "pain", "injury"]),
    (FailureCategory::Travel, &["travel", "trip", "away", "vacation", "commute"]),
    (FailureCategory::Weather, &["weather", "rain", "cold", "hot", "storm"]),
    (FailureCategory::OtherPriority, &["priority", "work", "family", "urgent", "emergency"]),
];

/// Classify one note. Blank notes carry no signal and return None.
pub fn classify_note(note: &str) -> Option<FailureCategory> {
    if note.trim().is_empty() {
        return None;
    }

    let lower = note.to_lowercase();
    let category = KEYWORD_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(FailureCategory::Other);
    Some(category)
}

/// Count notes per category
pub fn extract_patterns<'a, I>(notes: I) -> PatternCounts
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = PatternCounts::default();
    for note in notes {
        if let Some(category) = classify_note(note) {
            counts.increment(category);
        }
    }
    counts
}

/// Category counts in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternCounts {
    entries: Vec<(FailureCategory, usize)>,
}

impl PatternCounts {
    pub fn increment(&mut self, category: FailureCategory) {
        match self.entries.iter_mut().find(|(c, _)| *c == category) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((category, 1)),
        }
    }

    pub fn get(&self, category: FailureCategory) -> usize {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0, |(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FailureCategory, usize)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest count; on a tie the category seen first wins.
    pub fn most_frequent(&self) -> Option<(FailureCategory, usize)> {
        let mut best: Option<(FailureCategory, usize)> = None;
        for (category, count) in self.iter() {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((category, count));
            }
        }
        best
    }
}

impl Serialize for PatternCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, count) in &self.entries {
            map.serialize_entry(category.as_str(), count)?;
        }
        map.end()
    }
}
