//! Failure statistics derived from habit logs.

pub mod failures;
pub mod patterns;

pub use failures::{
    CriticalHabit, DayCount, FailureAnalysisReport, FailureAnalyzer, FailurePatternSummary, RepeatedFailure,
};
pub use patterns::{classify_note, extract_patterns, FailureCategory, PatternCounts};
