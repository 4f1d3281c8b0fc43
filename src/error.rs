use serde::{Serialize, Deserialize};
use std::fmt;

/// Broad classification of a failure, used by callers to decide how to surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Referenced habit, user or record does not exist or belongs to someone else
    NotFound,
    /// Caller supplied a malformed argument (e.g. a week identifier)
    InvalidInput,
    /// A weekly-recommendation transaction failed and was rolled back
    Persistence,
    /// A data source (habits, logs, week stats) could not be read
    Upstream,
    /// Configuration could not be loaded
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Config => "config",
        }
    }
}

/// Unified error type for the whole crate.
/// Every fallible operation returns Result<T, CoachError>.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachError {
    pub kind: ErrorKind,
    pub message: String,
    pub stage: String,
    pub context: Option<String>,
    pub source: Option<String>,
}

impl CoachError {
    /// Create a new error with kind, message and stage
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S, stage: &'static str) -> Self {
        CoachError {
            kind,
            message: message.into(),
            stage: stage.to_string(),
            context: None,
            source: None,
        }
    }

    pub fn not_found<S: Into<String>>(message: S, stage: &'static str) -> Self {
        Self::new(ErrorKind::NotFound, message, stage)
    }

    pub fn invalid_input<S: Into<String>>(message: S, stage: &'static str) -> Self {
        Self::new(ErrorKind::InvalidInput, message, stage)
    }

    pub fn persistence<S: Into<String>>(message: S, stage: &'static str) -> Self {
        Self::new(ErrorKind::Persistence, message, stage)
    }

    pub fn upstream<S: Into<String>>(message: S, stage: &'static str) -> Self {
        Self::new(ErrorKind::Upstream, message, stage)
    }

    /// Add additional context information
    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add source error information
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl fmt::Display for CoachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.stage, self.kind.as_str(), self.message)?;
        if let Some(ref context) = self.context {
            write!(f, " (context: {})", context)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (source: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for CoachError {}

impl From<std::io::Error> for CoachError {
    fn from(err: std::io::Error) -> Self {
        CoachError::persistence(
            format!("I/O error: {}", err),
            "io"
        ).with_source("std::io")
    }
}

impl From<serde_json::Error> for CoachError {
    fn from(err: serde_json::Error) -> Self {
        CoachError::persistence(
            format!("JSON error: {}", err),
            "json"
        ).with_source("serde_json")
    }
}

impl From<toml::de::Error> for CoachError {
    fn from(err: toml::de::Error) -> Self {
        CoachError::new(
            ErrorKind::Config,
            format!("Invalid configuration: {}", err),
            "config"
        ).with_source("toml")
    }
}

impl From<crate::models::week::WeekStartError> for CoachError {
    fn from(err: crate::models::week::WeekStartError) -> Self {
        CoachError::invalid_input(err.to_string(), "week_start")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = CoachError::not_found("Habit 7 not found", "habit_lookup");
        assert_eq!(error.message, "Habit 7 not found");
        assert_eq!(error.stage, "habit_lookup");
        assert!(error.is_not_found());
    }

    #[test]
    fn test_error_with_context() {
        let error = CoachError::persistence("insert failed", "weekly_replace")
            .with_context("user_id: 3");
        assert_eq!(error.context.as_deref(), Some("user_id: 3"));
        assert_eq!(error.kind, ErrorKind::Persistence);
    }

    #[test]
    fn test_error_display() {
        let error = CoachError::upstream("log store offline", "logs")
            .with_context("habit_id: 1")
            .with_source("test");
        let display = format!("{}", error);
        assert!(display.contains("[logs:upstream]"));
        assert!(display.contains("log store offline"));
        assert!(display.contains("habit_id: 1"));
    }

    #[test]
    fn test_io_error_maps_to_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: CoachError = io.into();
        assert_eq!(error.kind, ErrorKind::Persistence);
        assert_eq!(error.source.as_deref(), Some("std::io"));
    }
}
