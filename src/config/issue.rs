//! Diagnostics collected while loading and validating a config document.

use std::fmt;

use serde::Serialize;

/// Message recorded when no config file exists yet.
pub const FIRST_RUN_MESSAGE: &str = "Config file not found (first run).";

/// Message appended when `save` refuses an incomplete document.
pub const REFUSE_SAVE_MESSAGE: &str =
    "Refusing to save: config still requires setup (missing required fields).";

/// Category of a config diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// No config file yet. Benign: does not by itself make a load fail.
    FirstRun,
    /// Document could not be read, parsed, or has a non-object root.
    Structural,
    /// A field failed its constraint and was repaired or flagged.
    FieldValidation,
    /// An id reference does not resolve.
    Referential,
    /// Required content is missing (no instances, no enabled instance).
    Completeness,
}

/// A single human-readable diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl ConfigIssue {
    #[must_use]
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn first_run() -> Self {
        Self::new(IssueKind::FirstRun, FIRST_RUN_MESSAGE)
    }

    #[must_use]
    pub fn structural(message: impl Into<String>) -> Self {
        Self::new(IssueKind::Structural, message)
    }

    #[must_use]
    pub fn field(message: impl Into<String>) -> Self {
        Self::new(IssueKind::FieldValidation, message)
    }

    #[must_use]
    pub fn referential(message: impl Into<String>) -> Self {
        Self::new(IssueKind::Referential, message)
    }

    #[must_use]
    pub fn completeness(message: impl Into<String>) -> Self {
        Self::new(IssueKind::Completeness, message)
    }

    /// True for diagnostics that do not count against `ok`.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        self.kind == IssueKind::FirstRun
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_first_run_is_benign() {
        assert!(ConfigIssue::first_run().is_benign());
        assert!(!ConfigIssue::structural("bad").is_benign());
        assert!(!ConfigIssue::field("bad").is_benign());
        assert!(!ConfigIssue::referential("bad").is_benign());
        assert!(!ConfigIssue::completeness("bad").is_benign());
    }

    #[test]
    fn test_display_is_message_text() {
        let issue = ConfigIssue::field("instances[0].id is invalid");
        assert_eq!(issue.to_string(), "instances[0].id is invalid");
    }

    #[test]
    fn test_serializes_kind_as_snake_case() {
        let json = serde_json::to_value(ConfigIssue::first_run()).unwrap_or_default();
        assert_eq!(json["kind"], "first_run");
        assert_eq!(json["message"], FIRST_RUN_MESSAGE);
    }
}
