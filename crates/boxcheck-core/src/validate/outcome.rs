use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-way result of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    /// Neither pass nor fail: the value exists but not where (or not in
    /// every scope) it was expected. Severity is left to the caller.
    Notice,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => write!(f, "PASS"),
            Outcome::Fail => write!(f, "FAIL"),
            Outcome::Notice => write!(f, "NOTICE"),
        }
    }
}

/// A single discrete check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// `<label>__exists`, `<label>__in_<box>`, `<box>__box_present`, ...
    pub name: String,
    /// True exactly when `outcome` is [`Outcome::Pass`].
    pub pass: bool,
    pub outcome: Outcome,
    pub message: Option<String>,
}

impl Check {
    pub fn passed(name: impl Into<String>) -> Self {
        Check {
            name: name.into(),
            pass: true,
            outcome: Outcome::Pass,
            message: None,
        }
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Check {
            name: name.into(),
            pass: false,
            outcome: Outcome::Fail,
            message: Some(message.into()),
        }
    }

    pub fn notice(name: impl Into<String>, message: impl Into<String>) -> Self {
        Check {
            name: name.into(),
            pass: false,
            outcome: Outcome::Notice,
            message: Some(message.into()),
        }
    }
}

/// How a caller treats [`Outcome::Notice`] when deciding overall success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticePolicy {
    /// Notices count as failures.
    #[default]
    Fail,
    /// Notices are reported but do not fail the run.
    Allow,
}

/// Every check produced for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_path: Option<String>,
    pub checks: Vec<Check>,
}

impl ValidationReport {
    pub fn new(doc_path: Option<String>, checks: Vec<Check>) -> Self {
        ValidationReport { doc_path, checks }
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.outcome == Outcome::Fail)
    }

    pub fn notices(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.outcome == Outcome::Notice)
    }

    pub fn is_success(&self, policy: NoticePolicy) -> bool {
        let failed = self.failures().next().is_some();
        let noticed = self.notices().next().is_some();
        match policy {
            NoticePolicy::Fail => !failed && !noticed,
            NoticePolicy::Allow => !failed,
        }
    }
}
