//! Scenario and run reports.
//!
//! Every scenario ends in exactly one of `passed`, `passed-with-skips(list)`,
//! or `failed(reason, step)`. A run is successful when no scenario failed.

use crate::result::{TolerarError, TolerarResult};
use crate::scenario::{StepPath, Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// An optional step that did not happen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRecord {
    /// Step position
    pub step: StepPath,
    /// Step description
    pub description: String,
    /// Why it was skipped
    pub reason: String,
}

impl fmt::Display for SkipRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({}): {}", self.step, self.description, self.reason)
    }
}

/// Category of a required-step failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No candidate resolved
    ElementNotFound,
    /// Observed state outside the accepted family
    AssertionMismatch,
    /// Page never settled
    NavigationTimeout,
    /// Browser or driver failure
    Driver,
    /// Anything else (invalid state, bad pattern)
    Other,
}

impl From<&TolerarError> for FailureKind {
    fn from(error: &TolerarError) -> Self {
        match error {
            TolerarError::ElementNotFound { .. }
            | TolerarError::OptionalAffordanceAbsent { .. } => Self::ElementNotFound,
            TolerarError::AssertionMismatch { .. } => Self::AssertionMismatch,
            TolerarError::NavigationTimeout { .. } => Self::NavigationTimeout,
            TolerarError::Driver { .. }
            | TolerarError::BrowserLaunch { .. }
            | TolerarError::ActionFailed { .. } => Self::Driver,
            _ => Self::Other,
        }
    }
}

/// A required step that failed, ending the scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFailure {
    /// Step position
    pub step: StepPath,
    /// Step description
    pub description: String,
    /// Failure category
    pub kind: FailureKind,
    /// Attempted selectors or expected-vs-observed detail
    pub detail: String,
}

impl ScenarioFailure {
    /// Wrap an error raised by a step
    #[must_use]
    pub fn from_error(
        step: StepPath,
        description: impl Into<String>,
        error: &TolerarError,
    ) -> Self {
        Self {
            step,
            description: description.into(),
            kind: FailureKind::from(error),
            detail: error.to_string(),
        }
    }
}

impl fmt::Display for ScenarioFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({}): {}", self.step, self.description, self.detail)
    }
}

/// Terminal outcome of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "kebab-case")]
pub enum ScenarioOutcome {
    /// Every step ran
    Passed,
    /// Required steps passed, some optional ones were skipped
    PassedWithSkips(Vec<SkipRecord>),
    /// A required step failed
    Failed(ScenarioFailure),
}

impl ScenarioOutcome {
    /// Check if outcome is passing (with or without skips)
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        !self.is_failed()
    }

    /// Check if outcome is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Skips recorded (empty unless passed with skips)
    #[must_use]
    pub fn skips(&self) -> &[SkipRecord] {
        match self {
            Self::PassedWithSkips(skips) => skips,
            Self::Passed | Self::Failed(_) => &[],
        }
    }

    /// Short label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::PassedWithSkips(_) => "passed-with-skips",
            Self::Failed(_) => "failed",
        }
    }
}

/// What happened to one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Completed
    Done,
    /// Optional step skipped
    Skipped,
    /// Required step failed
    Failed,
}

/// One entry of a scenario's step log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLogEntry {
    /// Step position
    pub step: StepPath,
    /// Step description
    pub description: String,
    /// Action name
    pub action: String,
    /// Step tier
    pub tier: Tier,
    /// Result
    pub status: StepStatus,
    /// Time spent in milliseconds
    pub duration_ms: u64,
}

/// Report for one scenario execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Scenario group
    pub group: String,
    /// Terminal outcome
    pub outcome: ScenarioOutcome,
    /// Steps in execution order
    pub steps: Vec<StepLogEntry>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
}

impl ScenarioReport {
    /// Failure detail, if the scenario failed
    #[must_use]
    pub const fn failure(&self) -> Option<&ScenarioFailure> {
        match &self.outcome {
            ScenarioOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Total duration
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Report for a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Base URL scenarios ran against
    pub base_url: String,
    /// Scenario reports in declaration order
    pub scenarios: Vec<ScenarioReport>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    /// Create an empty report for a new run
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            base_url: base_url.into(),
            scenarios: Vec::new(),
            duration_ms: 0,
        }
    }

    /// True when no scenario failed
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.scenarios.iter().all(|s| s.outcome.is_passed())
    }

    /// Number of scenarios that passed without skips
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::Passed))
    }

    /// Number of scenarios that passed with skips
    #[must_use]
    pub fn passed_with_skips_count(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::PassedWithSkips(_)))
    }

    /// Number of failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(ScenarioOutcome::is_failed)
    }

    fn count(&self, pred: impl Fn(&ScenarioOutcome) -> bool) -> usize {
        self.scenarios.iter().filter(|s| pred(&s.outcome)).count()
    }

    /// Failed scenarios
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|s| s.outcome.is_failed())
    }

    /// Report for a scenario by name
    #[must_use]
    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Total duration
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> TolerarResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
