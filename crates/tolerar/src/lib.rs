//! Tolerar: resilient UI scenario runner.
//!
//! Tolerar (Spanish: "to tolerate") drives end-to-end scenarios against a
//! live storefront whose markup drifts between releases. Scenarios are
//! written against *candidate sets* of selectors rather than one exact
//! selector, and against *families* of acceptable outcomes rather than one
//! exact string.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    TOLERAR Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Scenario   │    │ PageDriver │            │
//! │   │ (catalog / │───►│ Runner     │───►│ CDP / mock │            │
//! │   │  YAML)     │    │ + Suite    │    │ (session)  │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │          │                 │                                    │
//! │          ▼                 ▼                                    │
//! │   ┌────────────┐    ┌────────────┐                              │
//! │   │ Locators   │    │ Reports    │                              │
//! │   │ Matchers   │    │ (JSON)     │                              │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each scenario gets its own browser session, so a failed scenario never
//! leaks cookies or cart contents into the next one.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod assertion;
#[cfg(feature = "browser")]
pub mod browser;
pub mod catalog;
pub mod config;
pub mod driver;
pub mod locator;
pub mod mock;
pub mod report;
mod result;
pub mod runner;
pub mod scenario;
pub mod suite;
pub mod unique;
pub mod wait;

pub use result::{TolerarError, TolerarResult};

/// Everything needed to write and run scenarios
pub mod prelude {
    pub use super::assertion::{
        Comparison, Expectation, Matcher, Observation, ObservedValue, Operand, PatternSet,
        SoftAssertions,
    };
    #[cfg(feature = "browser")]
    pub use super::browser::{CdpDriver, CdpDriverFactory};
    pub use super::config::RunnerConfig;
    pub use super::driver::{DriverConfig, DriverFactory, ElementHandle, OptionChoice, PageDriver};
    pub use super::locator::{CandidateSet, Selector};
    pub use super::report::{
        FailureKind, RunReport, ScenarioFailure, ScenarioOutcome, ScenarioReport, SkipRecord,
        StepLogEntry, StepStatus,
    };
    pub use super::runner::{ScenarioRunner, ScenarioState};
    pub use super::scenario::builder::StepBuilder;
    pub use super::scenario::{InputValue, Scenario, Step, StepPath, Tier};
    pub use super::suite::{Selection, Suite};
    pub use super::unique::unique_email;
    pub use super::wait::WaitOptions;
    pub use super::{TolerarError, TolerarResult};
}
