//! Suite orchestration.
//!
//! A [`Suite`] owns scenarios, narrows them with a [`Selection`], and runs
//! each one on a fresh session from a [`DriverFactory`]. Scenarios may run
//! concurrently; reports always come back in declaration order.

use crate::driver::{DriverFactory, PageDriver};
use crate::report::{
    FailureKind, RunReport, ScenarioFailure, ScenarioOutcome, ScenarioReport,
};
use crate::result::{TolerarError, TolerarResult};
use crate::runner::ScenarioRunner;
use crate::scenario::{Scenario, StepPath};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{info, warn};

/// Which scenarios to run
///
/// Empty selects everything. Otherwise a scenario is selected when its name
/// or its group is listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    names: Vec<String>,
    groups: Vec<String>,
}

impl Selection {
    /// Select every scenario
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Add scenario names
    #[must_use]
    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add groups
    #[must_use]
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Whether nothing was narrowed
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.names.is_empty() && self.groups.is_empty()
    }

    /// Whether a scenario is selected
    #[must_use]
    pub fn matches(&self, scenario: &Scenario) -> bool {
        self.is_all()
            || self.names.iter().any(|n| *n == scenario.name)
            || self.groups.iter().any(|g| *g == scenario.group)
    }
}

/// An ordered collection of scenarios
#[derive(Debug, Clone)]
pub struct Suite {
    scenarios: Vec<Scenario>,
    concurrency: usize,
}

impl Suite {
    /// Create a suite running one scenario at a time
    #[must_use]
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios,
            concurrency: 1,
        }
    }

    /// Set how many scenarios may run at once (at least one)
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Scenarios in declaration order
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Distinct groups in first-seen order
    #[must_use]
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for scenario in &self.scenarios {
            if !groups.contains(&scenario.group.as_str()) {
                groups.push(&scenario.group);
            }
        }
        groups
    }

    /// Selected scenarios in declaration order
    ///
    /// Fails when a requested name or group matches nothing.
    pub fn select(&self, selection: &Selection) -> TolerarResult<Vec<&Scenario>> {
        for name in &selection.names {
            if !self.scenarios.iter().any(|s| s.name == *name) {
                return Err(TolerarError::Config {
                    message: format!("unknown scenario '{name}'"),
                });
            }
        }
        for group in &selection.groups {
            if !self.scenarios.iter().any(|s| s.group == *group) {
                return Err(TolerarError::Config {
                    message: format!("unknown group '{group}'"),
                });
            }
        }
        Ok(self
            .scenarios
            .iter()
            .filter(|s| selection.matches(s))
            .collect())
    }

    /// Run the selected scenarios
    pub async fn run(
        &self,
        factory: &dyn DriverFactory,
        runner: &ScenarioRunner,
        selection: &Selection,
    ) -> TolerarResult<RunReport> {
        self.run_with_progress(factory, runner, selection, &|_| {})
            .await
    }

    /// Run the selected scenarios, calling `on_finished` as each completes
    pub async fn run_with_progress(
        &self,
        factory: &dyn DriverFactory,
        runner: &ScenarioRunner,
        selection: &Selection,
        on_finished: &(dyn Fn(&ScenarioReport) + Sync),
    ) -> TolerarResult<RunReport> {
        let selected = self.select(selection)?;
        let mut report = RunReport::new(runner.config().base_url.clone());
        let start = Instant::now();
        info!(
            run_id = %report.run_id,
            scenarios = selected.len(),
            concurrency = self.concurrency,
            "run started"
        );

        let runs = selected.into_iter().enumerate().map(|(index, scenario)| async move {
            let scenario_report = run_isolated(factory, runner, scenario).await;
            on_finished(&scenario_report);
            (index, scenario_report)
        });
        let mut finished: Vec<(usize, ScenarioReport)> = stream::iter(runs)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        finished.sort_by_key(|(index, _)| *index);

        report.scenarios = finished.into_iter().map(|(_, r)| r).collect();
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %report.run_id,
            passed = report.passed_count(),
            passed_with_skips = report.passed_with_skips_count(),
            failed = report.failed_count(),
            "run finished"
        );
        Ok(report)
    }
}

/// One scenario on its own session, closed afterwards
async fn run_isolated(
    factory: &dyn DriverFactory,
    runner: &ScenarioRunner,
    scenario: &Scenario,
) -> ScenarioReport {
    let start = Instant::now();
    let mut driver: Box<dyn PageDriver> = match factory.open_session().await {
        Ok(driver) => driver,
        Err(e) => {
            warn!(scenario = %scenario.name, error = %e, "could not open session");
            return ScenarioReport {
                name: scenario.name.clone(),
                group: scenario.group.clone(),
                outcome: ScenarioOutcome::Failed(ScenarioFailure {
                    step: StepPath::top(0),
                    description: "open session".to_string(),
                    kind: FailureKind::Driver,
                    detail: e.to_string(),
                }),
                steps: Vec::new(),
                duration_ms: start.elapsed().as_millis() as u64,
            };
        }
    };

    let report = runner.run(scenario, driver.as_mut()).await;
    if let Err(e) = driver.close().await {
        warn!(scenario = %scenario.name, error = %e, "session close failed");
    }
    report
}
