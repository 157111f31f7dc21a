//! Resilient scenario runner.
//!
//! Executes one scenario against one isolated session:
//!
//! ```text
//!  NotStarted ──► Navigating ──► Running(step) ──► Passed
//!                     │              │  ▲     ├──► PartiallySkipped
//!                     │              └──┘     └──► Failed
//!                     └──────────────────────────► Failed
//! ```
//!
//! Steps run strictly in declared order. A required step that cannot locate
//! its element, act, or satisfy its matcher fails the scenario with the step
//! path and detail. An optional step that fails is recorded as a skip and the
//! scenario continues. Nothing is retried at scenario level.

use crate::assertion::{Expectation, Observation, ObservedValue, SoftAssertions, Variables};
use crate::config::RunnerConfig;
use crate::driver::{ElementHandle, PageDriver};
use crate::locator::{count_present, resolve_first_visible, CandidateSet, DocumentSnapshot};
use crate::report::{
    ScenarioFailure, ScenarioOutcome, ScenarioReport, SkipRecord, StepLogEntry, StepStatus,
};
use crate::result::{TolerarError, TolerarResult};
use crate::scenario::{Action, Scenario, Step, StepPath, Tier};
use crate::wait;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

/// Skip reason for an optional element that never showed up
pub const AFFORDANCE_ABSENT: &str = "skipped — affordance absent";

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Lifecycle of one scenario execution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScenarioState {
    /// Created, nothing done yet
    #[default]
    NotStarted,
    /// Loading the starting URL
    Navigating,
    /// Executing a step
    Running(StepPath),
    /// Every step ran
    Passed,
    /// A required step failed
    Failed,
    /// Required steps ran, some optional ones were skipped
    PartiallySkipped,
}

impl ScenarioState {
    /// Whether no further transitions are allowed
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::PartiallySkipped)
    }

    /// Whether `next` is a legal successor
    #[must_use]
    pub const fn can_transition_to(&self, next: &Self) -> bool {
        match self {
            Self::NotStarted => matches!(next, Self::Navigating),
            Self::Navigating => matches!(next, Self::Running(_) | Self::Passed | Self::Failed),
            Self::Running(_) => matches!(
                next,
                Self::Running(_) | Self::Passed | Self::Failed | Self::PartiallySkipped
            ),
            Self::Passed | Self::Failed | Self::PartiallySkipped => false,
        }
    }

    /// Move to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: Self) -> TolerarResult<()> {
        if !self.can_transition_to(&next) {
            return Err(TolerarError::InvalidState {
                message: format!("cannot move from {self:?} to {next:?}"),
            });
        }
        *self = next;
        Ok(())
    }
}

// =============================================================================
// RUNNER
// =============================================================================

/// Runs scenarios one at a time against a session it is handed
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    /// Create a runner
    #[must_use]
    pub const fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Runner configuration
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Execute a scenario to a terminal outcome.
    ///
    /// Never returns an error: every failure ends up in the report.
    #[instrument(skip_all, fields(scenario = %scenario.name, group = %scenario.group))]
    pub async fn run(&self, scenario: &Scenario, driver: &mut dyn PageDriver) -> ScenarioReport {
        let started = Instant::now();
        let mut execution = Execution::new(&self.config, driver);
        let outcome = execution.run(scenario).await;

        match &outcome {
            ScenarioOutcome::Passed => info!("passed"),
            ScenarioOutcome::PassedWithSkips(skips) => {
                info!(skipped = skips.len(), "passed with skips");
            }
            ScenarioOutcome::Failed(failure) => {
                info!(step = %failure.step, detail = %failure.detail, "failed");
            }
        }

        ScenarioReport {
            name: scenario.name.clone(),
            group: scenario.group.clone(),
            outcome,
            steps: execution.log,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

// =============================================================================
// EXECUTION
// =============================================================================

enum StepEffect {
    Done,
    Skipped(String),
}

enum StepError {
    Failed(TolerarError),
    Nested(ScenarioFailure),
}

impl From<TolerarError> for StepError {
    fn from(error: TolerarError) -> Self {
        Self::Failed(error)
    }
}

struct Execution<'a> {
    config: &'a RunnerConfig,
    driver: &'a mut dyn PageDriver,
    state: ScenarioState,
    vars: Variables,
    skips: Vec<SkipRecord>,
    log: Vec<StepLogEntry>,
    settled: bool,
}

impl<'a> Execution<'a> {
    fn new(config: &'a RunnerConfig, driver: &'a mut dyn PageDriver) -> Self {
        Self {
            config,
            driver,
            state: ScenarioState::NotStarted,
            vars: Variables::new(),
            skips: Vec::new(),
            log: Vec::new(),
            settled: false,
        }
    }

    async fn run(&mut self, scenario: &Scenario) -> ScenarioOutcome {
        let opening = StepPath::top(0);
        let open_description = format!("open {}", scenario.start);

        let result = match self.state.transition(ScenarioState::Navigating) {
            Err(e) => Err(ScenarioFailure::from_error(opening, &open_description, &e)),
            Ok(()) => match scenario.validate() {
                Err(e) => Err(ScenarioFailure::from_error(opening, "validate scenario", &e)),
                Ok(()) => match self.navigate(&scenario.start).await {
                    Err(e) => Err(ScenarioFailure::from_error(opening, &open_description, &e)),
                    Ok(()) => self.run_steps(&scenario.steps, None).await,
                },
            },
        };

        let (next, outcome) = match result {
            Ok(()) if self.skips.is_empty() => (ScenarioState::Passed, ScenarioOutcome::Passed),
            Ok(()) => (
                ScenarioState::PartiallySkipped,
                ScenarioOutcome::PassedWithSkips(self.skips.clone()),
            ),
            Err(failure) => (ScenarioState::Failed, ScenarioOutcome::Failed(failure)),
        };

        if let Err(e) = self.state.transition(next) {
            return ScenarioOutcome::Failed(ScenarioFailure::from_error(
                StepPath::top(0),
                "finish scenario",
                &e,
            ));
        }
        outcome
    }

    fn run_steps<'s>(
        &'s mut self,
        steps: &'s [Step],
        parent: Option<StepPath>,
    ) -> BoxFuture<'s, Result<(), ScenarioFailure>>
    where
        'a: 's,
    {
        async move {
            for (i, step) in steps.iter().enumerate() {
                let path = parent
                    .as_ref()
                    .map_or_else(|| StepPath::top(i + 1), |p| p.child(i + 1));

                if let Err(e) = self.state.transition(ScenarioState::Running(path.clone())) {
                    return Err(ScenarioFailure::from_error(path, &step.description, &e));
                }

                debug!(step = %path, action = step.action.name(), tier = ?step.tier, "{}", step.description);
                let slot = self.log.len();
                let started = Instant::now();

                let (status, result) = match self.execute(step, &path).await {
                    Ok(StepEffect::Done) => (StepStatus::Done, Ok(())),
                    Ok(StepEffect::Skipped(reason)) => {
                        self.skip(&path, step, reason);
                        (StepStatus::Skipped, Ok(()))
                    }
                    Err(error) if step.is_optional() => {
                        let reason = match error {
                            StepError::Failed(e) => skip_reason(&e),
                            StepError::Nested(failure) => failure.to_string(),
                        };
                        self.skip(&path, step, reason);
                        (StepStatus::Skipped, Ok(()))
                    }
                    Err(StepError::Failed(e)) => (
                        StepStatus::Failed,
                        Err(ScenarioFailure::from_error(path.clone(), &step.description, &e)),
                    ),
                    Err(StepError::Nested(failure)) => (StepStatus::Failed, Err(failure)),
                };

                self.log.insert(
                    slot,
                    StepLogEntry {
                        step: path,
                        description: step.description.clone(),
                        action: step.action.name().to_string(),
                        tier: step.tier,
                        status,
                        duration_ms: started.elapsed().as_millis() as u64,
                    },
                );
                result?;
            }
            Ok(())
        }
        .boxed()
    }

    fn skip(&mut self, path: &StepPath, step: &Step, reason: String) {
        warn!(step = %path, reason = %reason, "skipped optional step: {}", step.description);
        self.skips.push(SkipRecord {
            step: path.clone(),
            description: step.description.clone(),
            reason,
        });
    }

    async fn execute(&mut self, step: &Step, path: &StepPath) -> Result<StepEffect, StepError> {
        let tier = step.tier;
        let action_ms = self.config.navigation_timeout_ms;

        match &step.action {
            Action::Navigate { target } => self.navigate(target).await?,
            Action::Click { target } => {
                let element = self.locate(target, tier).await?;
                bounded(action_ms, "click", &target.name, self.driver.click(&element)).await?;
                self.settled = false;
                self.settle().await?;
            }
            Action::Fill { target, value } => {
                let element = self.locate(target, tier).await?;
                let text = value.resolve(&self.vars)?;
                trace!(element = %target.name, value = %text, "fill");
                bounded(action_ms, "fill", &target.name, self.driver.fill(&element, &text))
                    .await?;
                self.settled = false;
            }
            Action::Check { target, checked } => {
                let element = self.locate(target, tier).await?;
                bounded(
                    action_ms,
                    "check",
                    &target.name,
                    self.driver.set_checked(&element, *checked),
                )
                .await?;
                self.settled = false;
            }
            Action::Select { target, choice } => {
                let element = self.locate(target, tier).await?;
                bounded(
                    action_ms,
                    "select",
                    &target.name,
                    self.driver.select_option(&element, choice),
                )
                .await?;
                self.settled = false;
                self.settle().await?;
            }
            Action::GoBack => {
                bounded(action_ms, "go_back", "history", self.driver.go_back()).await?;
                self.settled = false;
                self.settle().await?;
            }
            Action::WaitIdle => self.settle().await?,
            Action::Expect(expectation) => {
                self.check_until(expectation, self.timeout_for(tier)).await?;
            }
            Action::ExpectAny(expectations) => {
                self.check_any_until(expectations, self.timeout_for(tier)).await?;
            }
            Action::Capture { key, observation } => {
                let value = self.observe_present(observation, tier).await?;
                debug!(key = %key, value = %value, "captured");
                self.vars.insert(key.clone(), value);
            }
            Action::Branch {
                probe,
                present,
                absent,
            } => {
                if self.probe(probe).await?.is_some() {
                    debug!(element = %probe.name, "branch: present");
                    self.run_steps(present, Some(path.clone()))
                        .await
                        .map_err(StepError::Nested)?;
                } else if absent.is_empty() {
                    return Ok(StepEffect::Skipped(absence_reason(&probe.name)));
                } else {
                    debug!(element = %probe.name, "branch: absent");
                    self.run_steps(absent, Some(path.clone()))
                        .await
                        .map_err(StepError::Nested)?;
                }
            }
            Action::Ensure { check, remedy } => {
                if self
                    .check_until(check, self.config.optional_timeout_ms)
                    .await
                    .is_err()
                {
                    debug!(check = %check, "precondition not met; running remedy");
                    self.run_steps(remedy, Some(path.clone()))
                        .await
                        .map_err(StepError::Nested)?;
                    self.check_until(check, self.config.element_timeout_ms)
                        .await?;
                }
            }
        }
        Ok(StepEffect::Done)
    }

    const fn timeout_for(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Required => self.config.element_timeout_ms,
            Tier::Optional => self.config.optional_timeout_ms,
        }
    }

    async fn navigate(&mut self, target: &str) -> TolerarResult<()> {
        let url = self.config.resolve_url(target);
        let ms = self.config.navigation_timeout_ms;
        debug!(url = %url, "navigate");
        tokio::time::timeout(Duration::from_millis(ms), self.driver.navigate(&url))
            .await
            .map_err(|_| TolerarError::NavigationTimeout {
                url: url.clone(),
                ms,
            })??;
        self.settled = false;
        self.settle().await
    }

    async fn settle(&mut self) -> TolerarResult<()> {
        let _ = wait::settle(&*self.driver, &self.config.wait_options()).await?;
        self.settled = true;
        Ok(())
    }

    async fn settle_if_needed(&mut self) -> TolerarResult<()> {
        if self.settled {
            Ok(())
        } else {
            self.settle().await
        }
    }

    /// Poll until the first visible candidate appears or the tier's bound expires
    async fn locate(&mut self, set: &CandidateSet, tier: Tier) -> TolerarResult<ElementHandle> {
        self.settle_if_needed().await?;
        let timeout_ms = self.timeout_for(tier);
        let start = Instant::now();
        let deadline = start + Duration::from_millis(timeout_ms);

        loop {
            match self.driver.snapshot(&set.candidates).await {
                Ok(snapshot) => {
                    if let Some(element) = resolve_first_visible(&snapshot, set) {
                        trace!(element = %set.name, selector = %element.selector, "resolved");
                        return Ok(element.clone());
                    }
                }
                Err(e) => debug!(element = %set.name, error = %e, "snapshot failed; retrying"),
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(self.config.poll_interval().min(deadline - now)).await;
        }

        Err(match tier {
            Tier::Required => TolerarError::ElementNotFound {
                element: set.name.clone(),
                candidates: set.describe(),
                waited_ms: start.elapsed().as_millis() as u64,
            },
            Tier::Optional => TolerarError::OptionalAffordanceAbsent {
                element: set.name.clone(),
            },
        })
    }

    /// Short optional wait; `None` when the element is absent
    async fn probe(&mut self, set: &CandidateSet) -> TolerarResult<Option<ElementHandle>> {
        match self.locate(set, Tier::Optional).await {
            Ok(element) => Ok(Some(element)),
            Err(TolerarError::OptionalAffordanceAbsent { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Snapshot a candidate set and resolve its first visible element
    async fn first_visible(
        &self,
        set: &CandidateSet,
    ) -> TolerarResult<(Option<ElementHandle>, DocumentSnapshot)> {
        let snapshot = self.driver.snapshot(&set.candidates).await?;
        let element = resolve_first_visible(&snapshot, set).cloned();
        Ok((element, snapshot))
    }

    /// Read the current value of an observation (single shot)
    async fn observe(&self, subject: &Observation) -> TolerarResult<ObservedValue> {
        Ok(match subject {
            Observation::Url => ObservedValue::Text(self.driver.current_url().await?),
            Observation::BodyText => ObservedValue::Text(self.driver.body_text().await?),
            Observation::Text(set) => self
                .first_visible(set)
                .await?
                .0
                .map_or(ObservedValue::Absent, |e| ObservedValue::Text(e.text().to_string())),
            Observation::Value(set) => self
                .first_visible(set)
                .await?
                .0
                .map_or(ObservedValue::Absent, |e| {
                    ObservedValue::Text(e.value.unwrap_or_default())
                }),
            Observation::Count(set) => {
                let (_, snapshot) = self.first_visible(set).await?;
                ObservedValue::Number(count_present(&snapshot, set) as f64)
            }
            Observation::Visible(set) => {
                ObservedValue::Bool(self.first_visible(set).await?.0.is_some())
            }
            Observation::Checked(set) => self
                .first_visible(set)
                .await?
                .0
                .and_then(|e| e.checked)
                .map_or(ObservedValue::Absent, ObservedValue::Bool),
            Observation::Variable(key) => {
                self.vars.get(key).cloned().unwrap_or(ObservedValue::Absent)
            }
        })
    }

    /// Re-evaluate an expectation until it holds or `timeout_ms` expires
    async fn check_until(
        &mut self,
        expectation: &Expectation,
        timeout_ms: u64,
    ) -> TolerarResult<()> {
        self.settle_if_needed().await?;
        let start = Instant::now();
        let deadline = start + Duration::from_millis(timeout_ms);
        loop {
            let verdict = match self.observe(&expectation.subject).await {
                Ok(observed) => expectation.check(&observed, &self.vars),
                Err(e) => Err(e),
            };
            match verdict {
                Ok(()) => return Ok(()),
                Err(e @ (TolerarError::InvalidPattern { .. } | TolerarError::InvalidState { .. })) => {
                    return Err(e)
                }
                Err(e) => {
                    let now = Instant::now();
                    if now >= deadline {
                        let not_found = self.unresolved(&expectation.subject, start).await;
                        return Err(not_found.unwrap_or(e));
                    }
                    trace!(expectation = %expectation, error = %e, "not yet satisfied");
                    tokio::time::sleep(self.config.poll_interval().min(deadline - now)).await;
                }
            }
        }
    }

    /// `ElementNotFound` when the subject's element never resolved
    async fn unresolved(&self, subject: &Observation, start: Instant) -> Option<TolerarError> {
        let set = match subject {
            Observation::Text(set)
            | Observation::Value(set)
            | Observation::Visible(set)
            | Observation::Checked(set) => set,
            Observation::Url
            | Observation::BodyText
            | Observation::Count(_)
            | Observation::Variable(_) => return None,
        };
        match self.first_visible(set).await {
            Ok((None, _)) => Some(TolerarError::ElementNotFound {
                element: set.name.clone(),
                candidates: set.describe(),
                waited_ms: start.elapsed().as_millis() as u64,
            }),
            _ => None,
        }
    }

    /// Re-evaluate alternatives until one holds; failure lists every alternative
    async fn check_any_until(
        &mut self,
        expectations: &[Expectation],
        timeout_ms: u64,
    ) -> TolerarResult<()> {
        self.settle_if_needed().await?;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let mut soft = SoftAssertions::new();
            for expectation in expectations {
                let verdict = match self.observe(&expectation.subject).await {
                    Ok(observed) => expectation.check(&observed, &self.vars),
                    Err(e) => Err(e),
                };
                soft.record(expectation.to_string(), verdict);
            }
            let now = Instant::now();
            if soft.any_passed() || now >= deadline {
                return soft.verify_any();
            }
            tokio::time::sleep(self.config.poll_interval().min(deadline - now)).await;
        }
    }

    /// Poll until the observation yields something other than "absent"
    async fn observe_present(
        &mut self,
        observation: &Observation,
        tier: Tier,
    ) -> TolerarResult<ObservedValue> {
        self.settle_if_needed().await?;
        let start = Instant::now();
        let deadline = start + Duration::from_millis(self.timeout_for(tier));
        loop {
            match self.observe(observation).await {
                Ok(ObservedValue::Absent) => {}
                Ok(value) => return Ok(value),
                Err(e) => debug!(observation = %observation, error = %e, "observe failed; retrying"),
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(self.config.poll_interval().min(deadline - now)).await;
        }

        Err(match (observation.candidates(), tier) {
            (Some(set), Tier::Required) => TolerarError::ElementNotFound {
                element: set.name.clone(),
                candidates: set.describe(),
                waited_ms: start.elapsed().as_millis() as u64,
            },
            (Some(set), Tier::Optional) => TolerarError::OptionalAffordanceAbsent {
                element: set.name.clone(),
            },
            (None, _) => TolerarError::InvalidState {
                message: format!("{observation} has no value"),
            },
        })
    }
}

async fn bounded<T>(
    ms: u64,
    action: &str,
    element: &str,
    fut: impl Future<Output = TolerarResult<T>> + Send,
) -> TolerarResult<T> {
    tokio::time::timeout(Duration::from_millis(ms), fut)
        .await
        .map_err(|_| TolerarError::ActionFailed {
            action: action.to_string(),
            element: element.to_string(),
            message: format!("did not complete within {ms}ms"),
        })?
}

fn absence_reason(element: &str) -> String {
    format!("{AFFORDANCE_ABSENT} ({element})")
}

fn skip_reason(error: &TolerarError) -> String {
    match error {
        TolerarError::OptionalAffordanceAbsent { element }
        | TolerarError::ElementNotFound { element, .. } => absence_reason(element),
        other => other.to_string(),
    }
}
