//! Fluent scenario construction.
//!
//! ```
//! use tolerar::prelude::*;
//!
//! let search = CandidateSet::css("search box", &["#small-searchterms", "input[name=\"q\"]"]);
//! let scenario = Scenario::builder("basic search", "search")
//!     .start("/")
//!     .fill("type a product name", search, "computer")
//!     .click("submit search", CandidateSet::css("search button", &["input.search-box-button"]))
//!     .expect("results are shown", Expectation::url_contains("/search"))
//!     .build();
//! assert_eq!(scenario.steps.len(), 3);
//! ```

use super::{Action, InputValue, Scenario, Step};
use crate::assertion::{Expectation, Observation};
use crate::driver::OptionChoice;
use crate::locator::CandidateSet;

/// Step-appending methods shared by scenario and nested step builders.
///
/// Plain methods add required steps; `try_*` methods add optional ones.
pub trait StepBuilder: Sized {
    /// Append a step
    #[must_use]
    fn step(self, step: Step) -> Self;

    /// Navigate to a path or URL
    #[must_use]
    fn navigate(self, description: &str, target: impl Into<String>) -> Self {
        self.step(Step::required(
            description,
            Action::Navigate {
                target: target.into(),
            },
        ))
    }

    /// Click an element
    #[must_use]
    fn click(self, description: &str, target: CandidateSet) -> Self {
        self.step(Step::required(description, Action::Click { target }))
    }

    /// Click an element if it is there
    #[must_use]
    fn try_click(self, description: &str, target: CandidateSet) -> Self {
        self.step(Step::optional(description, Action::Click { target }))
    }

    /// Fill a field
    #[must_use]
    fn fill(self, description: &str, target: CandidateSet, value: impl Into<InputValue>) -> Self {
        self.step(Step::required(
            description,
            Action::Fill {
                target,
                value: value.into(),
            },
        ))
    }

    /// Fill a field if it is there
    #[must_use]
    fn try_fill(
        self,
        description: &str,
        target: CandidateSet,
        value: impl Into<InputValue>,
    ) -> Self {
        self.step(Step::optional(
            description,
            Action::Fill {
                target,
                value: value.into(),
            },
        ))
    }

    /// Set a checkbox
    #[must_use]
    fn check(self, description: &str, target: CandidateSet, checked: bool) -> Self {
        self.step(Step::required(description, Action::Check { target, checked }))
    }

    /// Set a checkbox if it is there
    #[must_use]
    fn try_check(self, description: &str, target: CandidateSet, checked: bool) -> Self {
        self.step(Step::optional(description, Action::Check { target, checked }))
    }

    /// Choose a select option
    #[must_use]
    fn select(self, description: &str, target: CandidateSet, choice: OptionChoice) -> Self {
        self.step(Step::required(description, Action::Select { target, choice }))
    }

    /// Choose a select option if the select is there
    #[must_use]
    fn try_select(self, description: &str, target: CandidateSet, choice: OptionChoice) -> Self {
        self.step(Step::optional(description, Action::Select { target, choice }))
    }

    /// History back
    #[must_use]
    fn go_back(self, description: &str) -> Self {
        self.step(Step::required(description, Action::GoBack))
    }

    /// Wait for the page to settle
    #[must_use]
    fn wait_idle(self, description: &str) -> Self {
        self.step(Step::required(description, Action::WaitIdle))
    }

    /// Assert
    #[must_use]
    fn expect(self, description: &str, expectation: Expectation) -> Self {
        self.step(Step::required(description, Action::Expect(expectation)))
    }

    /// Assert, recording a skip instead of failing
    #[must_use]
    fn try_expect(self, description: &str, expectation: Expectation) -> Self {
        self.step(Step::optional(description, Action::Expect(expectation)))
    }

    /// Assert that at least one expectation holds
    #[must_use]
    fn expect_any(self, description: &str, expectations: Vec<Expectation>) -> Self {
        self.step(Step::required(description, Action::ExpectAny(expectations)))
    }

    /// Store an observed value
    #[must_use]
    fn capture(self, description: &str, key: &str, observation: Observation) -> Self {
        self.step(Step::required(
            description,
            Action::Capture {
                key: key.to_string(),
                observation,
            },
        ))
    }

    /// Store an observed value if it can be read
    #[must_use]
    fn try_capture(self, description: &str, key: &str, observation: Observation) -> Self {
        self.step(Step::optional(
            description,
            Action::Capture {
                key: key.to_string(),
                observation,
            },
        ))
    }

    /// Branch on whether an element is present
    #[must_use]
    fn branch(
        self,
        description: &str,
        probe: CandidateSet,
        present: impl FnOnce(Steps) -> Steps,
        absent: impl FnOnce(Steps) -> Steps,
    ) -> Self {
        self.step(Step::required(
            description,
            Action::Branch {
                probe,
                present: present(Steps::new()).into_steps(),
                absent: absent(Steps::new()).into_steps(),
            },
        ))
    }

    /// Run steps only when an element is present; otherwise record a skip
    #[must_use]
    fn when_present(
        self,
        description: &str,
        probe: CandidateSet,
        present: impl FnOnce(Steps) -> Steps,
    ) -> Self {
        self.branch(description, probe, present, |s| s)
    }

    /// Establish a precondition
    #[must_use]
    fn ensure(
        self,
        description: &str,
        check: Expectation,
        remedy: impl FnOnce(Steps) -> Steps,
    ) -> Self {
        self.step(Step::required(
            description,
            Action::Ensure {
                check,
                remedy: remedy(Steps::new()).into_steps(),
            },
        ))
    }
}

/// Builder for nested step lists
#[derive(Debug, Default)]
pub struct Steps {
    steps: Vec<Step>,
}

impl Steps {
    /// Create an empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish the list
    #[must_use]
    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

impl StepBuilder for Steps {
    fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}

/// Builder for [`Scenario`]
#[derive(Debug)]
pub struct ScenarioBuilder {
    name: String,
    group: String,
    start: String,
    steps: Vec<Step>,
}

impl ScenarioBuilder {
    /// Create a builder starting at `/`
    #[must_use]
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            start: "/".to_string(),
            steps: Vec::new(),
        }
    }

    /// Set the starting path or URL
    #[must_use]
    pub fn start(mut self, start: impl Into<String>) -> Self {
        self.start = start.into();
        self
    }

    /// Append a prepared list of steps
    #[must_use]
    pub fn steps(mut self, steps: Vec<Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Finish the scenario
    #[must_use]
    pub fn build(self) -> Scenario {
        Scenario {
            name: self.name,
            group: self.group,
            start: self.start,
            steps: self.steps,
        }
    }
}

impl StepBuilder for ScenarioBuilder {
    fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Tier;

    fn link() -> CandidateSet {
        CandidateSet::css("link", &["a.link"])
    }

    #[test]
    fn test_required_and_optional_tiers() {
        let scenario = ScenarioBuilder::new("tiers", "g")
            .click("required click", link())
            .try_click("optional click", link())
            .build();
        assert_eq!(scenario.steps[0].tier, Tier::Required);
        assert_eq!(scenario.steps[1].tier, Tier::Optional);
        assert_eq!(scenario.steps[1].description, "optional click");
    }

    #[test]
    fn test_declared_order_preserved() {
        let scenario = ScenarioBuilder::new("order", "g")
            .start("/books")
            .navigate("a", "/a")
            .go_back("b")
            .wait_idle("c")
            .build();
        let names: Vec<&str> = scenario.steps.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(scenario.start, "/books");
    }

    #[test]
    fn test_when_present_has_empty_absent_arm() {
        let scenario = ScenarioBuilder::new("branch", "g")
            .when_present("maybe", link(), |s| s.click("inner", link()))
            .build();
        match &scenario.steps[0].action {
            Action::Branch {
                present, absent, ..
            } => {
                assert_eq!(present.len(), 1);
                assert!(absent.is_empty());
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_ensure_nests_remedy() {
        let scenario = ScenarioBuilder::new("ensure", "g")
            .ensure("cart not empty", Expectation::url_contains("/cart"), |s| {
                s.navigate("open product", "/laptop").click("add", link())
            })
            .build();
        assert_eq!(scenario.step_count(), 3);
    }
}
