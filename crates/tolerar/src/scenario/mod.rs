//! Scenario model.
//!
//! A scenario is a starting URL plus an ordered list of steps. Each step has a
//! tier: required steps abort the scenario on failure, optional steps are
//! recorded as skipped and execution moves on.
//!
//! Scenarios are built in Rust with [`ScenarioBuilder`] or loaded from YAML:
//!
//! ```yaml
//! scenarios:
//!   - name: invalid login
//!     group: auth
//!     start: /login
//!     steps:
//!       - description: enter unknown email
//!         action:
//!           fill:
//!             target: { name: email, candidates: ["#Email"] }
//!             value: { literal: nobody@example.com }
//!       - description: submit
//!         action:
//!           click: { target: { name: log in, candidates: ["input.login-button"] } }
//!       - description: error summary shown
//!         action:
//!           expect:
//!             subject: { text: { name: errors, candidates: [".validation-summary-errors"] } }
//!             matcher: { matches: "(?i)unsuccessful" }
//! ```

pub mod builder;

pub use builder::{ScenarioBuilder, StepBuilder, Steps};

use crate::assertion::{Expectation, Observation, ObservedValue, Variables};
use crate::driver::OptionChoice;
use crate::locator::CandidateSet;
use crate::result::{TolerarError, TolerarResult};
use crate::unique::unique_email;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Step failure policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Failure aborts the scenario
    #[default]
    Required,
    /// Failure is recorded as a skip
    Optional,
}

/// Text typed into a form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputValue {
    /// Fixed text
    Literal(String),
    /// Text of a value captured earlier in the scenario
    Variable(String),
    /// A fresh `local+<millis>-<n>@domain` address per resolution
    UniqueEmail {
        /// Local part prefix
        local: String,
        /// Domain
        domain: String,
    },
}

impl InputValue {
    /// Literal text
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Uniquified email address
    #[must_use]
    pub fn unique_email(local: impl Into<String>, domain: impl Into<String>) -> Self {
        Self::UniqueEmail {
            local: local.into(),
            domain: domain.into(),
        }
    }

    /// Produce the concrete text to type
    pub fn resolve(&self, vars: &Variables) -> TolerarResult<String> {
        match self {
            Self::Literal(text) => Ok(text.clone()),
            Self::Variable(key) => match vars.get(key) {
                Some(ObservedValue::Text(text)) => Ok(text.clone()),
                Some(ObservedValue::Number(n)) => Ok(n.to_string()),
                Some(ObservedValue::Bool(b)) => Ok(b.to_string()),
                Some(ObservedValue::Absent) | None => Err(TolerarError::InvalidState {
                    message: format!("variable `{key}` has no value to type"),
                }),
            },
            Self::UniqueEmail { local, domain } => Ok(unique_email(local, domain)),
        }
    }
}

impl From<&str> for InputValue {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl From<String> for InputValue {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "{text:?}"),
            Self::Variable(key) => write!(f, "captured `{key}`"),
            Self::UniqueEmail { local, domain } => write!(f, "unique {local}+…@{domain}"),
        }
    }
}

/// What a step does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Go to a path relative to the base URL, or an absolute URL
    Navigate {
        /// Path or URL
        target: String,
    },
    /// Click the first visible candidate
    Click {
        /// Element to click
        target: CandidateSet,
    },
    /// Replace a form field's value
    Fill {
        /// Field
        target: CandidateSet,
        /// Text to type
        value: InputValue,
    },
    /// Set a checkbox or radio
    Check {
        /// Control
        target: CandidateSet,
        /// Desired state
        #[serde(default = "default_true")]
        checked: bool,
    },
    /// Choose a `<select>` option
    Select {
        /// Select element
        target: CandidateSet,
        /// Option to choose
        choice: OptionChoice,
    },
    /// History back
    GoBack,
    /// Wait for the page to settle
    WaitIdle,
    /// Evaluate one expectation
    Expect(Expectation),
    /// Pass when at least one expectation holds
    ExpectAny(Vec<Expectation>),
    /// Store an observed value under a key
    Capture {
        /// Variable name
        key: String,
        /// What to observe
        observation: Observation,
    },
    /// Run one of two step lists depending on whether an element is present
    Branch {
        /// Element probed with the short optional wait
        probe: CandidateSet,
        /// Steps when the probe resolves
        #[serde(default)]
        present: Vec<Step>,
        /// Steps when it does not; empty means "record a skip"
        #[serde(default)]
        absent: Vec<Step>,
    },
    /// Establish a precondition: run `remedy` when `check` fails, then re-check
    Ensure {
        /// Precondition
        check: Expectation,
        /// Steps that establish it
        remedy: Vec<Step>,
    },
}

const fn default_true() -> bool {
    true
}

impl Action {
    /// Short action name for logs and errors
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => "navigate",
            Self::Click { .. } => "click",
            Self::Fill { .. } => "fill",
            Self::Check { .. } => "check",
            Self::Select { .. } => "select",
            Self::GoBack => "go_back",
            Self::WaitIdle => "wait_idle",
            Self::Expect(_) => "expect",
            Self::ExpectAny(_) => "expect_any",
            Self::Capture { .. } => "capture",
            Self::Branch { .. } => "branch",
            Self::Ensure { .. } => "ensure",
        }
    }

    fn candidate_sets(&self) -> Vec<&CandidateSet> {
        match self {
            Self::Click { target }
            | Self::Fill { target, .. }
            | Self::Check { target, .. }
            | Self::Select { target, .. } => vec![target],
            Self::Branch { probe, .. } => vec![probe],
            Self::Expect(exp) | Self::Ensure { check: exp, .. } => {
                exp.subject.candidates().into_iter().collect()
            }
            Self::ExpectAny(exps) => exps.iter().filter_map(|e| e.subject.candidates()).collect(),
            Self::Capture { observation, .. } => observation.candidates().into_iter().collect(),
            Self::Navigate { .. } | Self::GoBack | Self::WaitIdle => Vec::new(),
        }
    }

    fn expectations(&self) -> Vec<&Expectation> {
        match self {
            Self::Expect(exp) | Self::Ensure { check: exp, .. } => vec![exp],
            Self::ExpectAny(exps) => exps.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Nested step lists (branch arms, remedies)
    #[must_use]
    pub fn children(&self) -> Vec<&[Step]> {
        match self {
            Self::Branch {
                present, absent, ..
            } => vec![present.as_slice(), absent.as_slice()],
            Self::Ensure { remedy, .. } => vec![remedy.as_slice()],
            _ => Vec::new(),
        }
    }
}

/// One step of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Human-readable description shown in reports
    pub description: String,
    /// Failure policy
    #[serde(default)]
    pub tier: Tier,
    /// What to do
    pub action: Action,
}

impl Step {
    /// Create a required step
    #[must_use]
    pub fn required(description: impl Into<String>, action: Action) -> Self {
        Self {
            description: description.into(),
            tier: Tier::Required,
            action,
        }
    }

    /// Create an optional step
    #[must_use]
    pub fn optional(description: impl Into<String>, action: Action) -> Self {
        Self {
            description: description.into(),
            tier: Tier::Optional,
            action,
        }
    }

    /// Whether failures are swallowed
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.tier == Tier::Optional
    }
}

/// Dotted position of a step, 1-based (`3.1.2`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct StepPath(Vec<usize>);

impl StepPath {
    /// Path of a top-level step
    #[must_use]
    pub fn top(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path of a nested step
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// Path segments
    #[must_use]
    pub fn segments(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for StepPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl From<StepPath> for String {
    fn from(path: StepPath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for StepPath {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .split('.')
            .map(str::parse)
            .collect::<Result<Vec<usize>, _>>()
            .map(Self)
    }
}

/// An end-to-end scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name
    pub name: String,
    /// Group (search, cart, ...)
    #[serde(default)]
    pub group: String,
    /// Starting path relative to the base URL, or absolute URL
    #[serde(default = "default_start")]
    pub start: String,
    /// Ordered steps
    pub steps: Vec<Step>,
}

fn default_start() -> String {
    "/".to_string()
}

impl Scenario {
    /// Start building a scenario
    #[must_use]
    pub fn builder(name: impl Into<String>, group: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder::new(name, group)
    }

    /// Total number of steps including nested ones
    #[must_use]
    pub fn step_count(&self) -> usize {
        fn count(steps: &[Step]) -> usize {
            steps
                .iter()
                .map(|s| 1 + s.action.children().into_iter().map(count).sum::<usize>())
                .sum()
        }
        count(&self.steps)
    }

    /// Check patterns compile and every element has at least one selector
    pub fn validate(&self) -> TolerarResult<()> {
        fn walk(scenario: &str, steps: &[Step], parent: Option<&StepPath>) -> TolerarResult<()> {
            for (i, step) in steps.iter().enumerate() {
                let path = parent.map_or_else(|| StepPath::top(i + 1), |p| p.child(i + 1));
                for set in step.action.candidate_sets() {
                    if set.candidates.is_empty() {
                        return Err(TolerarError::Config {
                            message: format!(
                                "scenario '{scenario}' step {path}: element '{}' has no selectors",
                                set.name
                            ),
                        });
                    }
                }
                for exp in step.action.expectations() {
                    exp.validate()?;
                }
                for child in step.action.children() {
                    walk(scenario, child, Some(&path))?;
                }
            }
            Ok(())
        }

        if self.name.trim().is_empty() {
            return Err(TolerarError::Config {
                message: "scenario name must not be empty".to_string(),
            });
        }
        walk(&self.name, &self.steps, None)
    }
}

/// Top-level shape of a scenario file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    /// Scenarios in declaration order
    pub scenarios: Vec<Scenario>,
}

/// Deserialize YAML where every enum is written as a single-key map
/// (`click: { target: ... }`) or, for unit variants, a bare string (`url`)
pub fn from_yaml<T: DeserializeOwned>(yaml: &str) -> TolerarResult<T> {
    let value = serde_yaml_ng::with::singleton_map_recursive::deserialize(
        serde_yaml_ng::Deserializer::from_str(yaml),
    )?;
    Ok(value)
}

/// Parse and validate scenarios from YAML text
pub fn parse_scenarios(yaml: &str) -> TolerarResult<Vec<Scenario>> {
    let file: ScenarioFile = from_yaml(yaml)?;
    let mut seen = HashSet::new();
    for scenario in &file.scenarios {
        scenario.validate()?;
        if !seen.insert(scenario.name.as_str()) {
            return Err(TolerarError::Config {
                message: format!("duplicate scenario name '{}'", scenario.name),
            });
        }
    }
    Ok(file.scenarios)
}

/// Load and validate scenarios from a YAML file
pub fn load_scenarios(path: impl AsRef<Path>) -> TolerarResult<Vec<Scenario>> {
    let text = std::fs::read_to_string(path)?;
    parse_scenarios(&text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::assertion::PatternSet;

    const LOGIN_YAML: &str = r##"
scenarios:
  - name: invalid login
    group: auth
    start: /login
    steps:
      - description: enter unknown email
        action:
          fill:
            target: { name: email, candidates: ["#Email"] }
            value: { literal: nobody@example.com }
      - description: tick remember me
        tier: optional
        action:
          check: { target: { name: remember me, candidates: ["#RememberMe"] } }
      - description: submit
        action:
          click: { target: { name: log in, candidates: ["input.login-button", "button[type=submit]"] } }
      - description: error summary shown
        action:
          expect:
            subject: { text: { name: errors, candidates: [".validation-summary-errors"] } }
            matcher: { matches: "(?i)unsuccessful" }
      - description: still on login page
        action:
          expect:
            subject: url
            matcher: { matches: ["/login"] }
"##;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_login_scenario() {
            let scenarios = parse_scenarios(LOGIN_YAML).unwrap();
            assert_eq!(scenarios.len(), 1);
            let s = &scenarios[0];
            assert_eq!(s.name, "invalid login");
            assert_eq!(s.start, "/login");
            assert_eq!(s.steps.len(), 5);
            assert_eq!(s.steps[1].tier, Tier::Optional);
            assert_eq!(
                s.steps[1].action,
                Action::Check {
                    target: CandidateSet::css("remember me", &["#RememberMe"]),
                    checked: true
                }
            );
            assert_eq!(s.steps[2].tier, Tier::Required);
        }

        #[test]
        fn test_enum_map_and_bare_string_forms() {
            let steps: Vec<Step> = from_yaml(
                r##"
- description: back
  action: go_back
- description: settle
  action: wait_idle
- description: pick sort order
  action:
    select:
      target: { name: sort, candidates: ["#products-orderby"] }
      choice: { label: Name A to Z }
- description: on search page
  action:
    expect: { subject: url, matcher: { contains: /search } }
"##,
            )
            .unwrap();
            assert_eq!(steps[0].action, Action::GoBack);
            assert_eq!(steps[1].action, Action::WaitIdle);
            assert!(matches!(
                &steps[2].action,
                Action::Select { choice: OptionChoice::Label(label), .. } if label == "Name A to Z"
            ));
            assert!(matches!(&steps[3].action, Action::Expect(e) if e.subject == Observation::Url));
        }

        #[test]
        fn test_invalid_pattern_rejected_at_load() {
            let yaml = LOGIN_YAML.replace("(?i)unsuccessful", "(unclosed");
            let err = parse_scenarios(&yaml).unwrap_err();
            assert!(matches!(err, TolerarError::InvalidPattern { .. }));
        }

        #[test]
        fn test_empty_candidates_rejected() {
            let yaml = LOGIN_YAML.replace(r##"["#Email"]"##, "[]");
            let err = parse_scenarios(&yaml).unwrap_err();
            assert!(err.to_string().contains("'email' has no selectors"));
        }

        #[test]
        fn test_duplicate_names_rejected() {
            let body = LOGIN_YAML.trim_start().trim_start_matches("scenarios:\n");
            let yaml = format!("scenarios:\n{body}{body}");
            let err = parse_scenarios(&yaml).unwrap_err();
            assert!(err.to_string().contains("duplicate"));
        }

        #[test]
        fn test_malformed_yaml() {
            let err = parse_scenarios("scenarios: [ {name: x").unwrap_err();
            assert!(matches!(err, TolerarError::Yaml(_)));
        }

        #[test]
        fn test_load_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("auth.yaml");
            std::fs::write(&path, LOGIN_YAML).unwrap();
            assert_eq!(load_scenarios(&path).unwrap().len(), 1);
            assert!(matches!(
                load_scenarios(dir.path().join("missing.yaml")),
                Err(TolerarError::Io(_))
            ));
        }
    }

    mod step_path_tests {
        use super::*;

        #[test]
        fn test_display_and_parse() {
            let path = StepPath::top(3).child(1).child(2);
            assert_eq!(path.to_string(), "3.1.2");
            assert_eq!(StepPath::try_from("3.1.2".to_string()).unwrap(), path);
            assert!(StepPath::try_from("3.x".to_string()).is_err());
        }
    }

    mod input_value_tests {
        use super::*;

        #[test]
        fn test_literal_and_variable() {
            let mut vars = Variables::new();
            vars.insert("sku".into(), ObservedValue::Text("14.1".into()));
            assert_eq!(InputValue::from("abc").resolve(&vars).unwrap(), "abc");
            assert_eq!(InputValue::Variable("sku".into()).resolve(&vars).unwrap(), "14.1");
            assert!(InputValue::Variable("nope".into()).resolve(&vars).is_err());
        }

        #[test]
        fn test_unique_email_resolves_fresh_each_time() {
            let value = InputValue::unique_email("testuser", "example.com");
            let vars = Variables::new();
            let a = value.resolve(&vars).unwrap();
            let b = value.resolve(&vars).unwrap();
            assert_ne!(a, b);
            assert!(a.starts_with("testuser+"));
            assert!(a.ends_with("@example.com"));
        }
    }

    mod scenario_tests {
        use super::*;

        #[test]
        fn test_step_count_includes_nested() {
            let scenario = Scenario {
                name: "n".into(),
                group: "g".into(),
                start: "/".into(),
                steps: vec![
                    Step::required("home", Action::Navigate { target: "/".into() }),
                    Step::required(
                        "branch",
                        Action::Branch {
                            probe: CandidateSet::css("x", &["#x"]),
                            present: vec![Step::required("w", Action::WaitIdle)],
                            absent: vec![Step::required("b", Action::GoBack)],
                        },
                    ),
                ],
            };
            assert_eq!(scenario.step_count(), 4);
            assert!(scenario.validate().is_ok());
        }

        #[test]
        fn test_nested_invalid_pattern_found() {
            let scenario = Scenario {
                name: "n".into(),
                group: String::new(),
                start: "/".into(),
                steps: vec![Step::required(
                    "ensure",
                    Action::Ensure {
                        check: Expectation::url_contains("/cart"),
                        remedy: vec![Step::required(
                            "bad",
                            Action::Expect(Expectation::body_matches(PatternSet::new(["("]))),
                        )],
                    },
                )],
            };
            assert!(matches!(
                scenario.validate(),
                Err(TolerarError::InvalidPattern { .. })
            ));
        }

        #[test]
        fn test_empty_name_rejected() {
            let scenario = Scenario {
                name: " ".into(),
                group: String::new(),
                start: "/".into(),
                steps: Vec::new(),
            };
            assert!(scenario.validate().is_err());
        }
    }
}
