//! Tolerant outcome assertions.
//!
//! The site under test varies its copy and markup, so assertions accept a
//! *family* of values (any-of regex sets, substrings, numeric comparisons)
//! rather than one literal. Presence stays strict: an absent subject never
//! satisfies a matcher.
//!
//! Evaluation here is pure. The runner observes the page, turns what it saw
//! into an [`ObservedValue`], and asks the [`Matcher`] for a verdict.

pub mod soft;

pub use soft::{AssertionFailure, SoftAssertions};

use crate::locator::CandidateSet;
use crate::result::{TolerarError, TolerarResult};
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Values captured during one scenario execution
pub type Variables = HashMap<String, ObservedValue>;

// =============================================================================
// PATTERN SET
// =============================================================================

/// Any-of set of regular expressions.
///
/// Accepts a single pattern or a list when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PatternSource", into = "Vec<String>")]
pub struct PatternSet {
    patterns: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternSource {
    One(String),
    Many(Vec<String>),
}

impl From<PatternSource> for PatternSet {
    fn from(source: PatternSource) -> Self {
        match source {
            PatternSource::One(p) => Self { patterns: vec![p] },
            PatternSource::Many(patterns) => Self { patterns },
        }
    }
}

impl From<PatternSet> for Vec<String> {
    fn from(set: PatternSet) -> Self {
        set.patterns
    }
}

impl PatternSet {
    /// Create a pattern set
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a pattern set where every pattern ignores case
    #[must_use]
    pub fn case_insensitive<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| format!("(?i){}", p.into()))
                .collect(),
        }
    }

    /// Raw pattern sources
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check every pattern compiles
    pub fn validate(&self) -> TolerarResult<()> {
        for pattern in &self.patterns {
            let _ = Regex::new(pattern).map_err(|e| TolerarError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Whether any pattern matches the text
    pub fn is_match(&self, text: &str) -> TolerarResult<bool> {
        if self.patterns.is_empty() {
            return Ok(false);
        }
        self.validate()?;
        let set = RegexSet::new(&self.patterns).map_err(|e| TolerarError::InvalidPattern {
            pattern: self.patterns.join(" | "),
            message: e.to_string(),
        })?;
        Ok(set.is_match(text))
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.patterns.iter().map(|p| format!("/{p}/")).collect();
        write!(f, "{}", rendered.join(" or "))
    }
}

// =============================================================================
// OBSERVATIONS
// =============================================================================

/// What an expectation looks at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observation {
    /// Current page URL
    Url,
    /// Visible text of the whole body
    BodyText,
    /// Text of the first visible element
    Text(CandidateSet),
    /// Value of the first visible form control
    Value(CandidateSet),
    /// Number of elements matched (absent counts as zero)
    Count(CandidateSet),
    /// Whether an element is visible (absent counts as not visible)
    Visible(CandidateSet),
    /// Checked state of the first visible checkbox or radio
    Checked(CandidateSet),
    /// A value captured earlier in the scenario
    Variable(String),
}

impl Observation {
    /// Candidate set this observation resolves, if any
    #[must_use]
    pub const fn candidates(&self) -> Option<&CandidateSet> {
        match self {
            Self::Text(set)
            | Self::Value(set)
            | Self::Count(set)
            | Self::Visible(set)
            | Self::Checked(set) => Some(set),
            Self::Url | Self::BodyText | Self::Variable(_) => None,
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => write!(f, "url"),
            Self::BodyText => write!(f, "body text"),
            Self::Text(set) => write!(f, "text of {}", set.name),
            Self::Value(set) => write!(f, "value of {}", set.name),
            Self::Count(set) => write!(f, "count of {}", set.name),
            Self::Visible(set) => write!(f, "visibility of {}", set.name),
            Self::Checked(set) => write!(f, "checked state of {}", set.name),
            Self::Variable(key) => write!(f, "captured `{key}`"),
        }
    }
}

/// A value read from the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservedValue {
    /// Text content, URL, or form value
    Text(String),
    /// Count or parsed number
    Number(f64),
    /// Visibility or checked state
    Bool(bool),
    /// Subject was not on the page
    Absent,
}

impl ObservedValue {
    /// Numeric reading: numbers as-is, first number found in text
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(t) => parse_number(t),
            Self::Bool(_) | Self::Absent => None,
        }
    }
}

impl fmt::Display for ObservedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(t) => write!(f, "{:?}", truncate(t, 120)),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Absent => write!(f, "<absent>"),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(max_chars).collect();
        format!("{head}…")
    }
}

fn number_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"-?\d{1,3}(?:,\d{3})+(?:\.\d+)?|-?\d+(?:\.\d+)?").ok())
        .as_ref()
}

/// First number appearing in text, thousands separators removed.
///
/// `"Shopping cart (3)"` reads as 3, `"1,590.00"` as 1590.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let found = number_pattern()?.find(text)?;
    found.as_str().replace(',', "").parse().ok()
}

// =============================================================================
// MATCHERS
// =============================================================================

/// Numeric comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `==`
    Eq,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `!=`
    Ne,
}

impl Comparison {
    /// Apply the comparison
    #[must_use]
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Eq => (lhs - rhs).abs() < f64::EPSILON,
            Self::Ge => lhs >= rhs,
            Self::Gt => lhs > rhs,
            Self::Ne => (lhs - rhs).abs() >= f64::EPSILON,
        }
    }

    const fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Ne => "!=",
        }
    }
}

/// Right-hand side of a numeric comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// Fixed number
    Literal(f64),
    /// Number captured earlier in the scenario
    Variable(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(n) => write!(f, "{n}"),
            Self::Variable(key) => write!(f, "captured `{key}`"),
        }
    }
}

/// Predicate over an observed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// Any pattern matches
    Matches(PatternSet),
    /// No pattern matches
    NotMatches(PatternSet),
    /// Substring
    Contains(String),
    /// Exact equality after trimming
    Equals(String),
    /// Boolean true (visible, checked)
    IsTrue,
    /// Boolean false (hidden or absent, unchecked)
    IsFalse,
    /// Numeric comparison against a literal or captured value
    Compare {
        /// Operator
        op: Comparison,
        /// Right-hand side
        operand: Operand,
    },
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matches(set) => write!(f, "matching {set}"),
            Self::NotMatches(set) => write!(f, "not matching {set}"),
            Self::Contains(s) => write!(f, "containing {s:?}"),
            Self::Equals(s) => write!(f, "equal to {s:?}"),
            Self::IsTrue => write!(f, "true"),
            Self::IsFalse => write!(f, "false"),
            Self::Compare { op, operand } => write!(f, "{} {operand}", op.symbol()),
        }
    }
}

impl Matcher {
    /// Check an observed value.
    ///
    /// Returns [`TolerarError::AssertionMismatch`] when the value is outside
    /// the accepted family.
    pub fn check(&self, observed: &ObservedValue, vars: &Variables) -> TolerarResult<()> {
        let expected = || self.to_string();
        let mismatch = || Err(TolerarError::mismatch(expected(), observed.to_string()));

        if matches!(observed, ObservedValue::Absent) {
            return mismatch();
        }

        let holds = match self {
            Self::Matches(set) => set.is_match(&text_of(observed))?,
            Self::NotMatches(set) => !set.is_match(&text_of(observed))?,
            Self::Contains(needle) => text_of(observed).contains(needle.as_str()),
            Self::Equals(value) => text_of(observed).trim() == value.trim(),
            Self::IsTrue => matches!(observed, ObservedValue::Bool(true)),
            Self::IsFalse => matches!(observed, ObservedValue::Bool(false)),
            Self::Compare { op, operand } => {
                let rhs = match operand {
                    Operand::Literal(n) => *n,
                    Operand::Variable(key) => {
                        let captured = vars.get(key).ok_or_else(|| TolerarError::InvalidState {
                            message: format!("variable `{key}` was never captured"),
                        })?;
                        match captured.as_number() {
                            Some(n) => n,
                            None => {
                                return Err(TolerarError::mismatch(
                                    expected(),
                                    format!("captured `{key}` = {captured} is not numeric"),
                                ))
                            }
                        }
                    }
                };
                observed.as_number().is_some_and(|lhs| op.holds(lhs, rhs))
            }
        };

        if holds {
            Ok(())
        } else {
            mismatch()
        }
    }
}

fn text_of(observed: &ObservedValue) -> String {
    match observed {
        ObservedValue::Text(t) => t.clone(),
        ObservedValue::Number(n) => n.to_string(),
        ObservedValue::Bool(b) => b.to_string(),
        ObservedValue::Absent => String::new(),
    }
}

// =============================================================================
// EXPECTATION
// =============================================================================

/// An observation paired with the matcher it must satisfy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    /// What to look at
    pub subject: Observation,
    /// What it must satisfy
    pub matcher: Matcher,
}

impl Expectation {
    /// Create an expectation
    #[must_use]
    pub const fn new(subject: Observation, matcher: Matcher) -> Self {
        Self { subject, matcher }
    }

    /// URL matches any pattern
    #[must_use]
    pub fn url_matches(patterns: PatternSet) -> Self {
        Self::new(Observation::Url, Matcher::Matches(patterns))
    }

    /// URL contains a substring
    #[must_use]
    pub fn url_contains(fragment: impl Into<String>) -> Self {
        Self::new(Observation::Url, Matcher::Contains(fragment.into()))
    }

    /// Body text matches any pattern
    #[must_use]
    pub fn body_matches(patterns: PatternSet) -> Self {
        Self::new(Observation::BodyText, Matcher::Matches(patterns))
    }

    /// Element text matches any pattern
    #[must_use]
    pub fn text_matches(set: CandidateSet, patterns: PatternSet) -> Self {
        Self::new(Observation::Text(set), Matcher::Matches(patterns))
    }

    /// Element text contains a substring
    #[must_use]
    pub fn text_contains(set: CandidateSet, fragment: impl Into<String>) -> Self {
        Self::new(Observation::Text(set), Matcher::Contains(fragment.into()))
    }

    /// Form control value equals
    #[must_use]
    pub fn value_equals(set: CandidateSet, value: impl Into<String>) -> Self {
        Self::new(Observation::Value(set), Matcher::Equals(value.into()))
    }

    /// Element is visible
    #[must_use]
    pub const fn visible(set: CandidateSet) -> Self {
        Self::new(Observation::Visible(set), Matcher::IsTrue)
    }

    /// Element is hidden or absent
    #[must_use]
    pub const fn hidden(set: CandidateSet) -> Self {
        Self::new(Observation::Visible(set), Matcher::IsFalse)
    }

    /// Checkbox state
    #[must_use]
    pub const fn checked(set: CandidateSet, checked: bool) -> Self {
        let matcher = if checked {
            Matcher::IsTrue
        } else {
            Matcher::IsFalse
        };
        Self::new(Observation::Checked(set), matcher)
    }

    /// Element count compared to a literal
    #[must_use]
    pub const fn count(set: CandidateSet, op: Comparison, n: f64) -> Self {
        Self::new(
            Observation::Count(set),
            Matcher::Compare {
                op,
                operand: Operand::Literal(n),
            },
        )
    }

    /// Number parsed from element text compared to a captured value
    #[must_use]
    pub fn number_vs_captured(set: CandidateSet, op: Comparison, key: impl Into<String>) -> Self {
        Self::new(
            Observation::Text(set),
            Matcher::Compare {
                op,
                operand: Operand::Variable(key.into()),
            },
        )
    }

    /// Check the matcher against a value the runner observed
    pub fn check(&self, observed: &ObservedValue, vars: &Variables) -> TolerarResult<()> {
        self.matcher.check(observed, vars)
    }

    /// Validate every pattern this expectation uses
    pub fn validate(&self) -> TolerarResult<()> {
        match &self.matcher {
            Matcher::Matches(set) | Matcher::NotMatches(set) => set.validate(),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.subject, self.matcher)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn no_vars() -> Variables {
        Variables::new()
    }

    mod pattern_set_tests {
        use super::*;

        #[test]
        fn test_any_of() {
            let set = PatternSet::new(["no products", "did not match"]);
            assert!(set.is_match("no products were found that matched your criteria").unwrap());
            assert!(set.is_match("Search did not match any products").unwrap());
            assert!(!set.is_match("Showing 3 products").unwrap());
        }

        #[test]
        fn test_case_insensitive() {
            let set = PatternSet::case_insensitive(["unsuccessful"]);
            assert!(set.is_match("Login was UNSUCCESSFUL. Please correct").unwrap());
        }

        #[test]
        fn test_empty_set_never_matches() {
            let set = PatternSet::new(Vec::<String>::new());
            assert!(!set.is_match("anything").unwrap());
        }

        #[test]
        fn test_invalid_pattern_reported() {
            let set = PatternSet::new(["ok", "(unclosed"]);
            match set.validate().unwrap_err() {
                TolerarError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
                other => panic!("unexpected: {other}"),
            }
        }

        #[test]
        fn test_deserialize_single_or_list() {
            let one: PatternSet = serde_yaml_ng::from_str("'/login'").unwrap();
            assert_eq!(one.patterns(), ["/login"]);
            let many: PatternSet = serde_yaml_ng::from_str("[a, b]").unwrap();
            assert_eq!(many.patterns().len(), 2);
        }

        #[test]
        fn test_display() {
            let set = PatternSet::new(["a", "b"]);
            assert_eq!(set.to_string(), "/a/ or /b/");
        }
    }

    mod number_tests {
        use super::*;

        #[test]
        fn test_parse_number() {
            assert_eq!(parse_number("Shopping cart (3)"), Some(3.0));
            assert_eq!(parse_number("1,590.00"), Some(1590.0));
            assert_eq!(parse_number("Price: 10.50"), Some(10.5));
            assert_eq!(parse_number("no digits"), None);
        }

        #[test]
        fn test_as_number() {
            assert_eq!(ObservedValue::Number(2.0).as_number(), Some(2.0));
            assert_eq!(ObservedValue::Text("(4)".into()).as_number(), Some(4.0));
            assert_eq!(ObservedValue::Bool(true).as_number(), None);
            assert_eq!(ObservedValue::Absent.as_number(), None);
        }
    }

    mod matcher_tests {
        use super::*;

        #[test]
        fn test_absent_never_satisfies() {
            for matcher in [
                Matcher::IsFalse,
                Matcher::NotMatches(PatternSet::new(["x"])),
                Matcher::Contains(String::new()),
            ] {
                let err = matcher.check(&ObservedValue::Absent, &no_vars()).unwrap_err();
                assert!(err.to_string().contains("<absent>"));
            }
        }

        #[test]
        fn test_matches_and_contains() {
            let text = ObservedValue::Text("https://shop.test/login?returnUrl=%2F".into());
            assert!(Matcher::Matches(PatternSet::new(["/login"]))
                .check(&text, &no_vars())
                .is_ok());
            assert!(Matcher::Contains("returnUrl".into()).check(&text, &no_vars()).is_ok());
            assert!(Matcher::Equals("x".into()).check(&text, &no_vars()).is_err());
        }

        #[test]
        fn test_bool_matchers() {
            assert!(Matcher::IsTrue.check(&ObservedValue::Bool(true), &no_vars()).is_ok());
            assert!(Matcher::IsTrue.check(&ObservedValue::Bool(false), &no_vars()).is_err());
            assert!(Matcher::IsFalse.check(&ObservedValue::Bool(false), &no_vars()).is_ok());
        }

        #[test]
        fn test_compare_literal() {
            let matcher = Matcher::Compare {
                op: Comparison::Ge,
                operand: Operand::Literal(1.0),
            };
            assert!(matcher.check(&ObservedValue::Number(1.0), &no_vars()).is_ok());
            assert!(matcher.check(&ObservedValue::Number(0.0), &no_vars()).is_err());
            assert!(matcher.check(&ObservedValue::Text("no number".into()), &no_vars()).is_err());
        }

        #[test]
        fn test_compare_captured() {
            let mut vars = no_vars();
            vars.insert("before".into(), ObservedValue::Text("Shopping cart (0)".into()));
            let matcher = Matcher::Compare {
                op: Comparison::Gt,
                operand: Operand::Variable("before".into()),
            };
            assert!(matcher.check(&ObservedValue::Text("(1)".into()), &vars).is_ok());
            let err = matcher.check(&ObservedValue::Text("(0)".into()), &vars).unwrap_err();
            match err {
                TolerarError::AssertionMismatch { expected, observed } => {
                    assert_eq!(expected, "> captured `before`");
                    assert!(observed.contains("(0)"));
                }
                other => panic!("unexpected: {other}"),
            }
        }

        #[test]
        fn test_compare_missing_variable_is_invalid_state() {
            let matcher = Matcher::Compare {
                op: Comparison::Gt,
                operand: Operand::Variable("never".into()),
            };
            let err = matcher.check(&ObservedValue::Number(1.0), &no_vars()).unwrap_err();
            assert!(matches!(err, TolerarError::InvalidState { .. }));
        }

        #[test]
        fn test_comparison_holds() {
            assert!(Comparison::Lt.holds(1.0, 2.0));
            assert!(Comparison::Le.holds(2.0, 2.0));
            assert!(Comparison::Eq.holds(2.0, 2.0));
            assert!(Comparison::Ne.holds(2.0, 3.0));
            assert!(!Comparison::Gt.holds(2.0, 2.0));
        }
    }

    mod expectation_tests {
        use super::*;

        #[test]
        fn test_display() {
            let exp = Expectation::url_matches(PatternSet::new(["/login"]));
            assert_eq!(exp.to_string(), "url matching //login/");
        }

        #[test]
        fn test_yaml_shape() {
            let yaml = r"
subject:
  text:
    name: cart quantity
    candidates: ['.cart-qty']
matcher:
  compare:
    op: gt
    operand:
      variable: before
";
            let exp: Expectation = crate::scenario::from_yaml(yaml).unwrap();
            assert!(matches!(exp.subject, Observation::Text(_)));
            assert_eq!(
                exp.matcher,
                Matcher::Compare {
                    op: Comparison::Gt,
                    operand: Operand::Variable("before".into())
                }
            );
        }

        #[test]
        fn test_validate() {
            let bad = Expectation::body_matches(PatternSet::new(["[z-a]"]));
            assert!(bad.validate().is_err());
            let good = Expectation::visible(CandidateSet::css("h1", &["h1"]));
            assert!(good.validate().is_ok());
        }
    }
}
