//! Locator candidate sets and first-visible resolution.
//!
//! A logical UI element ("search box", "add to cart button") is described by
//! an ordered list of selectors. Markup on the site under test drifts, so each
//! candidate is a different way of finding the same thing.
//!
//! # Resolution rule
//!
//! - Candidates are tried left to right
//! - Within a candidate, elements are tried in document order
//! - The first element that is present AND visible wins
//!
//! Resolution over a [`DocumentSnapshot`] is a pure function, so the same
//! candidate list against the same document always yields the same element.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::driver::ElementHandle;

/// Default timeout for required element resolution (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default timeout for probing optional affordances (1 second)
pub const DEFAULT_OPTIONAL_TIMEOUT_MS: u64 = 1000;

/// Default polling interval while waiting for a candidate (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SelectorRepr", into = "SelectorRepr")]
pub enum Selector {
    /// CSS selector (e.g., "input.qty-input")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Text content selector (deepest elements containing the text, ignoring case)
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// CSS selector filtered by contained text, like `:has-text()`
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match, ignoring case
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a CSS selector filtered by text (`a:has-text("Intel")`)
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// JavaScript expression evaluating to an array of every matching element,
    /// in document order
    #[must_use]
    pub fn to_query_all(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({}))", js_str(s)),
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) {{ out.push(r.snapshotItem(i)); }} \
                 return out; }})()",
                js_str(s)
            ),
            Self::Text(t) => format!(
                "Array.from(document.querySelectorAll('body *')).filter(el => \
                 el.textContent.toLowerCase().includes({t}) && \
                 !Array.from(el.children).some(c => c.textContent.toLowerCase().includes({t})))",
                t = js_str(&t.to_lowercase())
            ),
            Self::TestId(id) => format!(
                "Array.from(document.querySelectorAll({}))",
                js_str(&format!("[data-testid=\"{id}\"]"))
            ),
            Self::CssWithText { css, text } => format!(
                "Array.from(document.querySelectorAll({})).filter(el => \
                 el.textContent.toLowerCase().includes({}))",
                js_str(css),
                js_str(&text.to_lowercase())
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::TestId(id) => write!(f, "testid={id}"),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text({text:?})"),
        }
    }
}

impl From<&str> for Selector {
    fn from(css: &str) -> Self {
        Self::css(css)
    }
}

/// Quote a string as a JavaScript string literal
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Serialized form: a bare string is CSS, otherwise a tagged map
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SelectorRepr {
    Plain(String),
    Tagged(TaggedSelector),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedSelector {
    Css(String),
    Xpath(String),
    Text(String),
    TestId(String),
    CssWithText { css: String, text: String },
}

impl From<SelectorRepr> for Selector {
    fn from(repr: SelectorRepr) -> Self {
        match repr {
            SelectorRepr::Plain(s) | SelectorRepr::Tagged(TaggedSelector::Css(s)) => Self::Css(s),
            SelectorRepr::Tagged(TaggedSelector::Xpath(s)) => Self::XPath(s),
            SelectorRepr::Tagged(TaggedSelector::Text(s)) => Self::Text(s),
            SelectorRepr::Tagged(TaggedSelector::TestId(s)) => Self::TestId(s),
            SelectorRepr::Tagged(TaggedSelector::CssWithText { css, text }) => {
                Self::CssWithText { css, text }
            }
        }
    }
}

impl From<Selector> for SelectorRepr {
    fn from(selector: Selector) -> Self {
        match selector {
            Selector::Css(s) => Self::Plain(s),
            Selector::XPath(s) => Self::Tagged(TaggedSelector::Xpath(s)),
            Selector::Text(s) => Self::Tagged(TaggedSelector::Text(s)),
            Selector::TestId(s) => Self::Tagged(TaggedSelector::TestId(s)),
            Selector::CssWithText { css, text } => {
                Self::Tagged(TaggedSelector::CssWithText { css, text })
            }
        }
    }
}

/// An ordered list of ways to find one logical UI element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    /// Human-readable element name used in reports
    pub name: String,
    /// Selectors in priority order
    pub candidates: Vec<Selector>,
}

impl CandidateSet {
    /// Create an empty candidate set
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candidates: Vec::new(),
        }
    }

    /// Candidate set from CSS selectors, highest priority first
    #[must_use]
    pub fn css(name: impl Into<String>, selectors: &[&str]) -> Self {
        Self {
            name: name.into(),
            candidates: selectors.iter().map(|s| Selector::css(*s)).collect(),
        }
    }

    /// Append a fallback selector
    #[must_use]
    pub fn or(mut self, selector: Selector) -> Self {
        self.candidates.push(selector);
        self
    }

    /// Append a fallback CSS selector
    #[must_use]
    pub fn or_css(self, selector: impl Into<String>) -> Self {
        self.or(Selector::css(selector))
    }

    /// Candidate selectors rendered for diagnostics
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.candidates.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for CandidateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.describe().join(" | "))
    }
}

/// The elements each selector matched at one instant.
#[derive(Debug, Clone, Default)]
pub struct DocumentSnapshot {
    matches: HashMap<Selector, Vec<ElementHandle>>,
}

impl DocumentSnapshot {
    /// Create an empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record what a selector matched, in document order
    pub fn insert(&mut self, selector: Selector, elements: Vec<ElementHandle>) {
        let _ = self.matches.insert(selector, elements);
    }

    /// Elements matched by a selector (empty when never queried)
    #[must_use]
    pub fn matched(&self, selector: &Selector) -> &[ElementHandle] {
        self.matches.get(selector).map_or(&[], Vec::as_slice)
    }
}

/// Return the first present and visible element, left-to-right priority.
#[must_use]
pub fn resolve_first_visible<'a>(
    snapshot: &'a DocumentSnapshot,
    set: &CandidateSet,
) -> Option<&'a ElementHandle> {
    set.candidates
        .iter()
        .flat_map(|selector| snapshot.matched(selector))
        .find(|element| element.visible)
}

/// Number of elements matched by the first candidate that matches anything.
///
/// Candidates are alternatives for the same element, so their matches are
/// never summed.
#[must_use]
pub fn count_present(snapshot: &DocumentSnapshot, set: &CandidateSet) -> usize {
    set.candidates
        .iter()
        .map(|selector| snapshot.matched(selector).len())
        .find(|count| *count > 0)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(selector: &Selector, index: usize, visible: bool) -> ElementHandle {
        ElementHandle::new(selector.clone(), index, "input").with_visible(visible)
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_query_all() {
            let query = Selector::css("input[name=\"q\"]").to_query_all();
            assert!(query.contains("querySelectorAll"));
            assert!(query.contains(r#""input[name=\"q\"]""#));
        }

        #[test]
        fn test_test_id_query_all() {
            let query = Selector::test_id("score").to_query_all();
            assert!(query.contains("data-testid"));
            assert!(query.contains("score"));
        }

        #[test]
        fn test_text_query_all_prefers_deepest() {
            let query = Selector::text("Log in").to_query_all();
            assert!(query.contains("textContent.toLowerCase().includes(\"log in\")"));
            assert!(query.contains("children"));
        }

        #[test]
        fn test_xpath_query_all() {
            let query = Selector::XPath("//h1".into()).to_query_all();
            assert!(query.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
            assert!(query.contains("snapshotItem"));
        }

        #[test]
        fn test_css_with_text_query_all() {
            let query = Selector::css_with_text("a", "Intel").to_query_all();
            assert!(query.contains("filter"));
            assert!(query.contains("toLowerCase().includes(\"intel\")"));
            assert!(!query.contains("Intel"));
        }

        #[test]
        fn test_display() {
            assert_eq!(Selector::css("h1").to_string(), "h1");
            assert_eq!(
                Selector::css_with_text("a", "Books").to_string(),
                "a:has-text(\"Books\")"
            );
        }

        #[test]
        fn test_yaml_plain_string_is_css() {
            let selector: Selector = serde_yaml_ng::from_str("\"#small-searchterms\"").unwrap();
            assert_eq!(selector, Selector::css("#small-searchterms"));
        }

        #[test]
        fn test_yaml_tagged_selector() {
            let selector: Selector =
                crate::scenario::from_yaml("css_with_text: { css: a, text: Books }").unwrap();
            assert_eq!(selector, Selector::css_with_text("a", "Books"));
        }
    }

    mod resolution_tests {
        use super::*;

        fn search_box() -> CandidateSet {
            CandidateSet::css("search box", &["#small-searchterms", "input[name=\"q\"]"])
        }

        #[test]
        fn test_first_candidate_wins_when_visible() {
            let set = search_box();
            let mut snapshot = DocumentSnapshot::new();
            snapshot.insert(set.candidates[0].clone(), vec![handle(&set.candidates[0], 0, true)]);
            snapshot.insert(set.candidates[1].clone(), vec![handle(&set.candidates[1], 0, true)]);

            let resolved = resolve_first_visible(&snapshot, &set).unwrap();
            assert_eq!(resolved.selector, set.candidates[0]);
        }

        #[test]
        fn test_falls_back_when_first_is_hidden() {
            let set = search_box();
            let mut snapshot = DocumentSnapshot::new();
            snapshot.insert(set.candidates[0].clone(), vec![handle(&set.candidates[0], 0, false)]);
            snapshot.insert(set.candidates[1].clone(), vec![handle(&set.candidates[1], 0, true)]);

            let resolved = resolve_first_visible(&snapshot, &set).unwrap();
            assert_eq!(resolved.selector, set.candidates[1]);
        }

        #[test]
        fn test_document_order_within_candidate() {
            let set = CandidateSet::css("rows", &[".cart-item-row"]);
            let mut snapshot = DocumentSnapshot::new();
            snapshot.insert(
                set.candidates[0].clone(),
                vec![
                    handle(&set.candidates[0], 0, false),
                    handle(&set.candidates[0], 1, true),
                    handle(&set.candidates[0], 2, true),
                ],
            );

            assert_eq!(resolve_first_visible(&snapshot, &set).unwrap().index, 1);
        }

        #[test]
        fn test_none_when_nothing_visible() {
            let set = search_box();
            let mut snapshot = DocumentSnapshot::new();
            snapshot.insert(set.candidates[0].clone(), vec![handle(&set.candidates[0], 0, false)]);
            assert!(resolve_first_visible(&snapshot, &set).is_none());
        }

        #[test]
        fn test_empty_candidate_set_resolves_nothing() {
            let snapshot = DocumentSnapshot::new();
            assert!(resolve_first_visible(&snapshot, &CandidateSet::new("nothing")).is_none());
        }

        #[test]
        fn test_count_uses_first_matching_candidate() {
            let set = CandidateSet::css("cart rows", &[".cart-item", "tr.cart-item-row"]);
            let mut snapshot = DocumentSnapshot::new();
            snapshot.insert(set.candidates[0].clone(), vec![]);
            snapshot.insert(
                set.candidates[1].clone(),
                vec![
                    handle(&set.candidates[1], 0, true),
                    handle(&set.candidates[1], 1, true),
                ],
            );
            assert_eq!(count_present(&snapshot, &set), 2);
        }

        #[test]
        fn test_candidate_set_display() {
            let set = search_box();
            assert_eq!(
                set.to_string(),
                "search box [#small-searchterms | input[name=\"q\"]]"
            );
        }
    }

    mod determinism_properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_resolution_is_deterministic_and_leftmost(
                visibility in proptest::collection::vec(
                    proptest::collection::vec(any::<bool>(), 0..4), 1..5)
            ) {
                let mut set = CandidateSet::new("element");
                let mut snapshot = DocumentSnapshot::new();
                for (i, row) in visibility.iter().enumerate() {
                    let selector = Selector::css(format!("#c{i}"));
                    set = set.or(selector.clone());
                    let elements = row
                        .iter()
                        .enumerate()
                        .map(|(j, v)| handle(&selector, j, *v))
                        .collect();
                    snapshot.insert(selector, elements);
                }

                let first = resolve_first_visible(&snapshot, &set).cloned();
                let second = resolve_first_visible(&snapshot, &set).cloned();
                prop_assert_eq!(first.clone(), second);

                let expected = visibility.iter().enumerate().find_map(|(i, row)| {
                    row.iter().position(|v| *v).map(|j| (i, j))
                });
                prop_assert_eq!(
                    first.map(|h| (h.selector.clone(), h.index)),
                    expected.map(|(i, j)| (Selector::css(format!("#c{i}")), j))
                );
            }
        }
    }
}
