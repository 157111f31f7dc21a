//! Soft assertions.
//!
//! Collect several expectation verdicts without stopping at the first
//! mismatch. Used for any-of checks (`ExpectAny`), where one satisfied
//! alternative is enough but a failure must list every alternative tried.

use crate::result::{TolerarError, TolerarResult};
use serde::{Deserialize, Serialize};

/// A single assertion failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionFailure {
    /// What was checked
    pub label: String,
    /// Why it failed
    pub message: String,
    /// Index of this assertion in the sequence
    pub index: usize,
}

impl AssertionFailure {
    /// Create a new assertion failure
    #[must_use]
    pub fn new(label: impl Into<String>, message: impl Into<String>, index: usize) -> Self {
        Self {
            label: label.into(),
            message: message.into(),
            index,
        }
    }
}

/// Soft assertions collector
///
/// ```
/// use tolerar::assertion::SoftAssertions;
/// use tolerar::TolerarError;
///
/// let mut soft = SoftAssertions::new();
/// soft.record("url", Err(TolerarError::mismatch("/login", "/cart")));
/// soft.record("body", Ok(()));
/// assert!(soft.verify_any().is_ok());
/// assert!(soft.verify_all().is_err());
/// ```
#[derive(Debug, Default)]
pub struct SoftAssertions {
    failures: Vec<AssertionFailure>,
    assertion_count: usize,
}

impl SoftAssertions {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one verdict
    pub fn record(&mut self, label: impl Into<String>, verdict: TolerarResult<()>) {
        let index = self.assertion_count;
        self.assertion_count += 1;
        if let Err(e) = verdict {
            self.failures
                .push(AssertionFailure::new(label, describe(&e), index));
        }
    }

    /// Failures recorded so far
    #[must_use]
    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    /// Number of verdicts recorded
    #[must_use]
    pub const fn assertion_count(&self) -> usize {
        self.assertion_count
    }

    /// Whether every verdict passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether at least one verdict passed
    #[must_use]
    pub fn any_passed(&self) -> bool {
        self.failures.len() < self.assertion_count
    }

    /// Pass when at least one verdict passed
    pub fn verify_any(&self) -> TolerarResult<()> {
        if self.any_passed() {
            Ok(())
        } else {
            Err(self.combined("any of"))
        }
    }

    /// Pass when every verdict passed
    pub fn verify_all(&self) -> TolerarResult<()> {
        if self.all_passed() {
            Ok(())
        } else {
            Err(self.combined("all of"))
        }
    }

    fn combined(&self, quantifier: &str) -> TolerarError {
        let expected: Vec<&str> = self.failures.iter().map(|f| f.label.as_str()).collect();
        let observed: Vec<String> = self
            .failures
            .iter()
            .map(|f| format!("[{}] {}", f.index + 1, f.message))
            .collect();
        TolerarError::mismatch(
            format!("{quantifier}: {}", expected.join("; ")),
            observed.join("; "),
        )
    }
}

fn describe(error: &TolerarError) -> String {
    match error {
        TolerarError::AssertionMismatch { observed, .. } => format!("observed {observed}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collector() {
        let soft = SoftAssertions::new();
        assert!(soft.all_passed());
        assert!(!soft.any_passed());
        assert!(soft.verify_any().is_err());
        assert!(soft.verify_all().is_ok());
    }

    #[test]
    fn test_any_passes_with_one_success() {
        let mut soft = SoftAssertions::new();
        soft.record("redirected to cart", Err(TolerarError::mismatch("/cart", "/laptop")));
        soft.record("notification shown", Ok(()));
        assert_eq!(soft.assertion_count(), 2);
        assert_eq!(soft.failures().len(), 1);
        assert!(soft.verify_any().is_ok());
    }

    #[test]
    fn test_any_failure_lists_every_alternative() {
        let mut soft = SoftAssertions::new();
        soft.record("url matching /cart", Err(TolerarError::mismatch("/cart", "\"/laptop\"")));
        soft.record("count > 0", Err(TolerarError::driver("detached")));
        let err = soft.verify_any().unwrap_err();
        match err {
            TolerarError::AssertionMismatch { expected, observed } => {
                assert_eq!(expected, "any of: url matching /cart; count > 0");
                assert!(observed.contains("[1] observed \"/laptop\""));
                assert!(observed.contains("[2] Driver error: detached"));
            }
            other => panic!("unexpected: {other}"),
        }
    }
}
