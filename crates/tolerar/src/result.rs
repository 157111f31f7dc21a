//! Result and error types for Tolerar.

use thiserror::Error;

/// Result type for Tolerar operations
pub type TolerarResult<T> = Result<T, TolerarError>;

/// Errors that can occur in Tolerar
#[derive(Debug, Error)]
pub enum TolerarError {
    /// No locator candidate resolved to a visible element within the wait bound
    #[error("Element '{element}' not found after {waited_ms}ms (tried: {})", candidates.join(" | "))]
    ElementNotFound {
        /// Logical element name
        element: String,
        /// Selectors that were attempted, in priority order
        candidates: Vec<String>,
        /// Time spent waiting
        waited_ms: u64,
    },

    /// Observed state did not satisfy the tolerant matcher
    #[error("Assertion mismatch: expected {expected}, observed {observed}")]
    AssertionMismatch {
        /// Description of the accepted family of values
        expected: String,
        /// What was actually observed
        observed: String,
    },

    /// An optional UI affordance is not present (recorded, never propagated)
    #[error("Optional affordance '{element}' is absent")]
    OptionalAffordanceAbsent {
        /// Logical element name
        element: String,
    },

    /// Page failed to reach a ready state within the bound
    #[error("Page at {url} did not settle within {ms}ms")]
    NavigationTimeout {
        /// URL being loaded (or current URL when settling after an action)
        url: String,
        /// Bound in milliseconds
        ms: u64,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Driver-level failure (CDP or mock)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// An action on a resolved element failed
    #[error("{action} on '{element}' failed: {message}")]
    ActionFailed {
        /// Action name (click, fill, ...)
        action: String,
        /// Logical element or selector
        element: String,
        /// Error message
        message: String,
    },

    /// Invalid state error (operation called in wrong state)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// A matcher pattern failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl TolerarError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an assertion mismatch
    #[must_use]
    pub fn mismatch(expected: impl Into<String>, observed: impl Into<String>) -> Self {
        Self::AssertionMismatch {
            expected: expected.into(),
            observed: observed.into(),
        }
    }

    /// Whether this error means "the thing was not there"
    #[must_use]
    pub const fn is_absence(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::OptionalAffordanceAbsent { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_found_lists_candidates() {
        let err = TolerarError::ElementNotFound {
            element: "search box".to_string(),
            candidates: vec!["#small-searchterms".to_string(), "input[name=\"q\"]".to_string()],
            waited_ms: 5000,
        };
        let msg = err.to_string();
        assert!(msg.contains("search box"));
        assert!(msg.contains("#small-searchterms | input[name=\"q\"]"));
        assert!(msg.contains("5000ms"));
    }

    #[test]
    fn test_mismatch_carries_both_sides() {
        let err = TolerarError::mismatch("url matching /login", "https://x/cart");
        let msg = err.to_string();
        assert!(msg.contains("/login"));
        assert!(msg.contains("https://x/cart"));
    }

    #[test]
    fn test_is_absence() {
        assert!(TolerarError::OptionalAffordanceAbsent {
            element: "suggestions".into()
        }
        .is_absence());
        assert!(!TolerarError::driver("boom").is_absence());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TolerarError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
