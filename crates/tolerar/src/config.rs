//! Runner configuration: base URL and timeout bounds.
//!
//! Values come from builder calls, or from `TOLERAR_*` environment variables
//! via [`RunnerConfig::from_env`]. Nothing else is configurable; the site
//! under test decides everything else.

use crate::locator::{DEFAULT_OPTIONAL_TIMEOUT_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{TolerarError, TolerarResult};
use crate::wait::{
    WaitOptions, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, NETWORK_IDLE_THRESHOLD_MS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default site under test
pub const DEFAULT_BASE_URL: &str = "https://demowebshop.tricentis.com/";

/// Default navigation bound (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Environment variable for the base URL
pub const ENV_BASE_URL: &str = "TOLERAR_BASE_URL";
/// Environment variable for the settle bound
pub const ENV_IDLE_TIMEOUT_MS: &str = "TOLERAR_IDLE_TIMEOUT_MS";
/// Environment variable for the required-element bound
pub const ENV_ELEMENT_TIMEOUT_MS: &str = "TOLERAR_ELEMENT_TIMEOUT_MS";
/// Environment variable for the optional-probe bound
pub const ENV_OPTIONAL_TIMEOUT_MS: &str = "TOLERAR_OPTIONAL_TIMEOUT_MS";
/// Environment variable for the navigation bound
pub const ENV_NAVIGATION_TIMEOUT_MS: &str = "TOLERAR_NAVIGATION_TIMEOUT_MS";

/// Scenario runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Base URL scenario paths are joined onto
    pub base_url: String,
    /// Bound for the page to settle
    pub idle_timeout_ms: u64,
    /// Bound for required element resolution and assertions
    pub element_timeout_ms: u64,
    /// Bound for optional steps and branch probes
    pub optional_timeout_ms: u64,
    /// Bound for a navigation to commit
    pub navigation_timeout_ms: u64,
    /// Polling interval
    pub poll_interval_ms: u64,
    /// Quiet window for settlement
    pub quiet_window_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            element_timeout_ms: DEFAULT_TIMEOUT_MS,
            optional_timeout_ms: DEFAULT_OPTIONAL_TIMEOUT_MS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            quiet_window_ms: NETWORK_IDLE_THRESHOLD_MS,
        }
    }
}

impl RunnerConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TOLERAR_*` environment variables
    pub fn from_env() -> TolerarResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> TolerarResult<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            config.base_url = url;
        }
        let millis = |key: &str, default: u64| -> TolerarResult<u64> {
            lookup(key).map_or(Ok(default), |raw| {
                raw.trim().parse().map_err(|_| TolerarError::Config {
                    message: format!("{key} must be a number of milliseconds, got {raw:?}"),
                })
            })
        };
        config.idle_timeout_ms = millis(ENV_IDLE_TIMEOUT_MS, config.idle_timeout_ms)?;
        config.element_timeout_ms = millis(ENV_ELEMENT_TIMEOUT_MS, config.element_timeout_ms)?;
        config.optional_timeout_ms = millis(ENV_OPTIONAL_TIMEOUT_MS, config.optional_timeout_ms)?;
        config.navigation_timeout_ms =
            millis(ENV_NAVIGATION_TIMEOUT_MS, config.navigation_timeout_ms)?;
        config.validate()?;
        Ok(config)
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set settle bound
    #[must_use]
    pub const fn with_idle_timeout(mut self, ms: u64) -> Self {
        self.idle_timeout_ms = ms;
        self
    }

    /// Set required-element bound
    #[must_use]
    pub const fn with_element_timeout(mut self, ms: u64) -> Self {
        self.element_timeout_ms = ms;
        self
    }

    /// Set optional-probe bound
    #[must_use]
    pub const fn with_optional_timeout(mut self, ms: u64) -> Self {
        self.optional_timeout_ms = ms;
        self
    }

    /// Set navigation bound
    #[must_use]
    pub const fn with_navigation_timeout(mut self, ms: u64) -> Self {
        self.navigation_timeout_ms = ms;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set settle quiet window
    #[must_use]
    pub const fn with_quiet_window(mut self, ms: u64) -> Self {
        self.quiet_window_ms = ms;
        self
    }

    /// Reject configurations that can never work
    pub fn validate(&self) -> TolerarResult<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(TolerarError::Config {
                message: format!("base URL must be http(s), got {:?}", self.base_url),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(TolerarError::Config {
                message: "poll interval must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Join a scenario path onto the base URL; absolute URLs pass through
    #[must_use]
    pub fn resolve_url(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            target.trim_start_matches('/')
        )
    }

    /// Settle options derived from this config
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.idle_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
            quiet_window_ms: self.quiet_window_ms,
        }
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.idle_timeout_ms, 10_000);
        assert_eq!(config.element_timeout_ms, 5_000);
        assert_eq!(config.optional_timeout_ms, 1_000);
        assert_eq!(config.navigation_timeout_ms, 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = RunnerConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://localhost:8080"),
            (ENV_ELEMENT_TIMEOUT_MS, " 2500 "),
            (ENV_OPTIONAL_TIMEOUT_MS, "300"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.element_timeout_ms, 2500);
        assert_eq!(config.optional_timeout_ms, 300);
        assert_eq!(config.idle_timeout_ms, DEFAULT_IDLE_TIMEOUT_MS);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = RunnerConfig::from_lookup(lookup(&[(ENV_IDLE_TIMEOUT_MS, "soon")])).unwrap_err();
        assert!(err.to_string().contains(ENV_IDLE_TIMEOUT_MS));
    }

    #[test]
    fn test_rejects_non_http_base() {
        let err = RunnerConfig::from_lookup(lookup(&[(ENV_BASE_URL, "ftp://x")])).unwrap_err();
        assert!(matches!(err, TolerarError::Config { .. }));
    }

    #[test]
    fn test_resolve_url() {
        let config = RunnerConfig::new().with_base_url("https://shop.test/");
        assert_eq!(config.resolve_url("/login"), "https://shop.test/login");
        assert_eq!(config.resolve_url("cart"), "https://shop.test/cart");
        assert_eq!(config.resolve_url("/"), "https://shop.test/");
        assert_eq!(
            config.resolve_url("https://other.test/x"),
            "https://other.test/x"
        );
    }

    #[test]
    fn test_wait_options() {
        let config = RunnerConfig::new().with_idle_timeout(42).with_quiet_window(7);
        let options = config.wait_options();
        assert_eq!(options.timeout_ms, 42);
        assert_eq!(options.quiet_window_ms, 7);
    }
}
