//! Settle waiting.
//!
//! Before every locate and every assertion the runner waits for the page to
//! settle: the document reports `complete` and the (URL, resource count) pair
//! stays unchanged for a quiet window. This replaces fixed sleeps; it is the
//! only waiting primitive scenario authors see (`WaitIdle`).

use crate::driver::PageDriver;
use crate::result::{TolerarError, TolerarResult};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default bound for a page to settle (10 seconds)
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Network idle threshold (500ms without new requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for settle waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// How long readiness must hold unchanged
    pub quiet_window_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            quiet_window_ms: NETWORK_IDLE_THRESHOLD_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set the quiet window in milliseconds
    #[must_use]
    pub const fn with_quiet_window(mut self, quiet_window_ms: u64) -> Self {
        self.quiet_window_ms = quiet_window_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get quiet window as Duration
    #[must_use]
    pub const fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.quiet_window_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful settle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// URL the page settled on
    pub url: String,
}

// =============================================================================
// SETTLE
// =============================================================================

/// Wait until the page is complete and quiet.
///
/// Readiness probe errors (mid-navigation contexts, detached frames) count as
/// "not settled yet". Exceeding the bound yields
/// [`TolerarError::NavigationTimeout`] carrying the last URL seen.
pub async fn settle(driver: &dyn PageDriver, options: &WaitOptions) -> TolerarResult<WaitResult> {
    let start = Instant::now();
    let deadline = start + options.timeout();
    let mut last_url = String::new();
    let mut stable: Option<((String, u64), Instant)> = None;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, driver.readiness()).await {
            Ok(Ok(readiness)) => {
                last_url.clone_from(&readiness.url);
                if readiness.document_complete {
                    let key = (readiness.url, readiness.resource_count);
                    match &stable {
                        Some((seen, since)) if *seen == key => {
                            if since.elapsed() >= options.quiet_window() {
                                trace!(url = %last_url, "page settled");
                                return Ok(WaitResult {
                                    elapsed: start.elapsed(),
                                    url: last_url,
                                });
                            }
                        }
                        _ => stable = Some((key, Instant::now())),
                    }
                } else {
                    stable = None;
                }
            }
            Ok(Err(e)) => {
                debug!(error = %e, "readiness probe failed; treating as not settled");
                stable = None;
            }
            Err(_) => {}
        }

        if Instant::now() >= deadline {
            return Err(TolerarError::NavigationTimeout {
                url: last_url,
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(options.poll_interval().min(remaining)).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::{ElementHandle, OptionChoice, PageReadiness};
    use crate::locator::Selector;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Driver whose only meaningful method is `readiness`
    struct ReadinessDriver {
        calls: AtomicU64,
        complete_after: u64,
        growing: bool,
    }

    impl ReadinessDriver {
        fn new(complete_after: u64, growing: bool) -> Self {
            Self {
                calls: AtomicU64::new(0),
                complete_after,
                growing,
            }
        }
    }

    #[async_trait]
    impl PageDriver for ReadinessDriver {
        async fn navigate(&mut self, _url: &str) -> TolerarResult<()> {
            Ok(())
        }
        async fn current_url(&self) -> TolerarResult<String> {
            Ok("https://shop.test/".into())
        }
        async fn query_all(&self, _selector: &Selector) -> TolerarResult<Vec<ElementHandle>> {
            Ok(Vec::new())
        }
        async fn click(&mut self, _element: &ElementHandle) -> TolerarResult<()> {
            Ok(())
        }
        async fn fill(&mut self, _element: &ElementHandle, _text: &str) -> TolerarResult<()> {
            Ok(())
        }
        async fn set_checked(&mut self, _element: &ElementHandle, _c: bool) -> TolerarResult<()> {
            Ok(())
        }
        async fn select_option(
            &mut self,
            _element: &ElementHandle,
            _choice: &OptionChoice,
        ) -> TolerarResult<()> {
            Ok(())
        }
        async fn go_back(&mut self) -> TolerarResult<()> {
            Ok(())
        }
        async fn body_text(&self) -> TolerarResult<String> {
            Ok(String::new())
        }
        async fn readiness(&self) -> TolerarResult<PageReadiness> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                return Err(TolerarError::driver("execution context was destroyed"));
            }
            Ok(PageReadiness {
                document_complete: n >= self.complete_after,
                resource_count: if self.growing { n } else { 7 },
                url: "https://shop.test/".into(),
            })
        }
        async fn close(&mut self) -> TolerarResult<()> {
            Ok(())
        }
    }

    fn fast() -> WaitOptions {
        WaitOptions::new()
            .with_timeout(500)
            .with_poll_interval(5)
            .with_quiet_window(20)
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = WaitOptions::default();
            assert_eq!(options.timeout_ms, DEFAULT_IDLE_TIMEOUT_MS);
            assert_eq!(options.quiet_window_ms, NETWORK_IDLE_THRESHOLD_MS);
            assert_eq!(options.poll_interval(), Duration::from_millis(50));
        }
    }

    mod settle_tests {
        use super::*;

        #[tokio::test]
        async fn test_settles_after_quiet_window() {
            let driver = ReadinessDriver::new(3, false);
            let result = settle(&driver, &fast()).await.unwrap();
            assert_eq!(result.url, "https://shop.test/");
            assert!(result.elapsed >= Duration::from_millis(20));
        }

        #[tokio::test]
        async fn test_probe_errors_are_not_fatal() {
            let driver = ReadinessDriver::new(1, false);
            assert!(settle(&driver, &fast()).await.is_ok());
            assert!(driver.calls.load(Ordering::SeqCst) > 1);
        }

        #[tokio::test]
        async fn test_never_quiet_times_out() {
            let driver = ReadinessDriver::new(1, true);
            let err = settle(&driver, &fast().with_timeout(60)).await.unwrap_err();
            match err {
                TolerarError::NavigationTimeout { url, ms } => {
                    assert_eq!(url, "https://shop.test/");
                    assert_eq!(ms, 60);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_never_complete_times_out() {
            let driver = ReadinessDriver::new(u64::MAX, false);
            let err = settle(&driver, &fast().with_timeout(40)).await.unwrap_err();
            assert!(matches!(err, TolerarError::NavigationTimeout { .. }));
        }
    }
}
