//! Uniquified inputs for state-creating steps.
//!
//! The site under test is shared and keeps what earlier runs created, so
//! accounts are registered under a fresh address every time.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Return `local+<unix-millis>-<n>@domain`.
///
/// `n` is a process-wide counter, so calls within the same millisecond
/// still differ.
#[must_use]
pub fn unique_email(local: &str, domain: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let millis = Utc::now().timestamp_millis();
    format!("{local}+{millis}-{n}@{domain}")
}
