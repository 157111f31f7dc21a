//! Page driver abstraction.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageDriver (one isolated browsing session)                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐        ┌──────────────────────┐    │
//! │  │  CdpDriver           │        │  MockDriver          │    │
//! │  │  chromiumoxide, one  │        │  scripted in-memory  │    │
//! │  │  incognito context   │        │  site, offline tests │    │
//! │  └──────────────────────┘        └──────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The runner never talks to a browser directly. It asks a [`DriverFactory`]
//! for a fresh session per scenario and works through [`PageDriver`].

use crate::locator::{DocumentSnapshot, Selector};
use crate::result::TolerarResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Element handle for DOM interactions
///
/// Identifies the element as "the `index`-th match of `selector`", which is
/// what drivers use to act on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Selector that matched the element
    pub selector: Selector,
    /// Position among the selector's matches, in document order
    pub index: usize,
    /// Element tag name (lowercase)
    pub tag_name: String,
    /// Element text content
    pub text_content: Option<String>,
    /// Current value for form controls
    pub value: Option<String>,
    /// Whether the element is rendered and visible
    pub visible: bool,
    /// Checked state for checkboxes and radios
    pub checked: Option<bool>,
}

impl ElementHandle {
    /// Create a new, visible element handle
    #[must_use]
    pub fn new(selector: Selector, index: usize, tag_name: impl Into<String>) -> Self {
        Self {
            selector,
            index,
            tag_name: tag_name.into(),
            text_content: None,
            value: None,
            visible: true,
            checked: None,
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Set form value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set checked state
    #[must_use]
    pub const fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Text content, trimmed, or empty
    #[must_use]
    pub fn text(&self) -> &str {
        self.text_content.as_deref().map_or("", str::trim)
    }
}

/// Document readiness as observed by the settle loop
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageReadiness {
    /// `document.readyState === "complete"`
    pub document_complete: bool,
    /// Number of resources fetched so far
    pub resource_count: u64,
    /// Current URL
    pub url: String,
}

/// How to pick an option in a `<select>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionChoice {
    /// Visible option label
    Label(String),
    /// Option `value` attribute
    Value(String),
    /// Zero-based option index
    Index(usize),
}

impl std::fmt::Display for OptionChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Label(l) => write!(f, "label {l:?}"),
            Self::Value(v) => write!(f, "value {v:?}"),
            Self::Index(i) => write!(f, "index {i}"),
        }
    }
}

/// Browser configuration for drivers
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// User agent string
    pub user_agent: Option<String>,
    /// Timeout for navigation
    pub navigation_timeout: Duration,
    /// Executable path override
    pub executable_path: Option<PathBuf>,
    /// Disable the Chromium sandbox (containers, CI)
    pub no_sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            user_agent: None,
            navigation_timeout: Duration::from_secs(30),
            executable_path: None,
            no_sandbox: false,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set navigation timeout
    #[must_use]
    pub const fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Set Chromium executable
    #[must_use]
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Disable the sandbox
    #[must_use]
    pub const fn no_sandbox(mut self, no_sandbox: bool) -> Self {
        self.no_sandbox = no_sandbox;
        self
    }
}

/// One isolated browsing session.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL and wait for the load to commit
    async fn navigate(&mut self, url: &str) -> TolerarResult<()>;

    /// Current page URL
    async fn current_url(&self) -> TolerarResult<String>;

    /// All elements matching a selector, in document order (hidden included)
    async fn query_all(&self, selector: &Selector) -> TolerarResult<Vec<ElementHandle>>;

    /// Click an element
    async fn click(&mut self, element: &ElementHandle) -> TolerarResult<()>;

    /// Replace an input's value
    async fn fill(&mut self, element: &ElementHandle, text: &str) -> TolerarResult<()>;

    /// Set checkbox or radio state
    async fn set_checked(&mut self, element: &ElementHandle, checked: bool) -> TolerarResult<()>;

    /// Choose an option in a `<select>`
    async fn select_option(
        &mut self,
        element: &ElementHandle,
        choice: &OptionChoice,
    ) -> TolerarResult<()>;

    /// History back
    async fn go_back(&mut self) -> TolerarResult<()>;

    /// Visible text of the document body
    async fn body_text(&self) -> TolerarResult<String>;

    /// Readiness probe used by the settle loop
    async fn readiness(&self) -> TolerarResult<PageReadiness>;

    /// Close the session and release its resources
    async fn close(&mut self) -> TolerarResult<()>;

    /// Snapshot every selector of a candidate list
    async fn snapshot(&self, selectors: &[Selector]) -> TolerarResult<DocumentSnapshot> {
        let mut snapshot = DocumentSnapshot::new();
        for selector in selectors {
            let elements = self.query_all(selector).await?;
            snapshot.insert(selector.clone(), elements);
        }
        Ok(snapshot)
    }
}

/// Opens isolated sessions, one per scenario.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    /// Open a fresh session sharing no cookies or storage with any other
    async fn open_session(&self) -> TolerarResult<Box<dyn PageDriver>>;

    /// Release shared resources (browser process) after a run
    async fn shutdown(&self) -> TolerarResult<()> {
        Ok(())
    }
}
