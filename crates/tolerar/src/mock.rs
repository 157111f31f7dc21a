//! In-memory scripted website.
//!
//! [`MockSite`] is a tiny web application: routes render [`MockPage`]s from
//! shared site state plus per-session state, and click handlers mutate that
//! state and navigate. [`MockDriver`] is one browsing session over it, so
//! scenarios can be exercised without a browser or network.
//!
//! ```
//! use tolerar::mock::{ClickEffect, MockElement, MockPage, MockSite};
//!
//! let site = MockSite::new("https://shop.test")
//!     .route("/", |_| {
//!         MockPage::new().element(
//!             MockElement::new("a")
//!                 .matching("a.ico-login")
//!                 .text("Log in")
//!                 .on_click(|_| ClickEffect::Navigate("/login".into())),
//!         )
//!     })
//!     .route("/login", |_| MockPage::new().body("Welcome, Please Sign In!"));
//! let driver = site.open();
//! assert!(driver.history().is_empty());
//! ```

use crate::driver::{DriverFactory, ElementHandle, OptionChoice, PageDriver, PageReadiness};
use crate::locator::Selector;
use crate::result::{TolerarError, TolerarResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type RouteFn = Arc<dyn Fn(&RouteContext<'_>) -> MockPage + Send + Sync>;
type ClickFn = Arc<dyn Fn(&mut ClickContext<'_>) -> ClickEffect + Send + Sync>;

// =============================================================================
// STATE
// =============================================================================

/// Key-value and list state, shared across sessions or private to one
#[derive(Debug, Clone, Default)]
pub struct Store {
    values: HashMap<String, String>,
    lists: HashMap<String, Vec<String>>,
}

impl Store {
    /// Value for a key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let _ = self.values.insert(key.into(), value.into());
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Whether a key holds `"true"`
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    /// Integer value of a key (0 when unset or not a number)
    #[must_use]
    pub fn number(&self, key: &str) -> i64 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    /// Add to an integer value, returning the new value
    pub fn incr(&mut self, key: &str, by: i64) -> i64 {
        let next = self.number(key) + by;
        self.set(key, next.to_string());
        next
    }

    /// Items of a list
    #[must_use]
    pub fn list(&self, key: &str) -> &[String] {
        self.lists.get(key).map_or(&[], Vec::as_slice)
    }

    /// Append to a list
    pub fn push(&mut self, key: impl Into<String>, item: impl Into<String>) {
        self.lists.entry(key.into()).or_default().push(item.into());
    }

    /// Whether a list contains an item
    #[must_use]
    pub fn contains(&self, key: &str, item: &str) -> bool {
        self.list(key).iter().any(|i| i == item)
    }

    /// Empty a list
    pub fn clear_list(&mut self, key: &str) {
        let _ = self.lists.remove(key);
    }
}

/// What a route sees when rendering
#[derive(Debug)]
pub struct RouteContext<'a> {
    /// Request path
    pub path: &'a str,
    /// Decoded query parameters
    pub query: &'a HashMap<String, String>,
    /// State shared by every session
    pub shared: &'a Store,
    /// State private to this session
    pub session: &'a Store,
}

impl RouteContext<'_> {
    /// Query parameter (empty when missing)
    #[must_use]
    pub fn param(&self, name: &str) -> &str {
        self.query.get(name).map_or("", String::as_str)
    }
}

/// What a click or change handler sees
#[derive(Debug)]
pub struct ClickContext<'a> {
    /// Path of the page the element is on
    pub path: &'a str,
    /// Query parameters of that page
    pub query: &'a HashMap<String, String>,
    /// Current values of named form fields on the page
    pub fields: HashMap<String, String>,
    /// State shared by every session
    pub shared: &'a mut Store,
    /// State private to this session
    pub session: &'a mut Store,
}

impl ClickContext<'_> {
    /// Form field value (empty when missing)
    #[must_use]
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }
}

/// Result of activating an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    /// Nothing visible changes
    Stay,
    /// Re-render the current page (AJAX update)
    Refresh,
    /// Load another page (path with optional query)
    Navigate(String),
}

// =============================================================================
// PAGES
// =============================================================================

/// One element of a mock page
#[derive(Clone)]
pub struct MockElement {
    /// Selectors this element answers to
    pub selectors: Vec<Selector>,
    /// Tag name
    pub tag: String,
    /// Text content
    pub text: String,
    /// Form value
    pub value: Option<String>,
    /// Form field name (key in [`ClickContext::fields`])
    pub name: Option<String>,
    /// Whether rendered visibly
    pub visible: bool,
    /// Checkbox or radio state
    pub checked: Option<bool>,
    /// `<select>` options as (label, value)
    pub options: Vec<(String, String)>,
    on_click: Option<ClickFn>,
}

impl fmt::Debug for MockElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockElement")
            .field("selectors", &self.selectors)
            .field("tag", &self.tag)
            .field("text", &self.text)
            .field("value", &self.value)
            .field("visible", &self.visible)
            .field("checked", &self.checked)
            .field("has_handler", &self.on_click.is_some())
            .finish_non_exhaustive()
    }
}

impl MockElement {
    /// Create a visible element
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            selectors: Vec::new(),
            tag: tag.into(),
            text: String::new(),
            value: None,
            name: None,
            visible: true,
            checked: None,
            options: Vec::new(),
            on_click: None,
        }
    }

    /// Answer to a selector (a `&str` is CSS)
    #[must_use]
    pub fn matching(mut self, selector: impl Into<Selector>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    /// Set text content
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set form value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Make this a named form field with an empty value
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        if self.value.is_none() {
            self.value = Some(String::new());
        }
        self
    }

    /// Render invisibly
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Make this a checkbox with a state
    #[must_use]
    pub const fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Add a `<select>` option
    #[must_use]
    pub fn option(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((label.into(), value.into()));
        self
    }

    /// Handler run on click (or on change, for selects)
    #[must_use]
    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ClickContext<'_>) -> ClickEffect + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(handler));
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Text(t) => contains_ci(&self.text, t),
            Selector::CssWithText { css, text } => {
                self.selectors.contains(&Selector::Css(css.clone()))
                    && contains_ci(&self.text, text)
            }
            other => self.selectors.contains(other),
        }
    }

    fn field_value(&self) -> Option<String> {
        match self.checked {
            Some(checked) => Some(checked.to_string()),
            None => self.value.clone(),
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A rendered page
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    /// Free text outside any addressable element
    pub body: String,
    /// Elements in document order
    pub elements: Vec<MockElement>,
}

impl MockPage {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set free body text
    #[must_use]
    pub fn body(mut self, text: impl Into<String>) -> Self {
        self.body = text.into();
        self
    }

    /// Append an element
    #[must_use]
    pub fn element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Append several elements
    #[must_use]
    pub fn elements(mut self, elements: impl IntoIterator<Item = MockElement>) -> Self {
        self.elements.extend(elements);
        self
    }

    fn not_found() -> Self {
        Self::new().body("Page not found")
    }

    fn text(&self) -> String {
        std::iter::once(self.body.as_str())
            .chain(
                self.elements
                    .iter()
                    .filter(|e| e.visible)
                    .map(|e| e.text.as_str()),
            )
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// SITE
// =============================================================================

struct SiteInner {
    routes: HashMap<String, RouteFn>,
    shared: Store,
    sessions_opened: u64,
}

/// A scripted website shared by any number of sessions
#[derive(Clone)]
pub struct MockSite {
    origin: String,
    inner: Arc<Mutex<SiteInner>>,
}

impl fmt::Debug for MockSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        let mut routes: Vec<&String> = inner.routes.keys().collect();
        routes.sort();
        f.debug_struct("MockSite")
            .field("origin", &self.origin)
            .field("routes", &routes)
            .field("shared", &inner.shared)
            .finish()
    }
}

impl MockSite {
    /// Create a site served at `origin` (e.g. `https://shop.test`)
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            inner: Arc::new(Mutex::new(SiteInner {
                routes: HashMap::new(),
                shared: Store::default(),
                sessions_opened: 0,
            })),
        }
    }

    /// Register a route
    #[must_use]
    pub fn route<F>(self, path: &str, render: F) -> Self
    where
        F: Fn(&RouteContext<'_>) -> MockPage + Send + Sync + 'static,
    {
        let _ = self
            .lock()
            .routes
            .insert(path.to_string(), Arc::new(render));
        self
    }

    /// Site origin
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Copy of the shared state
    #[must_use]
    pub fn shared(&self) -> Store {
        self.lock().shared.clone()
    }

    /// Mutate the shared state (seeding accounts, stock, ...)
    pub fn with_shared<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        f(&mut self.lock().shared)
    }

    /// Number of sessions opened so far
    #[must_use]
    pub fn sessions_opened(&self) -> u64 {
        self.lock().sessions_opened
    }

    /// Open a fresh session
    #[must_use]
    pub fn open(&self) -> MockDriver {
        self.lock().sessions_opened += 1;
        MockDriver::new(self.clone())
    }

    fn lock(&self) -> MutexGuard<'_, SiteInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DriverFactory for MockSite {
    async fn open_session(&self) -> TolerarResult<Box<dyn PageDriver>> {
        Ok(Box::new(self.open()))
    }
}

// =============================================================================
// DRIVER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Location {
    path: String,
    query: HashMap<String, String>,
    raw_query: String,
}

impl Location {
    fn parse(target: &str) -> Self {
        let (path, raw_query) = target.split_once('?').unwrap_or((target, ""));
        let query = raw_query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(k), decode_component(v))
            })
            .collect();
        let path = if path.is_empty() { "/" } else { path };
        Self {
            path: path.to_string(),
            query,
            raw_query: raw_query.to_string(),
        }
    }

    fn to_url(&self, origin: &str) -> String {
        if self.raw_query.is_empty() {
            format!("{origin}{}", self.path)
        } else {
            format!("{origin}{}?{}", self.path, self.raw_query)
        }
    }
}

/// One browsing session over a [`MockSite`]
#[derive(Debug)]
pub struct MockDriver {
    site: MockSite,
    session: Store,
    location: Option<Location>,
    page: MockPage,
    back_stack: Vec<Location>,
    loads: u64,
    closed: bool,
    /// Call history for verification
    pub call_history: Vec<String>,
}

impl MockDriver {
    /// Create a session over a site
    #[must_use]
    pub fn new(site: MockSite) -> Self {
        Self {
            site,
            session: Store::default(),
            location: None,
            page: MockPage::new(),
            back_stack: Vec::new(),
            loads: 0,
            closed: false,
            call_history: Vec::new(),
        }
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    /// This session's private state
    #[must_use]
    pub const fn session(&self) -> &Store {
        &self.session
    }

    fn ensure_open(&self) -> TolerarResult<()> {
        if self.closed {
            Err(TolerarError::driver("session is closed"))
        } else {
            Ok(())
        }
    }

    fn render(&mut self, location: Location) {
        let page = {
            let inner = self.site.lock();
            match inner.routes.get(&location.path) {
                Some(route) => route(&RouteContext {
                    path: &location.path,
                    query: &location.query,
                    shared: &inner.shared,
                    session: &self.session,
                }),
                None => MockPage::not_found(),
            }
        };
        self.page = page;
        self.location = Some(location);
        self.loads += 1;
    }

    fn go_to(&mut self, target: &str) {
        if let Some(current) = self.location.take() {
            self.back_stack.push(current);
        }
        self.render(Location::parse(target));
    }

    fn position(&self, handle: &ElementHandle) -> Option<usize> {
        self.page
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.matches(&handle.selector))
            .nth(handle.index)
            .map(|(i, _)| i)
    }

    fn element_mut(&mut self, handle: &ElementHandle, action: &str) -> TolerarResult<usize> {
        self.ensure_open()?;
        let position = self.position(handle).ok_or_else(|| TolerarError::ActionFailed {
            action: action.to_string(),
            element: handle.selector.to_string(),
            message: "element is no longer attached".to_string(),
        })?;
        if !self.page.elements[position].visible {
            return Err(TolerarError::ActionFailed {
                action: action.to_string(),
                element: handle.selector.to_string(),
                message: "element is not visible".to_string(),
            });
        }
        Ok(position)
    }

    fn activate(&mut self, position: usize) {
        let Some(handler) = self.page.elements[position].on_click.clone() else {
            return;
        };
        let fields: HashMap<String, String> = self
            .page
            .elements
            .iter()
            .filter_map(|e| Some((e.name.clone()?, e.field_value()?)))
            .collect();
        let location = self
            .location
            .clone()
            .unwrap_or_else(|| Location::parse("/"));

        let effect = {
            let site = self.site.clone();
            let mut inner = site.lock();
            let mut ctx = ClickContext {
                path: &location.path,
                query: &location.query,
                fields,
                shared: &mut inner.shared,
                session: &mut self.session,
            };
            handler(&mut ctx)
        };

        match effect {
            ClickEffect::Stay => {}
            ClickEffect::Refresh => self.render(location),
            ClickEffect::Navigate(target) => self.go_to(&target),
        }
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> TolerarResult<()> {
        self.ensure_open()?;
        self.call_history.push(format!("navigate:{url}"));
        let target = match url.strip_prefix(&self.site.origin) {
            Some(rest) => rest.to_string(),
            None if url.starts_with('/') => url.to_string(),
            None => return Err(TolerarError::driver(format!("unreachable host for {url}"))),
        };
        self.go_to(&target);
        Ok(())
    }

    async fn current_url(&self) -> TolerarResult<String> {
        self.ensure_open()?;
        Ok(self
            .location
            .as_ref()
            .map_or_else(|| "about:blank".to_string(), |l| l.to_url(&self.site.origin)))
    }

    async fn query_all(&self, selector: &Selector) -> TolerarResult<Vec<ElementHandle>> {
        self.ensure_open()?;
        Ok(self
            .page
            .elements
            .iter()
            .filter(|e| e.matches(selector))
            .enumerate()
            .map(|(index, e)| ElementHandle {
                selector: selector.clone(),
                index,
                tag_name: e.tag.clone(),
                text_content: Some(e.text.clone()),
                value: e.value.clone(),
                visible: e.visible,
                checked: e.checked,
            })
            .collect())
    }

    async fn click(&mut self, element: &ElementHandle) -> TolerarResult<()> {
        self.call_history.push(format!("click:{}", element.selector));
        let position = self.element_mut(element, "click")?;
        if let Some(checked) = self.page.elements[position].checked {
            self.page.elements[position].checked = Some(!checked);
        }
        self.activate(position);
        Ok(())
    }

    async fn fill(&mut self, element: &ElementHandle, text: &str) -> TolerarResult<()> {
        self.call_history.push(format!("fill:{}", element.selector));
        let position = self.element_mut(element, "fill")?;
        let target = &mut self.page.elements[position];
        if !matches!(target.tag.as_str(), "input" | "textarea") || target.checked.is_some() {
            return Err(TolerarError::ActionFailed {
                action: "fill".to_string(),
                element: element.selector.to_string(),
                message: format!("<{}> is not a text field", target.tag),
            });
        }
        target.value = Some(text.to_string());
        Ok(())
    }

    async fn set_checked(&mut self, element: &ElementHandle, checked: bool) -> TolerarResult<()> {
        self.call_history.push(format!("check:{}", element.selector));
        let position = self.element_mut(element, "check")?;
        let target = &mut self.page.elements[position];
        if target.checked.is_none() {
            return Err(TolerarError::ActionFailed {
                action: "check".to_string(),
                element: element.selector.to_string(),
                message: "not a checkbox or radio".to_string(),
            });
        }
        target.checked = Some(checked);
        Ok(())
    }

    async fn select_option(
        &mut self,
        element: &ElementHandle,
        choice: &OptionChoice,
    ) -> TolerarResult<()> {
        self.call_history.push(format!("select:{}", element.selector));
        let position = self.element_mut(element, "select")?;
        let target = &mut self.page.elements[position];
        let picked = match choice {
            OptionChoice::Label(label) => target.options.iter().find(|(l, _)| l == label),
            OptionChoice::Value(value) => target.options.iter().find(|(_, v)| v == value),
            OptionChoice::Index(i) => target.options.get(*i),
        };
        let Some((_, value)) = picked.cloned() else {
            return Err(TolerarError::ActionFailed {
                action: "select".to_string(),
                element: element.selector.to_string(),
                message: format!("no option with {choice}"),
            });
        };
        target.value = Some(value);
        self.activate(position);
        Ok(())
    }

    async fn go_back(&mut self) -> TolerarResult<()> {
        self.ensure_open()?;
        self.call_history.push("go_back".to_string());
        if let Some(previous) = self.back_stack.pop() {
            self.render(previous);
        }
        Ok(())
    }

    async fn body_text(&self) -> TolerarResult<String> {
        self.ensure_open()?;
        Ok(self.page.text())
    }

    async fn readiness(&self) -> TolerarResult<PageReadiness> {
        self.ensure_open()?;
        Ok(PageReadiness {
            document_complete: true,
            resource_count: self.loads,
            url: self.current_url().await?,
        })
    }

    async fn close(&mut self) -> TolerarResult<()> {
        self.call_history.push("close".to_string());
        self.closed = true;
        Ok(())
    }
}

// =============================================================================
// QUERY ENCODING
// =============================================================================

/// Percent-encode a query component
#[must_use]
pub fn encode_component(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            b' ' => "+".to_string(),
            other => format!("%{other:02X}"),
        })
        .collect()
}

/// Decode a percent-encoded query component
#[must_use]
pub fn decode_component(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
