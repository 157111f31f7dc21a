//! Chromium sessions over CDP.
//!
//! One browser process per [`CdpDriverFactory`]; every session gets its own
//! incognito browser context, so cookies, storage and carts never leak
//! between scenarios. Queries and actions compile to JavaScript and run
//! through `Page::evaluate`.

use crate::driver::{
    DriverConfig, DriverFactory, ElementHandle, OptionChoice, PageDriver, PageReadiness,
};
use crate::locator::Selector;
use crate::result::{TolerarError, TolerarResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

// =============================================================================
// FACTORY
// =============================================================================

/// Launches Chromium once and hands out isolated sessions
#[derive(Debug)]
pub struct CdpDriverFactory {
    config: DriverConfig,
    browser: Arc<Mutex<Browser>>,
    handle: tokio::task::JoinHandle<()>,
}

impl CdpDriverFactory {
    /// Launch the browser
    pub async fn launch(config: DriverConfig) -> TolerarResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .request_timeout(config.navigation_timeout);

        if !config.headless {
            builder = builder.with_head();
        }
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(ref ua) = config.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }

        let cdp_config = builder
            .build()
            .map_err(|message| TolerarError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            Browser::launch(cdp_config)
                .await
                .map_err(|e| TolerarError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler stopped");
                    break;
                }
            }
        });

        debug!(headless = config.headless, "browser launched");
        Ok(Self {
            config,
            browser: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Get the driver configuration
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }
}

#[async_trait]
impl DriverFactory for CdpDriverFactory {
    async fn open_session(&self) -> TolerarResult<Box<dyn PageDriver>> {
        let mut browser = self.browser.lock().await;
        let context = browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .map_err(cdp_error)?;
        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context.clone())
            .build()
            .map_err(cdp_error)?;
        let page = browser.new_page(target).await.map_err(cdp_error)?;
        drop(browser);

        Ok(Box::new(CdpDriver {
            browser: Arc::clone(&self.browser),
            context: Some(context),
            page: Some(page),
        }))
    }

    async fn shutdown(&self) -> TolerarResult<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(|e| TolerarError::BrowserLaunch {
            message: e.to_string(),
        })?;
        let _ = browser.wait().await;
        self.handle.abort();
        Ok(())
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// One incognito browsing session
#[derive(Debug)]
pub struct CdpDriver {
    browser: Arc<Mutex<Browser>>,
    context: Option<BrowserContextId>,
    page: Option<Page>,
}

#[derive(Debug, Deserialize)]
struct ElementInfo {
    tag: String,
    text: String,
    value: Option<String>,
    visible: bool,
    checked: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ActionReply {
    ok: bool,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct ReadinessInfo {
    complete: bool,
    resources: u64,
    url: String,
}

const DESCRIBE_JS: &str = "el => ({ \
    tag: el.tagName.toLowerCase(), \
    text: (el.innerText ?? el.textContent ?? ''), \
    value: ('value' in el && typeof el.value === 'string') ? el.value : null, \
    visible: !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length) \
        && getComputedStyle(el).visibility !== 'hidden', \
    checked: (el.type === 'checkbox' || el.type === 'radio') ? el.checked : null })";

const READINESS_JS: &str = "({ \
    complete: document.readyState === 'complete', \
    resources: performance.getEntriesByType('resource').length, \
    url: location.href })";

impl CdpDriver {
    fn page(&self) -> TolerarResult<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| TolerarError::driver("session is closed"))
    }

    async fn eval<T: DeserializeOwned>(&self, expr: String) -> TolerarResult<T> {
        let result = self.page()?.evaluate(expr).await.map_err(cdp_error)?;
        result.into_value().map_err(cdp_error)
    }

    /// Run `body` with `el` bound to the handle's element
    async fn act(&self, action: &str, element: &ElementHandle, body: &str) -> TolerarResult<()> {
        let expr = format!(
            "(() => {{ const el = ({query})[{index}]; \
             if (!el) return {{ ok: false, reason: 'element is no longer attached' }}; \
             el.scrollIntoView({{ block: 'center' }}); {body} }})()",
            query = element.selector.to_query_all(),
            index = element.index,
        );
        let reply: ActionReply = self.eval(expr).await?;
        if reply.ok {
            Ok(())
        } else {
            Err(TolerarError::ActionFailed {
                action: action.to_string(),
                element: element.selector.to_string(),
                message: reply.reason,
            })
        }
    }
}

fn cdp_error(e: impl std::fmt::Display) -> TolerarError {
    TolerarError::driver(e.to_string())
}

fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn navigate(&mut self, url: &str) -> TolerarResult<()> {
        self.page()?
            .goto(url)
            .await
            .map_err(|e| TolerarError::driver(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    async fn current_url(&self) -> TolerarResult<String> {
        let url = self.page()?.url().await.map_err(cdp_error)?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn query_all(&self, selector: &Selector) -> TolerarResult<Vec<ElementHandle>> {
        let expr = format!("({}).map({DESCRIBE_JS})", selector.to_query_all());
        let infos: Vec<ElementInfo> = self.eval(expr).await?;
        Ok(infos
            .into_iter()
            .enumerate()
            .map(|(index, info)| ElementHandle {
                selector: selector.clone(),
                index,
                tag_name: info.tag,
                text_content: Some(info.text),
                value: info.value,
                visible: info.visible,
                checked: info.checked,
            })
            .collect())
    }

    async fn click(&mut self, element: &ElementHandle) -> TolerarResult<()> {
        self.act("click", element, "el.click(); return { ok: true };")
            .await
    }

    async fn fill(&mut self, element: &ElementHandle, text: &str) -> TolerarResult<()> {
        let body = format!(
            "if (!('value' in el)) return {{ ok: false, reason: 'not a text field' }}; \
             el.focus(); \
             const proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
             const setter = Object.getOwnPropertyDescriptor(proto, 'value').set; \
             setter.call(el, {value}); \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return {{ ok: true }};",
            value = js_str(text)
        );
        self.act("fill", element, &body).await
    }

    async fn set_checked(&mut self, element: &ElementHandle, checked: bool) -> TolerarResult<()> {
        let body = format!(
            "if (el.type !== 'checkbox' && el.type !== 'radio') \
               return {{ ok: false, reason: 'not a checkbox or radio' }}; \
             if (el.checked !== {checked}) el.click(); \
             return {{ ok: el.checked === {checked}, reason: 'state did not change' }};"
        );
        self.act("check", element, &body).await
    }

    async fn select_option(
        &mut self,
        element: &ElementHandle,
        choice: &OptionChoice,
    ) -> TolerarResult<()> {
        let pick = match choice {
            OptionChoice::Label(label) => {
                format!("opts.findIndex(o => o.text.trim() === {})", js_str(label))
            }
            OptionChoice::Value(value) => {
                format!("opts.findIndex(o => o.value === {})", js_str(value))
            }
            OptionChoice::Index(i) => format!("({i} < opts.length ? {i} : -1)"),
        };
        let body = format!(
            "if (el.tagName !== 'SELECT') return {{ ok: false, reason: 'not a select' }}; \
             const opts = Array.from(el.options); const i = {pick}; \
             if (i < 0) return {{ ok: false, reason: {missing} }}; \
             el.selectedIndex = i; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return {{ ok: true }};",
            missing = js_str(&format!("no option with {choice}"))
        );
        self.act("select", element, &body).await
    }

    async fn go_back(&mut self) -> TolerarResult<()> {
        let _: bool = self
            .eval("(() => { history.back(); return true; })()".to_string())
            .await?;
        Ok(())
    }

    async fn body_text(&self) -> TolerarResult<String> {
        self.eval("document.body ? document.body.innerText : ''".to_string())
            .await
    }

    async fn readiness(&self) -> TolerarResult<PageReadiness> {
        let info: ReadinessInfo = self.eval(READINESS_JS.to_string()).await?;
        Ok(PageReadiness {
            document_complete: info.complete,
            resource_count: info.resources,
            url: info.url,
        })
    }

    async fn close(&mut self) -> TolerarResult<()> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!(error = %e, "page close failed");
            }
        }
        if let Some(context) = self.context.take() {
            let browser = self.browser.lock().await;
            browser
                .execute(DisposeBrowserContextParams::new(context))
                .await
                .map_err(cdp_error)?;
        }
        Ok(())
    }
}
