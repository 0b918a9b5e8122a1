//! `BrowserPage` over the Chrome DevTools Protocol (chromiumoxide).
//!
//! DOM reads and writes run as small functions bound to the element
//! (`Runtime.callFunctionOn`), so values never travel through a selector twice.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser::{BrowserError, BrowserPage, SelectBy};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const WINDOW_WIDTH: u32 = 1440;
const WINDOW_HEIGHT: u32 = 900;

const ARG: &str = "__ARG__";

const JS_TAG_NAME: &str = "function() { return this.tagName.toLowerCase(); }";

const JS_INNER_TEXT: &str = "function() { return this.innerText || ''; }";

const JS_GET_ATTRIBUTE: &str = "function() { return this.getAttribute(__ARG__); }";

const JS_PROPERTY: &str = "function() { \
    const v = this[__ARG__]; \
    return (v === undefined || typeof v === 'object' || typeof v === 'function') ? null : v; \
}";

const JS_ENCLOSING_LABEL: &str = "function() { \
    const label = this.closest('label'); \
    return label ? label.innerText : null; \
}";

const JS_IS_VISIBLE: &str = "function() { \
    const style = window.getComputedStyle(this); \
    const rect = this.getBoundingClientRect(); \
    return style.visibility !== 'hidden' && style.display !== 'none' \
        && rect.width > 0 && rect.height > 0; \
}";

// Uses the prototype setter so framework-controlled inputs observe the change.
const JS_FILL: &str = "function() { \
    this.focus(); \
    const proto = this.tagName === 'TEXTAREA' \
        ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
    const setter = Object.getOwnPropertyDescriptor(proto, 'value').set; \
    setter.call(this, __ARG__); \
    this.dispatchEvent(new Event('input', { bubbles: true })); \
    this.dispatchEvent(new Event('change', { bubbles: true })); \
    return true; \
}";

const JS_SELECT_OPTION: &str = "function() { \
    const [mode, wanted] = __ARG__; \
    const options = Array.from(this.options || []); \
    const option = options.find(o => mode === 'label' \
        ? (o.label.trim() === wanted || o.text.trim() === wanted) \
        : o.value === wanted); \
    if (!option) { return false; } \
    this.value = option.value; \
    this.dispatchEvent(new Event('input', { bubbles: true })); \
    this.dispatchEvent(new Event('change', { bubbles: true })); \
    return true; \
}";

const JS_CHECK: &str = "function() { \
    if (!this.checked) { this.click(); } \
    return this.checked === true; \
}";

/// Launch settings for a local Chrome/Chromium.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
}

/// Owns the browser process and its single working page.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: ChromiumPage,
}

impl BrowserSession {
    pub async fn launch(options: &LaunchOptions) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT);

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(|e| {
            BrowserError::Disconnected(format!("failed to build browser config: {e}"))
        })?;

        info!(
            headless = options.headless,
            executable = ?options.chrome_path,
            "Launching Chrome"
        );

        let (browser, mut handler) = Browser::launch(config).await.map_err(map_cdp_error)?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser.new_page("about:blank").await.map_err(map_cdp_error)?;
        page.set_user_agent(USER_AGENT)
            .await
            .map_err(map_cdp_error)?;

        info!("Browser ready");
        Ok(Self {
            browser,
            handler_task,
            page: ChromiumPage { page },
        })
    }

    pub fn page(&self) -> &ChromiumPage {
        &self.page
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close returned error: {e}");
        }
        self.handler_task.abort();
        info!("Browser closed");
    }
}

pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn first(&self, selector: &str) -> Result<Element, BrowserError> {
        self.query_one(selector)
            .await?
            .ok_or_else(|| BrowserError::NotFound(selector.to_string()))
    }

    /// Runs an element-bound function and returns its primitive result.
    async fn call_on(
        &self,
        element: &Element,
        function: &str,
        arg: Option<&Value>,
    ) -> Result<Option<Value>, BrowserError> {
        let function = match arg {
            Some(arg) => function.replace(ARG, &arg.to_string()),
            None => function.to_string(),
        };
        let returns = element
            .call_js_fn(function, false)
            .await
            .map_err(map_cdp_error)?;

        if let Some(exception) = returns.exception_details {
            return Err(BrowserError::Script(exception.text));
        }
        Ok(returns.result.value.filter(|v| !v.is_null()))
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        debug!("Navigating to {url}");
        self.page.goto(url).await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn query_one(&self, selector: &str) -> Result<Option<Element>, BrowserError> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        self.page
            .find_elements(selector)
            .await
            .map_err(map_cdp_error)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element = self.first(selector).await?;
        self.call_on(&element, JS_FILL, Some(&Value::from(text)))
            .await?;
        Ok(())
    }

    async fn select_option(&self, selector: &str, by: SelectBy<'_>) -> Result<(), BrowserError> {
        let element = self.first(selector).await?;
        let arg = match by {
            SelectBy::Label(label) => serde_json::json!(["label", label]),
            SelectBy::Value(value) => serde_json::json!(["value", value]),
        };
        match self.call_on(&element, JS_SELECT_OPTION, Some(&arg)).await? {
            Some(Value::Bool(true)) => Ok(()),
            _ => Err(BrowserError::OptionNotFound(by.to_string())),
        }
    }

    async fn check(&self, selector: &str) -> Result<(), BrowserError> {
        let element = self.first(selector).await?;
        match self.call_on(&element, JS_CHECK, None).await? {
            Some(Value::Bool(true)) => Ok(()),
            _ => Err(BrowserError::Script(format!("{selector} did not become checked"))),
        }
    }

    async fn set_input_files(&self, selector: &str, path: &Path) -> Result<(), BrowserError> {
        let element = self.first(selector).await?;
        let params = SetFileInputFilesParams::builder()
            .files(vec![path.to_string_lossy().to_string()])
            .backend_node_id(element.backend_node_id.clone())
            .build()
            .map_err(BrowserError::Script)?;
        self.page.execute(params).await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn click(&self, element: &Element) -> Result<(), BrowserError> {
        element.click().await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn is_visible(&self, element: &Element) -> Result<bool, BrowserError> {
        Ok(matches!(
            self.call_on(element, JS_IS_VISIBLE, None).await?,
            Some(Value::Bool(true))
        ))
    }

    async fn inner_text(&self, element: &Element) -> Result<String, BrowserError> {
        Ok(self
            .call_on(element, JS_INNER_TEXT, None)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    async fn get_attribute(
        &self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        Ok(self
            .call_on(element, JS_GET_ATTRIBUTE, Some(&Value::from(name)))
            .await?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn property(&self, element: &Element, name: &str) -> Result<Option<Value>, BrowserError> {
        self.call_on(element, JS_PROPERTY, Some(&Value::from(name)))
            .await
    }

    async fn tag_name(&self, element: &Element) -> Result<String, BrowserError> {
        Ok(self
            .call_on(element, JS_TAG_NAME, None)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    async fn enclosing_label_text(&self, element: &Element) -> Result<Option<String>, BrowserError> {
        Ok(self
            .call_on(element, JS_ENCLOSING_LABEL, None)
            .await?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        let bytes = self.page.screenshot(params).await.map_err(map_cdp_error)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &bytes).await?;

        debug!(path = %path.display(), size_kb = bytes.len() / 1024, "Screenshot saved");
        Ok(())
    }

    async fn wait(&self, millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// Transport-level failures mean the page is gone; protocol errors stay local.
fn map_cdp_error(err: CdpError) -> BrowserError {
    match err {
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
            BrowserError::Disconnected(err.to_string())
        }
        CdpError::Timeout => BrowserError::Timeout(err.to_string()),
        other => {
            let message = other.to_string();
            if message.contains("Target closed") || message.contains("Session with given id not found") {
                BrowserError::Disconnected(message)
            } else {
                BrowserError::Script(message)
            }
        }
    }
}
