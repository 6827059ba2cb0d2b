pub mod cookie;
pub mod error;

pub use cookie::SessionCookie;
pub use error::{BrowserError, Result};

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Handler, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How often `wait_for_selector` re-queries the DOM.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Injected before any document script runs. Hides the usual automation tells.
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined, configurable: true });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'], configurable: true });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5], configurable: true });
if (!window.chrome) { window.chrome = {}; }
if (!window.chrome.runtime) { window.chrome.runtime = {}; }
const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
if (originalQuery) {
    window.navigator.permissions.query = (parameters) => (
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters)
    );
}
"#;

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub stealth: bool,
    /// Browser binary. Falls back to chromiumoxide's own lookup when unset.
    pub executable: Option<PathBuf>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1280,
            window_height: 800,
            stealth: true,
            executable: None,
        }
    }
}

/// One Chromium process with a single working tab.
///
/// `close()` must be called to shut the browser down cleanly. Dropping an
/// unclosed session aborts the CDP handler and leaves process teardown to
/// chromiumoxide.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    closed: bool,
}

impl BrowserSession {
    pub async fn launch(opts: &LaunchOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(opts.window_width, opts.window_height)
            .viewport(Viewport {
                width: opts.window_width,
                height: opts.window_height,
                ..Viewport::default()
            })
            .args(["--no-sandbox", "--disable-setuid-sandbox"]);
        if !opts.headless {
            builder = builder.with_head();
        }
        if let Some(ref exe) = opts.executable {
            builder = builder.chrome_executable(exe);
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        info!(
            headless = opts.headless,
            width = opts.window_width,
            height = opts.window_height,
            "Launching browser"
        );
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        let handler_task = spawn_handler_task(handler);

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(e.into());
            }
        };

        let mut session = Self {
            browser,
            page,
            handler_task,
            closed: false,
        };

        if opts.stealth {
            if let Err(e) = session
                .page
                .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
                .await
            {
                let _ = session.close().await;
                return Err(e.into());
            }
            debug!("Stealth script installed");
        }

        Ok(session)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        Ok(())
    }

    /// Navigate and wait for the load event, bounded by `timeout`.
    pub async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        self.ensure_open()?;
        debug!(url, "Navigating");
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(BrowserError::Timeout {
                action: format!("navigate to {url}"),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Poll for `selector` until it matches or `timeout` expires.
    /// Expiry is `Ok(false)`, not an error.
    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool> {
        self.ensure_open()?;
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                debug!(selector, timeout_ms = timeout.as_millis() as u64, "Selector wait expired");
                return Ok(false);
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    pub async fn current_url(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.page.url().await?.unwrap_or_default())
    }

    /// Serialized HTML of the current document.
    pub async fn content(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.page.content().await?)
    }

    pub async fn evaluate<T: DeserializeOwned>(&self, expression: &str) -> Result<T> {
        self.ensure_open()?;
        let result = self.page.evaluate(expression).await?;
        result
            .into_value::<T>()
            .map_err(|e| BrowserError::Protocol(format!("unexpected evaluation result: {e}")))
    }

    pub async fn scroll_by(&self, offset_px: u32, smooth: bool) -> Result<()> {
        self.ensure_open()?;
        self.page.evaluate(scroll_script(offset_px, smooth)).await?;
        Ok(())
    }

    /// Focus the first element matching `selector` and type `text` into it.
    pub async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        self.ensure_open()?;
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    /// Click the innermost clickable element whose visible text equals `text`.
    /// Returns `false` when nothing matched.
    pub async fn click_by_text(&self, text: &str) -> Result<bool> {
        self.evaluate::<bool>(&click_by_text_script(text)).await
    }

    pub async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        self.ensure_open()?;
        let cookies = self.page.get_cookies().await?;
        Ok(cookies.into_iter().map(SessionCookie::from).collect())
    }

    pub async fn set_cookies(&self, cookies: &[SessionCookie]) -> Result<()> {
        self.ensure_open()?;
        if cookies.is_empty() {
            return Ok(());
        }
        let params = cookies
            .iter()
            .map(SessionCookie::to_param)
            .collect::<Result<Vec<_>>>()?;
        self.page.set_cookies(params).await?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Shut the browser down. Safe to call more than once; only the first
    /// call does any work.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        info!("Closing browser");

        let closed = self.browser.close().await;
        if let Err(ref e) = closed {
            warn!(error = %e, "Browser close command failed");
        }
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Waiting for browser exit failed");
        }
        self.handler_task.abort();

        closed.map(|_| ()).map_err(BrowserError::from)
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("BrowserSession dropped without close()");
            self.handler_task.abort();
        }
    }
}

fn spawn_handler_task(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!(error = %e, "CDP handler event error");
            }
        }
        debug!("CDP handler finished");
    })
}

fn scroll_script(offset_px: u32, smooth: bool) -> String {
    let behavior = if smooth { "smooth" } else { "instant" };
    format!("window.scrollBy({{ top: {offset_px}, behavior: '{behavior}' }})")
}

fn click_by_text_script(text: &str) -> String {
    // serde_json gives a correctly escaped JS string literal.
    let needle = serde_json::Value::String(text.to_string()).to_string();
    format!(
        r#"(() => {{
            const needle = {needle};
            const candidates = Array.from(document.querySelectorAll('button, [role="button"], a, span, div'));
            const matches = candidates.filter(el => (el.innerText || '').trim() === needle);
            if (matches.length === 0) return false;
            const innermost = matches.find(el => !matches.some(other => other !== el && el.contains(other))) || matches[0];
            const target = innermost.closest('button, [role="button"], a') || innermost;
            target.click();
            return true;
        }})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_script_uses_requested_behavior() {
        assert_eq!(
            scroll_script(500, true),
            "window.scrollBy({ top: 500, behavior: 'smooth' })"
        );
        assert!(scroll_script(250, false).contains("behavior: 'instant'"));
    }

    #[test]
    fn click_script_escapes_needle() {
        let script = click_by_text_script(r#"Log "in""#);
        assert!(script.contains(r#"const needle = "Log \"in\"";"#));
    }

    #[test]
    fn default_launch_options_match_desktop_window() {
        let opts = LaunchOptions::default();
        assert_eq!((opts.window_width, opts.window_height), (1280, 800));
        assert!(!opts.headless);
        assert!(opts.stealth);
    }
}
