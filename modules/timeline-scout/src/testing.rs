// Test double for the ProfilePage seam.
//
// MockPage replays canned DOM snapshots, one per snapshot() call, repeating
// the last one once the queue runs dry (a timeline that stopped growing).
// Every interaction is recorded in a shared MockPageLog so tests can inspect
// it after the page has been moved into Scout::run.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use browser_client::{BrowserError, SessionCookie};

use crate::config::ScoutConfig;
use crate::error::Result;
use crate::extractor::POST_CONTAINER;
use crate::navigator::{LOGIN_BUTTON_TEXT, SIGNED_IN_MARKER};
use crate::traits::ProfilePage;

// ---------------------------------------------------------------------------
// HTML builders
// ---------------------------------------------------------------------------

/// One rendered post container, shaped like the live client's markup.
pub fn post_html(user: &str, id: &str, text: &str, datetime: &str) -> String {
    format!(
        r#"<article data-testid="tweet">
  <a href="/{user}"><span>{user}</span></a>
  <a href="/{user}/status/{id}"><time datetime="{datetime}">{datetime}</time></a>
  <div lang="en" data-testid="tweetText"><span>{text}</span></div>
  <button data-testid="retweet"><span>1</span></button>
  <button data-testid="like"><span>2</span></button>
</article>"#
    )
}

/// A full page wrapping the given post containers.
pub fn timeline_html(posts: &[String]) -> String {
    format!(
        "<html><body><main><section>{}</section></main></body></html>",
        posts.join("\n")
    )
}

/// Defaults with no waiting between iterations and the cookie jar under `dir`.
pub fn fast_config(dir: &Path) -> ScoutConfig {
    ScoutConfig {
        inter_iteration_delay_ms: 0,
        cookies_path: dir.join("cookies.json"),
        output_dir: dir.to_path_buf(),
        ..ScoutConfig::default()
    }
}

// ---------------------------------------------------------------------------
// MockPage
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockPageLog {
    closes: AtomicU32,
    scrolls: AtomicU32,
    snapshots: AtomicU32,
    visited: Mutex<Vec<String>>,
    typed: Mutex<Vec<(String, String)>>,
    clicked: Mutex<Vec<String>>,
    cookies_set: Mutex<Vec<SessionCookie>>,
}

impl MockPageLog {
    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn scrolls(&self) -> u32 {
        self.scrolls.load(Ordering::SeqCst)
    }

    pub fn snapshots(&self) -> u32 {
        self.snapshots.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.typed.lock().unwrap().clone()
    }

    pub fn clicked(&self) -> Vec<String> {
        self.clicked.lock().unwrap().clone()
    }

    pub fn cookies_set(&self) -> Vec<SessionCookie> {
        self.cookies_set.lock().unwrap().clone()
    }
}

/// In-memory page. Builder methods: `.with_snapshots()`, `.signed_in()`,
/// `.accepting_login()`, `.timeline_never_renders()`, `.redirecting_to()`,
/// `.with_browser_cookies()`, `.failing_snapshot_at()`.
pub struct MockPage {
    snapshots: Mutex<VecDeque<String>>,
    last_snapshot: Mutex<String>,
    timeline_ready: bool,
    signed_in: AtomicBool,
    accepts_login: bool,
    current_url: Mutex<String>,
    redirect_to: Option<String>,
    browser_cookies: Vec<SessionCookie>,
    fail_snapshot_at: Option<u32>,
    log: Arc<MockPageLog>,
}

impl MockPage {
    pub fn new() -> Self {
        Self {
            snapshots: Mutex::new(VecDeque::new()),
            last_snapshot: Mutex::new(timeline_html(&[])),
            timeline_ready: true,
            signed_in: AtomicBool::new(false),
            accepts_login: false,
            current_url: Mutex::new("about:blank".to_string()),
            redirect_to: None,
            browser_cookies: Vec::new(),
            fail_snapshot_at: None,
            log: Arc::new(MockPageLog::default()),
        }
    }

    pub fn with_snapshots<I, S>(mut self, snapshots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.snapshots = Mutex::new(snapshots.into_iter().map(Into::into).collect());
        self
    }

    pub fn signed_in(self) -> Self {
        self.signed_in.store(true, Ordering::SeqCst);
        self
    }

    /// Clicking "Log in" signs the page in.
    pub fn accepting_login(mut self) -> Self {
        self.accepts_login = true;
        self
    }

    /// The post container never appears.
    pub fn timeline_never_renders(mut self) -> Self {
        self.timeline_ready = false;
        self
    }

    /// Every navigation lands on `url` instead of the requested one.
    pub fn redirecting_to(mut self, url: &str) -> Self {
        self.redirect_to = Some(url.to_string());
        self
    }

    /// Cookies the "browser" reports after login.
    pub fn with_browser_cookies(mut self, cookies: Vec<SessionCookie>) -> Self {
        self.browser_cookies = cookies;
        self
    }

    /// The nth `snapshot()` call (1-based) fails with a protocol error.
    pub fn failing_snapshot_at(mut self, call: u32) -> Self {
        self.fail_snapshot_at = Some(call);
        self
    }

    pub fn log(&self) -> Arc<MockPageLog> {
        Arc::clone(&self.log)
    }
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfilePage for MockPage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.log.visited.lock().unwrap().push(url.to_string());
        let landed = self.redirect_to.clone().unwrap_or_else(|| url.to_string());
        *self.current_url.lock().unwrap() = landed;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<bool> {
        Ok(match selector {
            POST_CONTAINER => self.timeline_ready,
            SIGNED_IN_MARKER => self.signed_in.load(Ordering::SeqCst),
            _ => true,
        })
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.current_url.lock().unwrap().clone())
    }

    async fn snapshot(&self) -> Result<String> {
        let call = self.log.snapshots.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_snapshot_at == Some(call) {
            return Err(BrowserError::Protocol("target crashed".into()).into());
        }
        let mut last = self.last_snapshot.lock().unwrap();
        if let Some(next) = self.snapshots.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }

    async fn scroll_by(&self, _offset_px: u32, _smooth: bool) -> Result<()> {
        self.log.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        self.log
            .typed
            .lock()
            .unwrap()
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn click_by_text(&self, text: &str) -> Result<bool> {
        self.log.clicked.lock().unwrap().push(text.to_string());
        if text == LOGIN_BUTTON_TEXT && self.accepts_login {
            self.signed_in.store(true, Ordering::SeqCst);
        }
        Ok(true)
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        Ok(self.browser_cookies.clone())
    }

    async fn set_cookies(&self, cookies: &[SessionCookie]) -> Result<()> {
        self.log
            .cookies_set
            .lock()
            .unwrap()
            .extend_from_slice(cookies);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
