// Trait seam between the scrape logic and the browser.
//
// ProfilePage is everything the navigator and collection loop need from a
// live tab. BrowserSession implements it for real runs; testing::MockPage
// replays canned DOM snapshots so the loop runs without Chromium.

use std::time::Duration;

use async_trait::async_trait;
use browser_client::{BrowserSession, SessionCookie};

use crate::error::Result;

#[async_trait]
pub trait ProfilePage: Send + Sync {
    /// Navigate, bounded by `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// `Ok(false)` when `selector` did not appear within `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool>;

    async fn current_url(&self) -> Result<String>;

    /// Serialized HTML of the page as it is right now.
    async fn snapshot(&self) -> Result<String>;

    async fn scroll_by(&self, offset_px: u32, smooth: bool) -> Result<()>;

    async fn type_into(&self, selector: &str, text: &str) -> Result<()>;

    /// `Ok(false)` when no element with that text exists.
    async fn click_by_text(&self, text: &str) -> Result<bool>;

    async fn cookies(&self) -> Result<Vec<SessionCookie>>;

    async fn set_cookies(&self, cookies: &[SessionCookie]) -> Result<()>;

    /// Release the underlying browser. Called exactly once per run.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl ProfilePage for BrowserSession {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        Ok(BrowserSession::goto(self, url, timeout).await?)
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool> {
        Ok(BrowserSession::wait_for_selector(self, selector, timeout).await?)
    }

    async fn current_url(&self) -> Result<String> {
        Ok(BrowserSession::current_url(self).await?)
    }

    async fn snapshot(&self) -> Result<String> {
        Ok(self.content().await?)
    }

    async fn scroll_by(&self, offset_px: u32, smooth: bool) -> Result<()> {
        Ok(BrowserSession::scroll_by(self, offset_px, smooth).await?)
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        Ok(BrowserSession::type_into(self, selector, text).await?)
    }

    async fn click_by_text(&self, text: &str) -> Result<bool> {
        Ok(BrowserSession::click_by_text(self, text).await?)
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        Ok(BrowserSession::cookies(self).await?)
    }

    async fn set_cookies(&self, cookies: &[SessionCookie]) -> Result<()> {
        Ok(BrowserSession::set_cookies(self, cookies).await?)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(BrowserSession::close(self).await?)
    }
}
