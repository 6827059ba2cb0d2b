use std::fmt;

use tracing::{debug, info, warn};

use crate::collector::{CollectionState, Collector};
use crate::config::{Credentials, ScoutConfig};
use crate::error::Result;
use crate::finalize::finalize;
use crate::navigator::Navigator;
use crate::traits::ProfilePage;
use crate::types::Post;

/// Outcome of a successful run.
#[derive(Debug)]
pub struct ScrapeReport {
    pub username: String,
    /// `TargetReached` or `Stuck`.
    pub state: CollectionState,
    pub signed_in: bool,
    pub iterations: u32,
    /// Distinct posts admitted before finalizing.
    pub collected: usize,
    /// Newest first, at most `target_count`.
    pub posts: Vec<Post>,
}

impl fmt::Display for ScrapeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{}: {} posts kept of {} collected in {} iterations ({:?}, signed_in={})",
            self.username,
            self.posts.len(),
            self.collected,
            self.iterations,
            self.state,
            self.signed_in
        )
    }
}

/// Runs one scrape: session restore, login, profile navigation, collection,
/// and finalizing.
pub struct Scout {
    config: ScoutConfig,
    navigator: Navigator,
}

impl Scout {
    pub fn new(config: ScoutConfig, credentials: Credentials) -> Self {
        let navigator = Navigator::new(config.clone(), credentials);
        Self { config, navigator }
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Scrape `username` using `page`. The page is owned for the duration of
    /// the run and closed exactly once before returning, whatever the outcome.
    pub async fn run<P: ProfilePage>(&self, mut page: P, username: &str) -> Result<ScrapeReport> {
        let result = self.scrape(&page, username).await;
        if let Err(e) = page.close().await {
            warn!(error = %e, "Browser did not close cleanly");
        }
        result
    }

    async fn scrape<P: ProfilePage>(&self, page: &P, username: &str) -> Result<ScrapeReport> {
        self.navigator.restore_session(page).await;
        let signed_in = self.navigator.authenticate(page).await;
        if !signed_in {
            warn!(username, "Continuing signed out");
        }

        info!(username, "Starting to scrape posts");
        let collection = Collector::new(&self.config)?
            .collect(page, &self.navigator, username)
            .await?;

        let collected = collection.posts.len();
        let posts = finalize(collection.posts, self.config.target_count);
        for post in &posts {
            debug!(id = ?post.id, timestamp = ?post.timestamp, text = ?post.text, "Scraped post");
        }

        Ok(ScrapeReport {
            username: username.to_string(),
            state: collection.state,
            signed_in,
            iterations: collection.iterations,
            collected,
            posts,
        })
    }
}
