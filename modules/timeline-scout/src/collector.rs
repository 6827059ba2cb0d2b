//! The scroll-and-collect loop.
//!
//! ```text
//!            open_profile ok                      len >= target
//!   (start) ────────────────▶ Running ──────────────────────────▶ TargetReached
//!      │                      │   ▲  │
//!      │ open_profile err     │   └──┘ scroll + wait             flat >= threshold
//!      ▼                      └─────────────────────────────────▶ Stuck
//!    Failed ◀──────────────── any unexpected page error
//! ```
//!
//! Each iteration snapshots the DOM, merges every extracted post into the
//! store, and asks the progress monitor whether the store grew. There is no
//! iteration cap besides the stuck threshold.

use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::ScoutConfig;
use crate::dedup::PostStore;
use crate::error::Result;
use crate::extractor::PostExtractor;
use crate::navigator::Navigator;
use crate::progress::ProgressMonitor;
use crate::traits::ProfilePage;
use crate::types::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionState {
    Running,
    TargetReached,
    Stuck,
    Failed,
}

impl CollectionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, CollectionState::Running)
    }
}

/// Result of a completed collection. `state` is `TargetReached` or `Stuck`;
/// a `Failed` run surfaces as an `Err` instead.
#[derive(Debug)]
pub struct Collection {
    pub state: CollectionState,
    pub iterations: u32,
    /// Every admitted post, in admission order. Not yet sorted or truncated.
    pub posts: Vec<Post>,
}

pub struct Collector {
    extractor: PostExtractor,
    store: PostStore,
    monitor: ProgressMonitor,
    target_count: usize,
    scroll_offset_px: u32,
    smooth_scroll: bool,
    delay: Duration,
    state: CollectionState,
    iterations: u32,
}

impl Collector {
    pub fn new(config: &ScoutConfig) -> Result<Self> {
        Ok(Self {
            extractor: PostExtractor::new(config.base_url()?),
            store: PostStore::new(config.dedup_identity),
            monitor: ProgressMonitor::new(config.stuck_threshold),
            target_count: config.target_count,
            scroll_offset_px: config.scroll_offset_px,
            smooth_scroll: config.smooth_scroll,
            delay: config.inter_iteration_delay(),
            state: CollectionState::Running,
            iterations: 0,
        })
    }

    /// Open the profile, then iterate until the target is met or the
    /// timeline stops yielding new posts.
    pub async fn collect<P: ProfilePage + ?Sized>(
        mut self,
        page: &P,
        navigator: &Navigator,
        username: &str,
    ) -> Result<Collection> {
        if let Err(e) = navigator.open_profile(page, username).await {
            self.state = CollectionState::Failed;
            error!(username, error = %e, "Profile never became ready");
            return Err(e);
        }

        info!(username, target = self.target_count, "Starting to collect posts");
        while !self.state.is_terminal() {
            match self.step(page).await {
                Ok(next) => self.state = next,
                Err(e) => {
                    self.state = CollectionState::Failed;
                    error!(username, iteration = self.iterations, error = %e, "Collection failed");
                    return Err(e);
                }
            }
        }

        info!(
            username,
            state = ?self.state,
            iterations = self.iterations,
            collected = self.store.len(),
            "Collection finished"
        );
        Ok(Collection {
            state: self.state,
            iterations: self.iterations,
            posts: self.store.drain(),
        })
    }

    /// One iteration. Returns the next state.
    async fn step<P: ProfilePage + ?Sized>(&mut self, page: &P) -> Result<CollectionState> {
        self.iterations += 1;

        let html = page.snapshot().await?;
        let candidates = self.extractor.extract(&html);
        let seen = candidates.len();
        let admitted = candidates
            .into_iter()
            .map(|post| self.store.admit(post))
            .filter(|&added| added)
            .count();
        debug!(
            iteration = self.iterations,
            seen, admitted, "Merged extracted posts"
        );

        let progress = self.monitor.observe(self.store.len());
        if progress.flat_count > 0 {
            info!(
                "No new posts found (attempt {}/{})",
                progress.flat_count,
                self.monitor.threshold()
            );
        }
        info!(collected = self.store.len(), "Collected {} posts", self.store.len());

        if self.store.len() >= self.target_count {
            return Ok(CollectionState::TargetReached);
        }
        if progress.stuck {
            return Ok(CollectionState::Stuck);
        }

        page.scroll_by(self.scroll_offset_px, self.smooth_scroll)
            .await?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(CollectionState::Running)
    }
}
