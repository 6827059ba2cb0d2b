//! Collection loop behaviour against replayed timeline snapshots.
//!
//! `MockPage` hands out one snapshot per iteration and repeats the last one
//! once its queue is empty, which is how a timeline that stopped growing
//! looks to the loop.

use timeline_scout::collector::{CollectionState, Collector};
use timeline_scout::dedup::DedupIdentity;
use timeline_scout::navigator::Navigator;
use timeline_scout::testing::{fast_config, post_html, timeline_html, MockPage};
use timeline_scout::{Credentials, ScoutConfig};

fn post(id: u32, day: u32) -> String {
    post_html(
        "jack",
        &id.to_string(),
        &format!("post number {id}"),
        &format!("2024-01-{day:02}T12:00:00.000Z"),
    )
}

async fn collect(
    config: &ScoutConfig,
    page: &MockPage,
) -> timeline_scout::Result<timeline_scout::collector::Collection> {
    let navigator = Navigator::new(config.clone(), Credentials::default());
    Collector::new(config)?.collect(page, &navigator, "jack").await
}

#[tokio::test]
async fn reaches_target_when_each_scroll_adds_two_posts() {
    let dir = tempfile::tempdir().unwrap();
    let config = ScoutConfig {
        target_count: 3,
        ..fast_config(dir.path())
    };
    let page = MockPage::new().with_snapshots([
        timeline_html(&[post(1, 1), post(2, 2)]),
        timeline_html(&[post(1, 1), post(2, 2), post(3, 3), post(4, 4)]),
        timeline_html(&[post(5, 5), post(6, 6)]),
    ]);
    let log = page.log();

    let collection = collect(&config, &page).await.unwrap();

    assert_eq!(collection.state, CollectionState::TargetReached);
    assert_eq!(collection.iterations, 2);
    assert_eq!(collection.posts.len(), 4);
    // No scroll after the iteration that met the target.
    assert_eq!(log.scrolls(), 1);
}

#[tokio::test]
async fn stops_as_stuck_after_threshold_flat_iterations() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());
    let page = MockPage::new().with_snapshots([timeline_html(&[post(1, 1), post(2, 2)])]);
    let log = page.log();

    let collection = collect(&config, &page).await.unwrap();

    assert_eq!(collection.state, CollectionState::Stuck);
    // One productive iteration, then five flat ones.
    assert_eq!(collection.iterations, 1 + config.stuck_threshold);
    assert_eq!(collection.posts.len(), 2);
    assert_eq!(log.scrolls(), config.stuck_threshold);
}

#[tokio::test]
async fn empty_timeline_gets_stuck_without_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = ScoutConfig {
        stuck_threshold: 2,
        ..fast_config(dir.path())
    };
    let page = MockPage::new().with_snapshots([timeline_html(&[])]);

    let collection = collect(&config, &page).await.unwrap();

    assert_eq!(collection.state, CollectionState::Stuck);
    assert_eq!(collection.iterations, 2);
    assert!(collection.posts.is_empty());
}

#[tokio::test]
async fn slow_render_resets_patience() {
    let dir = tempfile::tempdir().unwrap();
    let config = ScoutConfig {
        stuck_threshold: 2,
        ..fast_config(dir.path())
    };
    let one = timeline_html(&[post(1, 1)]);
    let two = timeline_html(&[post(1, 1), post(2, 2)]);
    let page = MockPage::new().with_snapshots([one.clone(), one, two]);

    let collection = collect(&config, &page).await.unwrap();

    // 1 (grow), 1 (flat 1), 2 (grow), 2 (flat 1), 2 (flat 2 -> stuck)
    assert_eq!(collection.iterations, 5);
    assert_eq!(collection.posts.len(), 2);
}

#[tokio::test]
async fn inadmissible_posts_never_count() {
    let dir = tempfile::tempdir().unwrap();
    let config = ScoutConfig {
        stuck_threshold: 1,
        ..fast_config(dir.path())
    };
    let no_time = r#"<article data-testid="tweet"><div lang="en">orphan</div></article>"#;
    let no_text = r#"<article data-testid="tweet">
        <a href="/jack/status/9"><time datetime="2024-01-09T00:00:00Z">x</time></a>
    </article>"#;
    let page = MockPage::new().with_snapshots([timeline_html(&[
        no_time.to_string(),
        no_text.to_string(),
        post(1, 1),
    ])]);

    let collection = collect(&config, &page).await.unwrap();

    assert_eq!(collection.posts.len(), 1);
    assert_eq!(collection.posts[0].id.as_deref(), Some("1"));
}

fn post_with_likes(likes: u32) -> String {
    format!(
        r#"<article data-testid="tweet">
  <a href="/jack/status/77"><time datetime="2024-02-01T00:00:00.000Z">Feb 1</time></a>
  <div lang="en">counting likes</div>
  <button data-testid="like"><span>{likes}</span></button>
</article>"#
    )
}

#[tokio::test]
async fn record_identity_counts_a_repainted_post_twice() {
    let dir = tempfile::tempdir().unwrap();
    let config = ScoutConfig {
        stuck_threshold: 1,
        ..fast_config(dir.path())
    };
    let page = MockPage::new().with_snapshots([
        timeline_html(&[post_with_likes(2)]),
        timeline_html(&[post_with_likes(3)]),
    ]);

    let collection = collect(&config, &page).await.unwrap();
    assert_eq!(collection.posts.len(), 2);
}

#[tokio::test]
async fn post_id_identity_counts_a_repainted_post_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = ScoutConfig {
        stuck_threshold: 1,
        dedup_identity: DedupIdentity::PostId,
        ..fast_config(dir.path())
    };
    let page = MockPage::new().with_snapshots([
        timeline_html(&[post_with_likes(2)]),
        timeline_html(&[post_with_likes(3)]),
    ]);

    let collection = collect(&config, &page).await.unwrap();
    assert_eq!(collection.posts.len(), 1);
    assert_eq!(collection.posts[0].like_count.as_deref(), Some("2"));
}

#[tokio::test]
async fn unrendered_profile_fails_before_any_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());
    let page = MockPage::new().timeline_never_renders();
    let log = page.log();

    let err = collect(&config, &page).await.unwrap_err();

    assert!(err.is_navigation());
    assert_eq!(log.snapshots(), 0);
    assert_eq!(log.scrolls(), 0);
}

#[tokio::test]
async fn page_error_mid_run_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());
    let page = MockPage::new()
        .with_snapshots([timeline_html(&[post(1, 1)]), timeline_html(&[post(2, 2)])])
        .failing_snapshot_at(2);

    let err = collect(&config, &page).await.unwrap_err();
    assert!(!err.is_navigation());
    assert!(err.to_string().contains("target crashed"));
}
