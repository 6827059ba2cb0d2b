use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, ScoutError};
use crate::types::{Post, PostRecord};

pub fn output_path(dir: &Path, username: &str) -> PathBuf {
    dir.join(format!("{username}_tweets.json"))
}

/// Write `posts` as a pretty-printed JSON array to `<dir>/<username>_tweets.json`.
pub fn write_posts(dir: &Path, username: &str, posts: &[Post]) -> Result<PathBuf> {
    let records: Vec<PostRecord> = posts.iter().cloned().map(PostRecord::from).collect();
    let json = serde_json::to_string_pretty(&records)
        .map_err(|e| ScoutError::Output(format!("failed to encode posts: {e}")))?;

    std::fs::create_dir_all(dir)
        .map_err(|e| ScoutError::Output(format!("failed to create {}: {e}", dir.display())))?;
    let path = output_path(dir, username);
    std::fs::write(&path, json)
        .map_err(|e| ScoutError::Output(format!("failed to write {}: {e}", path.display())))?;

    info!(path = %path.display(), count = records.len(), "Posts saved");
    Ok(path)
}
