use std::cmp::Reverse;

use crate::types::Post;

/// Newest first, at most `target_count` posts.
///
/// The sort is stable, so posts with equal timestamps keep their collection
/// order. Posts whose timestamp does not parse sort after every dated post.
pub fn finalize(mut posts: Vec<Post>, target_count: usize) -> Vec<Post> {
    posts.sort_by_key(|p| Reverse(p.published_at()));
    posts.truncate(target_count);
    posts
}
