use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::Post;

/// What makes two extracted posts "the same".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupIdentity {
    /// Every field participates. A post whose like count changes between
    /// scrolls is stored again.
    #[default]
    Record,
    /// Status id only; falls back to the whole record when no id was found.
    PostId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DedupKey {
    Record(Post),
    PostId(String),
}

/// Accumulates admissible posts for one run. Never shrinks.
#[derive(Debug)]
pub struct PostStore {
    identity: DedupIdentity,
    seen: HashSet<DedupKey>,
    posts: Vec<Post>,
}

impl PostStore {
    pub fn new(identity: DedupIdentity) -> Self {
        Self {
            identity,
            seen: HashSet::new(),
            posts: Vec::new(),
        }
    }

    fn key(&self, post: &Post) -> DedupKey {
        match (self.identity, &post.id) {
            (DedupIdentity::PostId, Some(id)) if !id.is_empty() => DedupKey::PostId(id.clone()),
            _ => DedupKey::Record(post.clone()),
        }
    }

    /// Store `post` if it is admissible and unseen. Returns whether it was added.
    pub fn admit(&mut self, post: Post) -> bool {
        if !post.is_admissible() {
            return false;
        }
        if !self.seen.insert(self.key(&post)) {
            return false;
        }
        self.posts.push(post);
        true
    }

    pub fn contains(&self, post: &Post) -> bool {
        self.seen.contains(&self.key(post))
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// All stored posts, in admission order.
    pub fn drain(self) -> Vec<Post> {
        self.posts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, text: &str, timestamp: &str, likes: &str) -> Post {
        Post {
            id: Some(id.into()),
            text: Some(text.into()),
            timestamp: Some(timestamp.into()),
            like_count: Some(likes.into()),
            repost_count: None,
            url: Some(format!("https://x.com/a/status/{id}")),
        }
    }

    #[test]
    fn rejects_posts_without_text_or_timestamp() {
        let mut store = PostStore::new(DedupIdentity::Record);

        let mut no_text = post("1", "", "2024-01-01T00:00:00Z", "1");
        assert!(!store.admit(no_text.clone()));
        no_text.text = None;
        assert!(!store.admit(no_text));

        let mut no_time = post("2", "hello", "", "1");
        assert!(!store.admit(no_time.clone()));
        no_time.timestamp = None;
        assert!(!store.admit(no_time));

        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn same_record_twice_is_stored_once() {
        let mut store = PostStore::new(DedupIdentity::Record);
        let p = post("1", "hello", "2024-01-01T00:00:00Z", "3");

        assert!(store.admit(p.clone()));
        assert!(!store.admit(p.clone()));
        assert_eq!(store.len(), 1);
        assert!(store.contains(&p));
    }

    #[test]
    fn record_identity_treats_changed_counts_as_new() {
        let mut store = PostStore::new(DedupIdentity::Record);
        assert!(store.admit(post("1", "hello", "2024-01-01T00:00:00Z", "3")));
        assert!(store.admit(post("1", "hello", "2024-01-01T00:00:00Z", "4")));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn post_id_identity_ignores_changed_counts() {
        let mut store = PostStore::new(DedupIdentity::PostId);
        assert!(store.admit(post("1", "hello", "2024-01-01T00:00:00Z", "3")));
        assert!(!store.admit(post("1", "hello", "2024-01-01T00:00:00Z", "4")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn post_id_identity_falls_back_to_record_without_id() {
        let mut store = PostStore::new(DedupIdentity::PostId);
        let mut a = post("x", "hello", "2024-01-01T00:00:00Z", "3");
        a.id = None;
        let mut b = a.clone();
        b.text = Some("other".into());

        assert!(store.admit(a.clone()));
        assert!(!store.admit(a));
        assert!(store.admit(b));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn drain_preserves_admission_order() {
        let mut store = PostStore::new(DedupIdentity::Record);
        store.admit(post("2", "b", "2024-01-02T00:00:00Z", "0"));
        store.admit(post("1", "a", "2024-01-01T00:00:00Z", "0"));
        let ids: Vec<_> = store
            .drain()
            .into_iter()
            .map(|p| p.id.unwrap())
            .collect();
        assert_eq!(ids, vec!["2", "1"]);
    }
}
