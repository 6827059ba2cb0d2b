use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One post as read off the rendered timeline.
///
/// Every field is optional at this stage: the page may be half-rendered or the
/// markup may lack a piece. Only posts with both `text` and `timestamp` are
/// ever admitted into a collection run (see [`Post::is_admissible`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Post {
    pub id: Option<String>,
    pub text: Option<String>,
    pub timestamp: Option<String>,
    pub like_count: Option<String>,
    pub repost_count: Option<String>,
    pub url: Option<String>,
}

impl Post {
    pub fn is_admissible(&self) -> bool {
        is_present(&self.text) && is_present(&self.timestamp)
    }

    /// Parsed `timestamp`, or `None` if absent or not RFC 3339.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts.trim()).ok())
    }
}

fn is_present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.is_empty())
}

/// Output shape written to the results file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: Option<String>,
    pub text: String,
    pub time: String,
    pub likes: Option<String>,
    pub retweets: Option<String>,
    pub url: Option<String>,
}

impl From<Post> for PostRecord {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            text: post.text.unwrap_or_default(),
            time: post.timestamp.unwrap_or_default(),
            likes: post.like_count,
            retweets: post.repost_count,
            url: post.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(text: Option<&str>, timestamp: Option<&str>) -> Post {
        Post {
            id: Some("1".into()),
            text: text.map(String::from),
            timestamp: timestamp.map(String::from),
            like_count: None,
            repost_count: None,
            url: None,
        }
    }

    #[test]
    fn admissible_requires_text_and_timestamp() {
        assert!(post(Some("hi"), Some("2024-01-01T00:00:00.000Z")).is_admissible());
        assert!(!post(Some(""), Some("2024-01-01T00:00:00.000Z")).is_admissible());
        assert!(!post(Some("hi"), None).is_admissible());
        assert!(!post(None, Some("2024-01-01T00:00:00.000Z")).is_admissible());
    }

    #[test]
    fn published_at_parses_millisecond_timestamps() {
        let p = post(Some("hi"), Some("2024-03-05T17:20:01.000Z"));
        let ts = p.published_at().unwrap();
        assert_eq!(ts.timestamp(), 1_709_659_201);
    }

    #[test]
    fn record_serializes_with_output_field_names() {
        let record = PostRecord::from(Post {
            id: Some("42".into()),
            text: Some("hello".into()),
            timestamp: Some("2024-01-01T00:00:00.000Z".into()),
            like_count: Some("7".into()),
            repost_count: None,
            url: Some("https://x.com/a/status/42".into()),
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["time"], "2024-01-01T00:00:00.000Z");
        assert_eq!(value["likes"], "7");
        assert!(value["retweets"].is_null());
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 6);
    }
}
