//! Timeline post extraction from a serialized DOM snapshot.
//!
//! Works on HTML text rather than the live page, so calling it repeatedly
//! while the timeline keeps rendering never touches the page itself.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::Post;

/// One rendered post on the timeline.
pub const POST_CONTAINER: &str = r#"article[data-testid="tweet"]"#;
const POST_TEXT: &str = "div[lang]";
const POST_TIME: &str = "time";
const LIKE_COUNTER: &str = r#"[data-testid="like"], [data-testid="unlike"]"#;
const REPOST_COUNTER: &str = r#"[data-testid="retweet"], [data-testid="unretweet"]"#;
const PERMALINK: &str = r#"a[href*="/status/"]"#;

struct Selectors {
    container: Selector,
    text: Selector,
    time: Selector,
    likes: Selector,
    reposts: Selector,
    permalink: Selector,
}

impl Selectors {
    fn new() -> Self {
        let parse = |s: &str| Selector::parse(s).expect("valid selector");
        Self {
            container: parse(POST_CONTAINER),
            text: parse(POST_TEXT),
            time: parse(POST_TIME),
            likes: parse(LIKE_COUNTER),
            reposts: parse(REPOST_COUNTER),
            permalink: parse(PERMALINK),
        }
    }
}

pub struct PostExtractor {
    base_url: Url,
    selectors: Selectors,
}

impl PostExtractor {
    /// `base_url` resolves the relative permalinks the client renders.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            selectors: Selectors::new(),
        }
    }

    /// Every post container in `html`, in document order. Missing pieces
    /// come back as `None`; nothing here fails.
    pub fn extract(&self, html: &str) -> Vec<Post> {
        let document = Html::parse_document(html);
        document
            .select(&self.selectors.container)
            .map(|article| self.extract_post(article))
            .collect()
    }

    fn extract_post(&self, article: ElementRef<'_>) -> Post {
        let s = &self.selectors;

        let text = article.select(&s.text).next().map(text_content);
        let timestamp = article
            .select(&s.time)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .map(str::to_string);
        let like_count = article
            .select(&s.likes)
            .next()
            .map(text_content)
            .and_then(non_empty);
        let repost_count = article
            .select(&s.reposts)
            .next()
            .map(text_content)
            .and_then(non_empty);

        let href = article
            .select(&s.permalink)
            .next()
            .and_then(|a| a.value().attr("href"));
        let id = href.and_then(status_id);
        let url = href.and_then(|h| self.base_url.join(h).ok()).map(String::from);

        Post {
            id,
            text,
            timestamp,
            like_count,
            repost_count,
            url,
        }
    }
}

fn text_content(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The path segment after `/status/`, e.g. `"/jack/status/20/photo/1"` → `"20"`.
pub fn status_id(href: &str) -> Option<String> {
    let (_, rest) = href.split_once("/status/")?;
    let id = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    (!id.is_empty()).then(|| id.to_string())
}
