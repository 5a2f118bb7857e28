//! Synthetic search-page sources used when organic results run short.
//!
//! These always exist but are not guaranteed to hold useful content, so a
//! scrape against one may legitimately fail.

use url::form_urlencoded::byte_serialize;

use guidecraft_shared::SourceCategory;

/// A fallback before it is assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackSource {
    pub title: String,
    pub url: String,
    pub reason: String,
    pub query: String,
}

/// Deterministic fallbacks for one category, in preference order.
pub fn fallback_sources(topic: &str, category: SourceCategory) -> Vec<FallbackSource> {
    let slug = slugify(topic);
    let entries: [(&str, String, String); 3] = match category {
        SourceCategory::Documentation => [
            (
                "documentation search",
                format!("{topic} official documentation"),
                "https://duckduckgo.com/html/?q=".to_string(),
            ),
            (
                "API reference search",
                format!("{topic} API reference"),
                "https://www.bing.com/search?q=".to_string(),
            ),
            (
                "getting started search",
                format!("{topic} getting started guide"),
                "https://www.google.com/search?q=".to_string(),
            ),
        ],
        SourceCategory::CodeHost => [
            (
                "repository search",
                topic.to_string(),
                "https://github.com/search?type=repositories&q=".to_string(),
            ),
            (
                "topic page",
                topic.to_string(),
                format!("https://github.com/topics/{slug}?q="),
            ),
            (
                "curated lists",
                format!("awesome {topic}"),
                "https://github.com/search?type=repositories&q=".to_string(),
            ),
        ],
        SourceCategory::QAndA => [
            (
                "question search",
                topic.to_string(),
                "https://stackoverflow.com/search?q=".to_string(),
            ),
            (
                "common errors",
                format!("{topic} error"),
                "https://stackoverflow.com/search?tab=votes&q=".to_string(),
            ),
            (
                "how-to questions",
                format!("how to {topic}"),
                "https://stackoverflow.com/search?tab=relevance&q=".to_string(),
            ),
        ],
        SourceCategory::Blog => [
            (
                "articles",
                topic.to_string(),
                "https://dev.to/search?q=".to_string(),
            ),
            (
                "stories",
                format!("{topic} tutorial"),
                "https://medium.com/search?q=".to_string(),
            ),
            (
                "tutorial search",
                format!("{topic} tutorial blog"),
                "https://duckduckgo.com/html/?q=".to_string(),
            ),
        ],
    };

    entries
        .into_iter()
        .map(|(what, query, base)| FallbackSource {
            title: format!("{}: {what} for {topic}", category.label()),
            url: format!("{base}{}", encode(&query)),
            reason: format!("Fallback {what}; organic results were insufficient."),
            query,
        })
        .collect()
}

fn encode(text: &str) -> String {
    byte_serialize(text.as_bytes()).collect()
}

fn slugify(topic: &str) -> String {
    let mut slug = String::new();
    for c in topic.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}
