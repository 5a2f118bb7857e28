//! Hostname/path heuristics for assigning and ranking search hits.
//!
//! Matching is intentionally loose: a tutorial hosted on a docs subdomain
//! will land in documentation, and that is fine.

use guidecraft_shared::SourceCategory;

use crate::provider::SearchResult;

const CODE_HOST: &str = "github.com";
const QA_HOST: &str = "stackoverflow.com";
const QA_NETWORK: &str = "stackexchange.com";

const BLOG_DOMAINS: &[&str] = &[
    "medium.com",
    "dev.to",
    "hashnode.dev",
    "substack.com",
    "freecodecamp.org",
    "hackernoon.com",
    "towardsdatascience.com",
    "css-tricks.com",
    "smashingmagazine.com",
    "blog.logrocket.com",
];

const DOC_HOST_PREFIXES: &[&str] = &["docs.", "doc.", "developer.", "developers.", "learn."];
const DOC_HOST_HINTS: &[&str] = &["readthedocs", "gitbook.io", "docs.rs"];
const DOC_PATH_HINTS: &[&str] = &["/docs", "/documentation", "/reference", "/manual", "/api/"];
const BLOG_PATH_HINTS: &[&str] = &["/blog", "/tutorial", "/posts", "/articles"];

/// Bonus for a path that looks like the category's most useful page type.
const CATEGORY_BONUS: i32 = 3;

/// Assign a hit to at most one category. Earlier rules win.
pub fn classify(hostname: &str, url: &str) -> Option<SourceCategory> {
    let host = hostname.trim_start_matches("www.").to_ascii_lowercase();
    let path = url_path(url);

    if host_matches(&host, CODE_HOST) {
        return Some(SourceCategory::CodeHost);
    }
    if host_matches(&host, QA_HOST) || host_matches(&host, QA_NETWORK) {
        return Some(SourceCategory::QAndA);
    }

    let blog_domain = BLOG_DOMAINS.iter().any(|d| host_matches(&host, d));
    let doc_hint = DOC_HOST_PREFIXES.iter().any(|p| host.starts_with(p))
        || DOC_HOST_HINTS.iter().any(|h| host.contains(h))
        || DOC_PATH_HINTS.iter().any(|p| path.contains(p));
    if doc_hint && !blog_domain {
        return Some(SourceCategory::Documentation);
    }

    if blog_domain || BLOG_PATH_HINTS.iter().any(|p| path.contains(p)) {
        return Some(SourceCategory::Blog);
    }
    None
}

/// Relevance of a hit for `category`, given the topic's tokens.
pub fn score(result: &SearchResult, tokens: &[String], category: SourceCategory) -> i32 {
    let title = result.title.to_lowercase();
    let snippet = result.description.to_lowercase();
    let url = result.url.to_lowercase();

    let mut total = 0;
    for token in tokens {
        if title.contains(token.as_str()) {
            total += 2;
        }
        if snippet.contains(token.as_str()) {
            total += 1;
        }
        if url.contains(token.as_str()) {
            total += 1;
        }
    }

    let path = url_path(&url);
    let bonus_paths: &[&str] = match category {
        SourceCategory::Documentation => &["/docs", "/reference"],
        SourceCategory::QAndA => &["/questions/"],
        SourceCategory::CodeHost => &["/issues", "/discussions"],
        SourceCategory::Blog => &["/tutorial", "/guide"],
    };
    if bonus_paths.iter().any(|p| path.contains(p)) {
        total += CATEGORY_BONUS;
    }
    total
}

/// Lowercase topic tokens, de-duplicated, in order.
pub fn tokenize(topic: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for raw in topic.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#')) {
        let token = raw.to_lowercase();
        if !token.is_empty() && !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Path portion of a URL string, lowercased; empty when unparseable.
fn url_path(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase())
        .unwrap_or_default()
}
