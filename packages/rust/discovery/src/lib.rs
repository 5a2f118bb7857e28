//! Source discovery: turn a topic into a ranked, de-duplicated source list.
//!
//! For every category the discoverer issues a few templated queries against
//! a [`SearchProvider`], keeps the hits that classify into that category,
//! ranks them by topic relevance, and tops up with synthetic search pages
//! when organic results fall short of the quota.

pub mod classify;
pub mod fallback;
pub mod provider;

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use url::Url;

use guidecraft_shared::{DiscoveredSource, MAX_PER_TYPE, SourceCategory};

pub use classify::{classify, score, tokenize};
pub use fallback::{FallbackSource, fallback_sources};
pub use provider::{HttpSearchProvider, SearchProvider, SearchResult};

/// Default number of results requested per query.
const DEFAULT_RESULTS_PER_QUERY: u32 = 8;

/// Query templates per category, tried in order. `{topic}` is substituted.
pub fn query_templates(category: SourceCategory) -> &'static [&'static str] {
    match category {
        SourceCategory::Documentation => &[
            "{topic} official documentation",
            "{topic} docs API reference",
            "{topic} getting started guide",
        ],
        SourceCategory::CodeHost => &[
            "site:github.com {topic}",
            "{topic} examples repository github",
            "awesome {topic} github",
        ],
        SourceCategory::QAndA => &[
            "site:stackoverflow.com {topic}",
            "{topic} common errors stackoverflow",
            "how to {topic} stackoverflow",
        ],
        SourceCategory::Blog => &[
            "{topic} tutorial blog",
            "{topic} best practices",
            "{topic} in-depth guide",
        ],
    }
}

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Configuration for the discovery process.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Results requested from the provider per query.
    pub results_per_query: u32,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            results_per_query: DEFAULT_RESULTS_PER_QUERY,
        }
    }
}

/// A source before ids are assigned.
#[derive(Debug, Clone)]
struct Candidate {
    category: SourceCategory,
    title: String,
    url: String,
    reason: String,
    query: String,
}

// ---------------------------------------------------------------------------
// SourceDiscovery
// ---------------------------------------------------------------------------

/// Discovers sources for a topic using a search provider.
#[derive(Clone)]
pub struct SourceDiscovery {
    provider: Arc<dyn SearchProvider>,
    options: DiscoveryOptions,
}

impl SourceDiscovery {
    pub fn new(provider: Arc<dyn SearchProvider>, options: DiscoveryOptions) -> Self {
        Self { provider, options }
    }

    /// Discover up to `quota` sources per category for `topic`.
    ///
    /// Provider failures are logged and treated as empty result sets, so the
    /// only way to get fewer than `4 * quota` sources is URL collisions.
    /// An empty topic or a zero quota yields nothing.
    #[instrument(skip_all, fields(topic = %topic, quota = quota))]
    pub async fn discover(&self, topic: &str, quota: u32) -> Vec<DiscoveredSource> {
        let topic = topic.trim();
        let quota = quota.min(MAX_PER_TYPE) as usize;
        if topic.is_empty() || quota == 0 {
            return Vec::new();
        }

        let tokens = tokenize(topic);
        let organic = join_all(
            SourceCategory::ALL
                .iter()
                .map(|category| self.organic_candidates(topic, &tokens, *category, quota)),
        )
        .await;

        let mut seen = HashSet::new();
        let mut picked = Vec::new();
        for (category, candidates) in SourceCategory::ALL.into_iter().zip(organic) {
            let mut taken = 0;
            for candidate in candidates {
                if taken >= quota {
                    break;
                }
                if seen.insert(candidate.url.clone()) {
                    picked.push(candidate);
                    taken += 1;
                }
            }

            if taken < quota {
                debug!(%category, taken, quota, "filling with fallback sources");
                for fb in fallback_sources(topic, category) {
                    if taken >= quota {
                        break;
                    }
                    let Some(url) = normalize_url(&fb.url) else {
                        continue;
                    };
                    if seen.insert(url.clone()) {
                        picked.push(Candidate {
                            category,
                            title: fb.title,
                            url,
                            reason: fb.reason,
                            query: fb.query,
                        });
                        taken += 1;
                    }
                }
            }
        }

        let sources: Vec<DiscoveredSource> = picked
            .into_iter()
            .enumerate()
            .map(|(index, c)| DiscoveredSource {
                id: source_id(c.category, &c.url, index),
                category: c.category,
                title: c.title,
                url: c.url,
                reason: c.reason,
                query: c.query,
            })
            .collect();

        info!(count = sources.len(), "discovery complete");
        sources
    }

    /// Ranked organic hits for one category, in template order.
    ///
    /// Stops issuing queries once `quota` distinct URLs are in hand.
    async fn organic_candidates(
        &self,
        topic: &str,
        tokens: &[String],
        category: SourceCategory,
        quota: usize,
    ) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for template in query_templates(category) {
            if candidates.len() >= quota {
                break;
            }
            let query = template.replace("{topic}", topic);
            let results = match self
                .provider
                .search(&query, self.options.results_per_query)
                .await
            {
                Ok(results) => results,
                Err(e) => {
                    warn!(%category, %query, error = %e, "search failed, skipping query");
                    continue;
                }
            };

            let mut matches: Vec<(i32, SearchResult)> = results
                .into_iter()
                .filter(|r| classify(&r.hostname, &r.url) == Some(category))
                .map(|r| (score(&r, tokens, category), r))
                .collect();
            matches.sort_by(|a, b| b.0.cmp(&a.0));

            for (_, result) in matches {
                let Some(url) = normalize_url(&result.url) else {
                    continue;
                };
                if !seen.insert(url.clone()) {
                    continue;
                }
                let reason = if result.description.is_empty() {
                    format!("Matched {} search for \"{query}\"", category.label())
                } else {
                    result.description
                };
                candidates.push(Candidate {
                    category,
                    title: if result.title.is_empty() {
                        url.clone()
                    } else {
                        result.title
                    },
                    url,
                    reason,
                    query: query.clone(),
                });
            }
        }

        debug!(%category, count = candidates.len(), "organic candidates");
        candidates
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Normalize a URL for de-duplication: http(s) only, no fragment, no
/// trailing slash.
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.as_str().trim_end_matches('/').to_string())
}

/// `<category>-<8 hex chars of the URL hash>-<index>`.
pub fn source_id(category: SourceCategory, normalized_url: &str, index: usize) -> String {
    let digest = Sha256::digest(normalized_url.as_bytes());
    let hex = format!("{digest:x}");
    format!("{}-{}-{index}", category.as_str(), &hex[..8])
}
