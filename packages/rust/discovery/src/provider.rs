//! Web search provider seam and its HTTP implementation.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use guidecraft_shared::{GuideError, Result, SearchConfig};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("Guidecraft/", env!("CARGO_PKG_VERSION"));

/// Providers highlight matches with inline markup; we only want text.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// One organic search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub hostname: String,
    pub description: String,
}

/// Anything that can answer a free-text query with ranked results.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, count: u32) -> Result<Vec<SearchResult>>;
}

// ---------------------------------------------------------------------------
// HTTP provider
// ---------------------------------------------------------------------------

/// [`SearchProvider`] over a JSON web-search API.
#[derive(Debug, Clone)]
pub struct HttpSearchProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    auth_header: String,
}

impl HttpSearchProvider {
    pub fn new(config: &SearchConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GuideError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            auth_header: config.auth_header.clone(),
        })
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    #[instrument(skip_all, fields(query = %query))]
    async fn search(&self, query: &str, count: u32) -> Result<Vec<SearchResult>> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query.to_string()), ("count", count.to_string())])
            .header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(self.auth_header.as_str(), key.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| GuideError::Network(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GuideError::Search(format!("HTTP {status} for query \"{query}\"")));
        }

        let body: RawResponse = response
            .json()
            .await
            .map_err(|e| GuideError::parse(format!("invalid search response: {e}")))?;

        let results: Vec<SearchResult> = body
            .results
            .or(body.web.map(|w| w.results))
            .unwrap_or_default()
            .into_iter()
            .filter_map(RawResult::into_result)
            .collect();

        debug!(count = results.len(), "search results received");
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    results: Option<Vec<RawResult>>,
    #[serde(default)]
    web: Option<RawWeb>,
}

#[derive(Debug, Deserialize)]
struct RawWeb {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    meta_url: Option<MetaUrl>,
}

#[derive(Debug, Deserialize)]
struct MetaUrl {
    #[serde(default)]
    hostname: Option<String>,
}

impl RawResult {
    fn into_result(self) -> Option<SearchResult> {
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        let hostname = self
            .hostname
            .or(self.meta_url.and_then(|m| m.hostname))
            .filter(|h| !h.is_empty())
            .or_else(|| Url::parse(&url).ok()?.host_str().map(str::to_string))
            .unwrap_or_default();
        let description = self.description.or(self.snippet).unwrap_or_default();

        Some(SearchResult {
            title: strip_tags(&self.title.unwrap_or_default()),
            description: strip_tags(&description),
            hostname: hostname.to_ascii_lowercase(),
            url,
        })
    }
}

fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer, key: Option<&str>) -> HttpSearchProvider {
        let config = SearchConfig {
            endpoint: format!("{}/res/v1/web/search", server.uri()),
            ..SearchConfig::default()
        };
        HttpSearchProvider::new(&config, key.map(str::to_string)).unwrap()
    }

    #[tokio::test]
    async fn reads_nested_web_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "docker official documentation"))
            .and(query_param("count", "8"))
            .and(header("X-Subscription-Token", "brave-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "web": { "results": [
                    {
                        "title": "<strong>Docker</strong> Docs",
                        "url": "https://docs.docker.com/",
                        "description": "Official <strong>Docker</strong> documentation",
                        "meta_url": { "hostname": "docs.docker.com" }
                    },
                    { "title": "no url" }
                ]}
            })))
            .mount(&server)
            .await;

        let results = provider_for(&server, Some("brave-key"))
            .search("docker official documentation", 8)
            .await
            .unwrap();

        assert_eq!(
            results,
            vec![SearchResult {
                title: "Docker Docs".into(),
                url: "https://docs.docker.com/".into(),
                hostname: "docs.docker.com".into(),
                description: "Official Docker documentation".into(),
            }]
        );
    }

    #[tokio::test]
    async fn reads_flat_results_and_derives_hostname() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    { "title": "Q", "url": "https://StackOverflow.com/questions/1", "snippet": "s" }
                ]
            })))
            .mount(&server)
            .await;

        let results = provider_for(&server, None).search("q", 3).await.unwrap();
        assert_eq!(results[0].hostname, "stackoverflow.com");
        assert_eq!(results[0].description, "s");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = provider_for(&server, None).search("q", 3).await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
