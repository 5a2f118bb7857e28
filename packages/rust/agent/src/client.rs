//! HTTP client for the automation agent.
//!
//! One POST starts a task; the response body stays open and carries the
//! agent's events until the task ends or the connection drops.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::{debug, instrument};

use guidecraft_shared::{AgentConfig, GuideError, Result};

use crate::events::{AgentEvent, decode_named_event};
use crate::sse::{SseDecoder, SseMessage};
use crate::{AgentEventStream, ScrapeAgent};

/// User-Agent string for agent requests.
const USER_AGENT: &str = concat!("Guidecraft/", env!("CARGO_PKG_VERSION"));

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Serialize)]
struct StartTask<'a> {
    url: &'a str,
    goal: &'a str,
    browser_profile: &'a str,
}

/// [`ScrapeAgent`] backed by a remote automation endpoint.
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    api_key_env: String,
    browser_profile: String,
}

impl HttpAgentClient {
    /// Build a client from config. The key is resolved by the caller so
    /// tests never touch the process environment.
    pub fn new(config: &AgentConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| GuideError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env: config.api_key_env.clone(),
            browser_profile: config.browser_profile.clone(),
        })
    }
}

#[async_trait]
impl ScrapeAgent for HttpAgentClient {
    fn check_ready(&self) -> Result<()> {
        if self.api_key.is_none() {
            return Err(GuideError::validation(format!(
                "Agent API key not found. Set the {} environment variable.",
                self.api_key_env
            )));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn start(&self, url: &str, goal: &str) -> Result<AgentEventStream> {
        self.check_ready()?;
        let body = StartTask {
            url,
            goal,
            browser_profile: &self.browser_profile,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.as_deref().unwrap_or_default())
            .header(ACCEPT, "text/event-stream")
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GuideError::Network(format!("agent request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail = detail.trim();
            return Err(GuideError::Agent(if detail.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {detail}")
            }));
        }
        debug!(%status, "agent task started");

        let body = response.bytes_stream().boxed();
        let events = stream::unfold(
            (body, SseDecoder::new(), VecDeque::new(), false),
            |(mut body, mut decoder, mut pending, mut done)| async move {
                loop {
                    if let Some(item) = pending.pop_front() {
                        return Some((item, (body, decoder, pending, done)));
                    }
                    if done {
                        return None;
                    }
                    match body.next().await {
                        Some(Ok(chunk)) => {
                            pending.extend(decoder.push(&chunk).iter().filter_map(parse));
                        }
                        Some(Err(e)) => {
                            done = true;
                            pending.push_back(Err(GuideError::Network(format!(
                                "agent stream interrupted: {e}"
                            ))));
                        }
                        None => {
                            done = true;
                            pending.extend(decoder.finish().iter().filter_map(parse));
                        }
                    }
                }
            },
        );

        Ok(events.boxed())
    }
}

/// Decode one message, dropping non-JSON payloads and events we do not act on.
fn parse(message: &SseMessage) -> Option<Result<AgentEvent>> {
    match serde_json::from_str(&message.data) {
        Ok(value) => match decode_named_event(&value, message.event.as_deref()) {
            AgentEvent::Other => None,
            event => Some(Ok(event)),
        },
        Err(e) => {
            debug!(error = %e, "skipping non-JSON agent payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> AgentConfig {
        AgentConfig {
            endpoint: format!("{}/v1/automation/run-sse", server.uri()),
            ..AgentConfig::default()
        }
    }

    #[tokio::test]
    async fn streams_decoded_events_in_order() {
        let server = MockServer::start().await;
        let sse = concat!(
            "data: {\"type\":\"STREAMING_URL\",\"streamingUrl\":\"https://live.example/1\"}\n\n",
            ": ping\n\n",
            "data: {\"type\":\"PROGRESS\",\"purpose\":\"Reading the README\"}\n\n",
            "data: {\"type\":\"HEARTBEAT\"}\n\n",
            "data: {\"type\":\"COMPLETE\",\"status\":\"COMPLETED\",\"resultJson\":{\"overview\":\"ok\"}}\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/v1/automation/run-sse"))
            .and(header("X-API-Key", "secret"))
            .and(body_partial_json(json!({
                "url": "https://github.com/docker/compose",
                "browser_profile": "lite"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let agent = HttpAgentClient::new(&config_for(&server), Some("secret".into())).unwrap();
        let events: Vec<AgentEvent> = agent
            .start("https://github.com/docker/compose", "extract things")
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                AgentEvent::StreamingUrl {
                    url: "https://live.example/1".into()
                },
                AgentEvent::Step {
                    message: "Reading the README".into()
                },
                AgentEvent::Complete {
                    result: Some(json!({ "overview": "ok" }))
                },
            ]
        );
    }

    #[tokio::test]
    async fn stream_without_terminal_event_just_ends() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("data: {\"type\":\"STEP\",\"message\":\"Scrolling\"}\n\n"),
            )
            .mount(&server)
            .await;

        let agent = HttpAgentClient::new(&config_for(&server), Some("k".into())).unwrap();
        let events: Vec<_> = agent.start("https://a.dev", "g").await.unwrap().collect().await;
        assert_eq!(events.len(), 1);
        assert!(!events[0].as_ref().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn named_error_event_without_type_fails_the_task() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("event: error\ndata: {\"message\":\"blocked\"}\n\n"),
            )
            .mount(&server)
            .await;

        let agent = HttpAgentClient::new(&config_for(&server), Some("k".into())).unwrap();
        let events: Vec<AgentEvent> = agent
            .start("https://a.dev", "g")
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert_eq!(
            events,
            vec![AgentEvent::Failed {
                message: "blocked".into()
            }]
        );
    }

    #[tokio::test]
    async fn http_error_fails_start() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let agent = HttpAgentClient::new(&config_for(&server), Some("k".into())).unwrap();
        let err = agent.start("https://a.dev", "g").await.err().unwrap();
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn missing_key_is_a_validation_error() {
        let agent = HttpAgentClient::new(&AgentConfig::default(), Some("  ".into())).unwrap();
        let err = agent.check_ready().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("AGENT_API_KEY"));
    }
}
