//! Concurrent per-source scraping.
//!
//! Every source gets one agent task. Its step and preview events are relayed
//! to the sink as they arrive, and its terminal event becomes a
//! [`ScrapeOutcome`]. Failures stay local to their source.

use std::time::Instant;

use futures::StreamExt;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use guidecraft_agent::{AgentEvent, ScrapeAgent};
use guidecraft_extraction::normalize;
use guidecraft_shared::{
    DiscoveredSource, PipelineEvent, ScrapeFailure, ScrapeOutcome, ScrapeSuccess, word_count,
};

use crate::sink::EventSink;

/// Reported when the agent's stream closes before a complete/error event.
pub const NO_TERMINAL_EVENT: &str = "agent stream ended without a completion event";

/// Reported when the agent completes but sends nothing usable.
pub const UNDEFINED_PAYLOAD: &str = "agent completed without a result payload";

/// Scrape every source concurrently and wait for all of them.
///
/// The returned outcomes are in the same order as `sources`, one each.
#[instrument(skip_all, fields(sources = sources.len()))]
pub async fn scrape_all<G>(
    sources: &[DiscoveredSource],
    goal_for: G,
    agent: &dyn ScrapeAgent,
    sink: &EventSink,
) -> Vec<ScrapeOutcome>
where
    G: Fn(&DiscoveredSource) -> String + Sync,
{
    let start = Instant::now();
    let outcomes = join_all(
        sources
            .iter()
            .map(|source| scrape_one(source, goal_for(source), agent, sink)),
    )
    .await;

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    info!(
        succeeded,
        failed = outcomes.len() - succeeded,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "scraping finished"
    );
    outcomes
}

async fn scrape_one(
    source: &DiscoveredSource,
    goal: String,
    agent: &dyn ScrapeAgent,
    sink: &EventSink,
) -> ScrapeOutcome {
    sink.emit(PipelineEvent::scraping_started(&source.id));

    match drive(source, &goal, agent, sink).await {
        Ok(raw) => {
            let extracted = normalize(&raw, source);
            let words = word_count(&extracted.raw_text);
            debug!(source_id = %source.id, words, "source complete");
            sink.emit(PipelineEvent::SourceComplete {
                source_id: source.id.clone(),
                word_count: words,
            });
            ScrapeOutcome::Success(ScrapeSuccess {
                source: source.clone(),
                extracted,
                word_count: words,
            })
        }
        Err(error) => {
            warn!(source_id = %source.id, url = %source.url, %error, "source failed");
            sink.emit(PipelineEvent::SourceError {
                source_id: source.id.clone(),
                error: error.clone(),
            });
            ScrapeOutcome::Failure(ScrapeFailure {
                source: source.clone(),
                error,
            })
        }
    }
}

/// Follow one agent task to its terminal event and return the raw payload.
async fn drive(
    source: &DiscoveredSource,
    goal: &str,
    agent: &dyn ScrapeAgent,
    sink: &EventSink,
) -> Result<Value, String> {
    let mut events = agent
        .start(&source.url, goal)
        .await
        .map_err(|e| e.to_string())?;

    while let Some(event) = events.next().await {
        match event.map_err(|e| e.to_string())? {
            AgentEvent::Step { message } => {
                sink.emit(PipelineEvent::step(&source.id, message));
            }
            AgentEvent::StreamingUrl { url } => {
                sink.emit(PipelineEvent::streaming_url(&source.id, url));
            }
            AgentEvent::Complete { result: Some(raw) } => return Ok(raw),
            AgentEvent::Complete { result: None } => return Err(UNDEFINED_PAYLOAD.to_string()),
            AgentEvent::Failed { message } => return Err(message),
            AgentEvent::Other => {}
        }
    }
    Err(NO_TERMINAL_EVENT.to_string())
}
