//! End-to-end generation run: topic → discovery → scrape → synthesize.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use guidecraft_agent::{HttpAgentClient, ScrapeAgent, build_goal};
use guidecraft_discovery::{DiscoveryOptions, HttpSearchProvider, SourceDiscovery};
use guidecraft_shared::{
    AppConfig, DEFAULT_PER_TYPE, GenerateRequest, GuideError, GuideStats, PipelineEvent,
    Result, ScrapeOutcome, ScrapeSuccess, clamp_per_type, read_api_key, word_count,
};

use crate::orchestrator::scrape_all;
use crate::phase::{PhaseTracker, RunState};
use crate::sink::EventSink;
use crate::synthesis::synthesize;

/// Message for failures nobody anticipated (including panics).
const UNEXPECTED_FAILURE: &str = "Guide generation failed unexpectedly. Please try again.";

/// How a run ended, for callers that do not read the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed(GuideStats),
    Failed(String),
    Cancelled,
}

/// The generation pipeline. Cheap to clone and share between runs.
#[derive(Clone)]
pub struct Pipeline {
    discovery: SourceDiscovery,
    agent: Arc<dyn ScrapeAgent>,
    default_quota: u32,
}

impl Pipeline {
    pub fn new(discovery: SourceDiscovery, agent: Arc<dyn ScrapeAgent>) -> Self {
        Self {
            discovery,
            agent,
            default_quota: DEFAULT_PER_TYPE,
        }
    }

    /// Build the HTTP-backed pipeline described by `config`.
    ///
    /// Credentials are read from the environment variables the config names.
    /// A missing agent key is not an error here; each run reports it.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let search_key = read_api_key(&config.search.api_key_env);
        if search_key.is_none() {
            warn!(
                var = %config.search.api_key_env,
                "no search API key, discovery will rely on fallback sources"
            );
        }
        let search = HttpSearchProvider::new(&config.search, search_key)?;
        let agent = HttpAgentClient::new(&config.agent, read_api_key(&config.agent.api_key_env))?;

        let discovery = SourceDiscovery::new(
            Arc::new(search),
            DiscoveryOptions {
                results_per_query: config.defaults.results_per_query,
            },
        );
        Ok(Self::new(discovery, Arc::new(agent)).with_default_quota(config.defaults.max_per_type))
    }

    /// Quota used when a request does not set one. Clamped like requests are.
    pub fn with_default_quota(mut self, quota: u32) -> Self {
        self.default_quota = clamp_per_type(Some(i64::from(quota)));
        self
    }

    /// Execute one run, writing its events to `sink`.
    ///
    /// The stream always ends with exactly one `complete` or `error` event,
    /// unless `cancel` fires first, in which case nothing more is emitted.
    #[instrument(skip_all, fields(run_id = %Uuid::now_v7()))]
    pub async fn run(
        &self,
        request: GenerateRequest,
        sink: EventSink,
        cancel: CancellationToken,
    ) -> RunStatus {
        let start = Instant::now();
        let mut tracker = PhaseTracker::new();
        let guarded = AssertUnwindSafe(self.stages(&request, &sink, &mut tracker)).catch_unwind();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("run cancelled");
                return RunStatus::Cancelled;
            }
            outcome = guarded => outcome,
        };

        conclude(outcome, &mut tracker, &sink, start)
    }

    async fn stages(
        &self,
        request: &GenerateRequest,
        sink: &EventSink,
        tracker: &mut PhaseTracker,
    ) -> Result<GuideStats> {
        let topic = request
            .topic()
            .ok_or_else(|| GuideError::validation("Topic is required."))?;
        self.agent.check_ready()?;
        let quota = match request.max_per_type {
            Some(_) => request.quota(),
            None => self.default_quota,
        };
        info!(%topic, quota, "starting run");

        // --- Discovery ---
        let phase = tracker.advance(RunState::Discovering)?;
        sink.emit(PipelineEvent::phase(phase, format!("Finding sources for {topic}")));

        let sources = self.discovery.discover(topic, quota).await;
        if sources.is_empty() {
            return Err(GuideError::Pipeline(format!(
                "Discovery failed: no sources discovered for \"{topic}\""
            )));
        }
        sink.emit(PipelineEvent::DiscoveryComplete {
            sources: sources.clone(),
        });

        // --- Scraping ---
        let phase = tracker.advance(RunState::Scraping)?;
        sink.emit(PipelineEvent::phase(
            phase,
            format!("Scraping {} sources", sources.len()),
        ));

        let outcomes = scrape_all(
            &sources,
            |source| build_goal(topic, source.category),
            self.agent.as_ref(),
            sink,
        )
        .await;
        let successes: Vec<ScrapeSuccess> = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                ScrapeOutcome::Success(success) => Some(success),
                ScrapeOutcome::Failure(_) => None,
            })
            .collect();
        if successes.is_empty() {
            return Err(GuideError::Pipeline(
                "Scraping failed: no source returned usable content".into(),
            ));
        }

        // --- Synthesis ---
        let phase = tracker.advance(RunState::Synthesizing)?;
        sink.emit(PipelineEvent::phase(
            phase,
            format!("Synthesizing guide from {} sources", successes.len()),
        ));

        let build = synthesize(topic, &successes, Utc::now());
        for chunk in build.chunks() {
            sink.emit(PipelineEvent::GuideChunk { chunk });
        }
        let guide = build.guide();
        let stats = GuideStats {
            source_count: sources.len(),
            success_count: successes.len(),
            generated_words: word_count(&guide),
        };

        let phase = tracker.advance(RunState::Complete)?;
        sink.emit(PipelineEvent::phase(phase, "Guide ready"));
        sink.emit(PipelineEvent::Complete {
            guide,
            sources,
            stats,
        });
        Ok(stats)
    }
}

/// Turn a finished (or panicked) run into its terminal events and status.
fn conclude(
    outcome: std::thread::Result<Result<GuideStats>>,
    tracker: &mut PhaseTracker,
    sink: &EventSink,
    start: Instant,
) -> RunStatus {
    match outcome {
        Ok(Ok(stats)) => {
            info!(
                sources = stats.source_count,
                succeeded = stats.success_count,
                words = stats.generated_words,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "run complete"
            );
            RunStatus::Completed(stats)
        }
        Ok(Err(e)) if e.is_validation() => {
            warn!(error = %e, "request rejected");
            let message = e.to_string();
            sink.emit(PipelineEvent::error(&message));
            RunStatus::Failed(message)
        }
        Ok(Err(e)) => {
            let message = match e {
                GuideError::Pipeline(message) => message,
                other => {
                    error!(error = %other, state = ?tracker.state(), "run failed");
                    UNEXPECTED_FAILURE.to_string()
                }
            };
            warn!(%message, "run aborted");
            report_fatal(tracker, sink, &message);
            RunStatus::Failed(message)
        }
        Err(_) => {
            error!(state = ?tracker.state(), "run panicked");
            report_fatal(tracker, sink, UNEXPECTED_FAILURE);
            RunStatus::Failed(UNEXPECTED_FAILURE.to_string())
        }
    }
}

fn report_fatal(tracker: &mut PhaseTracker, sink: &EventSink, message: &str) {
    match tracker.advance(RunState::Error) {
        Ok(phase) => sink.emit(PipelineEvent::phase(phase, message)),
        Err(e) => error!(error = %e, "fatal error after the run ended"),
    }
    sink.emit(PipelineEvent::error(message));
}
