//! Browser-automation agent integration.
//!
//! This crate provides:
//! - [`ScrapeAgent`] — the seam the scrape orchestrator drives
//! - [`HttpAgentClient`] — the HTTP implementation over a long-lived event stream
//! - [`AgentEvent`] — permissive decoding of the agent's own events
//! - [`build_goal`] — category-specific extraction instructions

pub mod client;
pub mod events;
pub mod goal;
pub mod sse;

use async_trait::async_trait;
use futures::stream::BoxStream;

use guidecraft_shared::Result;

pub use client::HttpAgentClient;
pub use events::{AgentEvent, decode_event, decode_named_event};
pub use goal::build_goal;
pub use sse::{SseDecoder, SseMessage};

/// Stream of decoded events for one agent task, in arrival order.
pub type AgentEventStream = BoxStream<'static, Result<AgentEvent>>;

/// A remote agent that navigates a URL and extracts content for a goal.
#[async_trait]
pub trait ScrapeAgent: Send + Sync {
    /// Check that the agent can be used at all (credentials present, etc.).
    fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Start one task and return its event stream.
    ///
    /// An `Err` here means the task never started; errors yielded by the
    /// stream mean it broke mid-flight. Both are per-source failures.
    async fn start(&self, url: &str, goal: &str) -> Result<AgentEventStream>;
}
