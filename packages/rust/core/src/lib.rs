//! Guide generation pipeline for Guidecraft.
//!
//! This crate ties discovery, agent scraping, normalization, and synthesis
//! into a single run that streams [`PipelineEvent`](guidecraft_shared::PipelineEvent)s
//! through an [`EventSink`].

pub mod orchestrator;
pub mod phase;
pub mod pipeline;
pub mod progress;
pub mod sink;
pub mod synthesis;

pub use orchestrator::{NO_TERMINAL_EVENT, UNDEFINED_PAYLOAD, scrape_all};
pub use phase::{PhaseTracker, RunState};
pub use pipeline::{Pipeline, RunStatus};
pub use progress::{BoardCounts, SourceBoard, SourceEntry, SourceState};
pub use sink::EventSink;
pub use synthesis::{GuideBuildResult, synthesize};
