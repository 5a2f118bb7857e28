//! Shared types, error model, and configuration for Guidecraft.
//!
//! This crate is the foundation depended on by all other Guidecraft crates.
//! It provides:
//! - [`GuideError`] — the unified error type
//! - Domain types ([`DiscoveredSource`], [`StructuredExtraction`], [`ScrapeOutcome`])
//! - The wire event contract ([`PipelineEvent`])
//! - Configuration ([`AppConfig`], config loading)
//! - Ordered, capped de-duplication ([`CappedSet`])

pub mod config;
pub mod dedup;
pub mod error;
pub mod events;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AgentConfig, AppConfig, DEFAULT_PER_TYPE, DefaultsConfig, MAX_PER_TYPE, MIN_PER_TYPE,
    SearchConfig, ServerConfig, clamp_per_type, config_dir, config_file_path, init_config,
    load_config, load_config_from, read_api_key, validate_agent_key,
};
pub use dedup::{CappedSet, dedup_by_key, dedup_strings};
pub use error::{GuideError, Result};
pub use events::{GuideStats, Phase, PipelineEvent, ScrapeStatus};
pub use types::{
    ApiReference, CommonIssue, DiscoveredSource, GenerateRequest, PracticalExample, ResourceLink,
    ScrapeFailure, ScrapeOutcome, ScrapeSuccess, SourceCategory, StructuredExtraction, word_count,
};
