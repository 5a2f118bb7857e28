//! Wire events streamed to a client during a run.
//!
//! Every event is one JSON object with a `type` discriminator. A client
//! reads them in order, one per line.

use serde::{Deserialize, Serialize};

use crate::types::DiscoveredSource;

/// Coarse pipeline phase, as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovering,
    Scraping,
    Synthesizing,
    Complete,
    Error,
}

/// Live status carried by `source_update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    Scraping,
}

/// Aggregate numbers reported once a guide is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideStats {
    pub source_count: usize,
    pub success_count: usize,
    pub generated_words: usize,
}

/// One event in a run's ordered stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PipelineEvent {
    Phase {
        phase: Phase,
        message: String,
    },
    DiscoveryComplete {
        sources: Vec<DiscoveredSource>,
    },
    SourceUpdate {
        source_id: String,
        status: ScrapeStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        streaming_url: Option<String>,
    },
    SourceComplete {
        source_id: String,
        word_count: usize,
    },
    SourceError {
        source_id: String,
        error: String,
    },
    GuideChunk {
        chunk: String,
    },
    Complete {
        guide: String,
        sources: Vec<DiscoveredSource>,
        stats: GuideStats,
    },
    Error {
        message: String,
    },
}

impl PipelineEvent {
    pub fn phase(phase: Phase, message: impl Into<String>) -> Self {
        Self::Phase {
            phase,
            message: message.into(),
        }
    }

    /// `source_update` announcing that a source started scraping.
    pub fn scraping_started(source_id: impl Into<String>) -> Self {
        Self::SourceUpdate {
            source_id: source_id.into(),
            status: ScrapeStatus::Scraping,
            step: None,
            streaming_url: None,
        }
    }

    pub fn step(source_id: impl Into<String>, step: impl Into<String>) -> Self {
        Self::SourceUpdate {
            source_id: source_id.into(),
            status: ScrapeStatus::Scraping,
            step: Some(step.into()),
            streaming_url: None,
        }
    }

    pub fn streaming_url(source_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::SourceUpdate {
            source_id: source_id.into(),
            status: ScrapeStatus::Scraping,
            step: None,
            streaming_url: Some(url.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Source id for per-source events.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            Self::SourceUpdate { source_id, .. }
            | Self::SourceComplete { source_id, .. }
            | Self::SourceError { source_id, .. } => Some(source_id),
            _ => None,
        }
    }

    /// Whether no event may follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    /// Serialize as a single NDJSON line (with trailing newline).
    pub fn to_line(&self) -> String {
        // Every field is a plain string/number/enum, so serialization cannot fail.
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "type": "error", "message": format!("event encoding failed: {e}") })
                .to_string()
        });
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_event_shape() {
        let ev = PipelineEvent::phase(Phase::Discovering, "Finding sources");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "phase");
        assert_eq!(json["phase"], "discovering");
        assert_eq!(json["message"], "Finding sources");
    }

    #[test]
    fn source_update_uses_camel_case_and_skips_none() {
        let ev = PipelineEvent::streaming_url("blog-00ff00ff-3", "https://live.example/abc");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "source_update");
        assert_eq!(json["sourceId"], "blog-00ff00ff-3");
        assert_eq!(json["status"], "scraping");
        assert_eq!(json["streamingUrl"], "https://live.example/abc");
        assert!(json.get("step").is_none());
    }

    #[test]
    fn complete_event_stats() {
        let ev = PipelineEvent::Complete {
            guide: "# Guide".into(),
            sources: vec![],
            stats: GuideStats {
                source_count: 8,
                success_count: 7,
                generated_words: 2,
            },
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "complete");
        assert_eq!(json["stats"]["sourceCount"], 8);
        assert_eq!(json["stats"]["successCount"], 7);
        assert_eq!(json["stats"]["generatedWords"], 2);
        assert!(ev.is_terminal());
    }

    #[test]
    fn line_roundtrip() {
        let ev = PipelineEvent::SourceComplete {
            source_id: "qa-12345678-2".into(),
            word_count: 140,
        };
        let line = ev.to_line();
        assert!(line.ends_with('\n'));
        assert!(line.contains(r#""wordCount":140"#));
        let parsed: PipelineEvent = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed, ev);
        assert_eq!(parsed.source_id(), Some("qa-12345678-2"));
    }
}
