//! Consumer-side view of a run's per-source progress.
//!
//! [`SourceBoard`] folds the event stream into one entry per discovered
//! source and rejects anything that breaks the stream's ordering rules:
//! events for sources that were never announced, status regressions, or
//! events after the run ended.

use std::collections::HashMap;

use guidecraft_shared::{DiscoveredSource, GuideError, PipelineEvent, Result};

/// Status of one source as seen by a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceState {
    Pending,
    Scraping,
    Complete { word_count: usize },
    Failed { error: String },
}

impl SourceState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub source: DiscoveredSource,
    pub state: SourceState,
    pub last_step: Option<String>,
    /// Only the latest preview URL is kept.
    pub streaming_url: Option<String>,
}

/// Tallies by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardCounts {
    pub pending: usize,
    pub scraping: usize,
    pub complete: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct SourceBoard {
    entries: Vec<SourceEntry>,
    index: HashMap<String, usize>,
    discovered: bool,
    finished: bool,
}

impl SourceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. On error the board is left unchanged.
    pub fn apply(&mut self, event: &PipelineEvent) -> Result<()> {
        if self.finished {
            return Err(violation("event received after the run ended"));
        }

        match event {
            PipelineEvent::DiscoveryComplete { sources } => {
                if self.discovered {
                    return Err(violation("discovery_complete received twice"));
                }
                self.discovered = true;
                for source in sources {
                    self.index.insert(source.id.clone(), self.entries.len());
                    self.entries.push(SourceEntry {
                        source: source.clone(),
                        state: SourceState::Pending,
                        last_step: None,
                        streaming_url: None,
                    });
                }
            }
            PipelineEvent::SourceUpdate {
                source_id,
                step,
                streaming_url,
                ..
            } => {
                let entry = self.entry_mut(source_id)?;
                if entry.state.is_terminal() {
                    return Err(violation(format!("{source_id} updated after finishing")));
                }
                entry.state = SourceState::Scraping;
                if let Some(step) = step {
                    entry.last_step = Some(step.clone());
                }
                if let Some(url) = streaming_url {
                    entry.streaming_url = Some(url.clone());
                }
            }
            PipelineEvent::SourceComplete {
                source_id,
                word_count,
            } => {
                self.finish_source(source_id, SourceState::Complete {
                    word_count: *word_count,
                })?;
            }
            PipelineEvent::SourceError { source_id, error } => {
                self.finish_source(source_id, SourceState::Failed {
                    error: error.clone(),
                })?;
            }
            PipelineEvent::Complete { .. } | PipelineEvent::Error { .. } => {
                self.finished = true;
            }
            PipelineEvent::Phase { .. } | PipelineEvent::GuideChunk { .. } => {}
        }
        Ok(())
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn get(&self, source_id: &str) -> Option<&SourceEntry> {
        self.index.get(source_id).map(|&i| &self.entries[i])
    }

    pub fn counts(&self) -> BoardCounts {
        let mut counts = BoardCounts::default();
        for entry in &self.entries {
            match entry.state {
                SourceState::Pending => counts.pending += 1,
                SourceState::Scraping => counts.scraping += 1,
                SourceState::Complete { .. } => counts.complete += 1,
                SourceState::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    /// Whether a terminal run event has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish_source(&mut self, source_id: &str, state: SourceState) -> Result<()> {
        let entry = self.entry_mut(source_id)?;
        if entry.state != SourceState::Scraping {
            return Err(violation(format!(
                "{source_id} finished from {:?} instead of scraping",
                entry.state
            )));
        }
        entry.state = state;
        Ok(())
    }

    fn entry_mut(&mut self, source_id: &str) -> Result<&mut SourceEntry> {
        match self.index.get(source_id) {
            Some(&i) => Ok(&mut self.entries[i]),
            None => Err(violation(format!("event for unknown source {source_id}"))),
        }
    }
}

fn violation(message: impl Into<String>) -> GuideError {
    GuideError::Pipeline(format!("event stream violation: {}", message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidecraft_shared::SourceCategory;

    fn announced(ids: &[&str]) -> SourceBoard {
        let sources = ids
            .iter()
            .map(|id| DiscoveredSource {
                id: id.to_string(),
                category: SourceCategory::Documentation,
                title: id.to_string(),
                url: format!("https://{id}.dev"),
                reason: String::new(),
                query: String::new(),
            })
            .collect();
        let mut board = SourceBoard::new();
        board
            .apply(&PipelineEvent::DiscoveryComplete { sources })
            .unwrap();
        board
    }

    #[test]
    fn tracks_lifecycle_and_latest_preview() {
        let mut board = announced(&["a", "b"]);
        board.apply(&PipelineEvent::scraping_started("a")).unwrap();
        board.apply(&PipelineEvent::streaming_url("a", "https://live/1")).unwrap();
        board.apply(&PipelineEvent::step("a", "Clicking")).unwrap();
        board.apply(&PipelineEvent::streaming_url("a", "https://live/2")).unwrap();

        let a = board.get("a").unwrap();
        assert_eq!(a.state, SourceState::Scraping);
        assert_eq!(a.last_step.as_deref(), Some("Clicking"));
        assert_eq!(a.streaming_url.as_deref(), Some("https://live/2"));

        board
            .apply(&PipelineEvent::SourceComplete {
                source_id: "a".into(),
                word_count: 10,
            })
            .unwrap();
        assert_eq!(
            board.counts(),
            BoardCounts {
                pending: 1,
                scraping: 0,
                complete: 1,
                failed: 0
            }
        );
    }

    #[test]
    fn rejects_unknown_sources_and_regressions() {
        let mut board = announced(&["a"]);
        assert!(board.apply(&PipelineEvent::scraping_started("zzz")).is_err());
        assert!(
            board
                .apply(&PipelineEvent::SourceError {
                    source_id: "a".into(),
                    error: "skipped scraping".into(),
                })
                .is_err()
        );

        board.apply(&PipelineEvent::scraping_started("a")).unwrap();
        board
            .apply(&PipelineEvent::SourceError {
                source_id: "a".into(),
                error: "boom".into(),
            })
            .unwrap();
        assert!(board.apply(&PipelineEvent::step("a", "late")).is_err());
    }

    #[test]
    fn nothing_after_terminal_run_event() {
        let mut board = SourceBoard::new();
        assert!(board.apply(&PipelineEvent::scraping_started("a")).is_err());
        board.apply(&PipelineEvent::error("Topic is required.")).unwrap();
        assert!(board.is_finished());
        assert!(board.apply(&PipelineEvent::error("again")).is_err());
    }
}
