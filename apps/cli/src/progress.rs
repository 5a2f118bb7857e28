//! Terminal progress for `guidecraft generate`.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use guidecraft_core::{BoardCounts, SourceBoard};
use guidecraft_shared::PipelineEvent;

/// Spinner driven by the pipeline's event stream.
pub(crate) struct CliProgress {
    spinner: ProgressBar,
    board: SourceBoard,
}

impl CliProgress {
    pub(crate) fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let ticks = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&ticks),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self::with_spinner(spinner)
    }

    fn with_spinner(spinner: ProgressBar) -> Self {
        Self {
            spinner,
            board: SourceBoard::new(),
        }
    }

    pub(crate) fn apply(&mut self, event: &PipelineEvent) {
        if let Err(e) = self.board.apply(event) {
            debug!(error = %e, "ignoring out-of-order event");
        }

        match event {
            PipelineEvent::Phase { message, .. } => self.spinner.set_message(message.clone()),
            PipelineEvent::DiscoveryComplete { sources } => {
                for source in sources {
                    self.spinner.println(format!(
                        "  [{}] {}  {}",
                        source.category.as_str(),
                        source.title,
                        source.url
                    ));
                }
            }
            PipelineEvent::SourceUpdate {
                source_id,
                streaming_url: Some(_),
                ..
            } => {
                if let Some(line) = self.preview_line(source_id) {
                    self.spinner.println(line);
                }
            }
            PipelineEvent::SourceUpdate { source_id, .. } => {
                self.spinner.set_message(self.status_line(source_id));
            }
            PipelineEvent::SourceComplete { source_id, word_count } => {
                let title = self.title_of(source_id);
                self.spinner
                    .println(format!("  ✓ {title} ({word_count} words)"));
            }
            PipelineEvent::SourceError { source_id, error } => {
                let title = self.title_of(source_id);
                self.spinner.println(format!("  ✗ {title}: {error}"));
            }
            PipelineEvent::GuideChunk { .. } => {}
            PipelineEvent::Complete { .. } => self.spinner.finish_and_clear(),
            PipelineEvent::Error { message } => {
                self.spinner.finish_and_clear();
                eprintln!("  Error: {message}");
            }
        }
    }

    pub(crate) fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }

    /// `[done/total] title: latest step` for one source, read from the board.
    fn status_line(&self, source_id: &str) -> String {
        let step = self
            .board
            .get(source_id)
            .and_then(|entry| entry.last_step.as_deref())
            .unwrap_or("started");
        format!("{} {}: {step}", self.tally(), self.title_of(source_id))
    }

    fn preview_line(&self, source_id: &str) -> Option<String> {
        let url = self.board.get(source_id)?.streaming_url.as_deref()?;
        Some(format!("  ◉ {} live preview: {url}", self.title_of(source_id)))
    }

    fn title_of(&self, source_id: &str) -> String {
        self.board
            .get(source_id)
            .map(|entry| entry.source.title.clone())
            .unwrap_or_else(|| source_id.to_string())
    }

    fn tally(&self) -> String {
        let BoardCounts {
            pending,
            scraping,
            complete,
            failed,
        } = self.board.counts();
        let total = pending + scraping + complete + failed;
        format!("[{}/{total}]", complete + failed)
    }
}
