//! Single ordered outbound channel for a run's events.

use tokio::sync::mpsc;
use tracing::trace;

use guidecraft_shared::PipelineEvent;

/// Cloneable, non-blocking emitter handle.
///
/// All producers of one run share the same underlying channel, so events
/// reach the single consumer in the order they were emitted. Emitting after
/// the consumer is gone is a silent no-op.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl EventSink {
    /// Create a sink and the receiver its drain loop reads from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: PipelineEvent) {
        if self.tx.send(event).is_err() {
            trace!("event dropped, consumer went away");
        }
    }

    /// Whether the consumer has hung up.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let (sink, mut rx) = EventSink::channel();
        let other = sink.clone();
        sink.emit(PipelineEvent::scraping_started("a"));
        other.emit(PipelineEvent::scraping_started("b"));
        sink.emit(PipelineEvent::error("done"));
        drop((sink, other));

        let mut ids = Vec::new();
        while let Some(event) = rx.recv().await {
            ids.push(event.source_id().unwrap_or("-").to_string());
        }
        assert_eq!(ids, vec!["a", "b", "-"]);
    }

    #[test]
    fn emit_after_consumer_drop_is_harmless() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        assert!(sink.is_closed());
        sink.emit(PipelineEvent::error("ignored"));
    }
}
