//! Defines an abstraction over the event sending mechanism.

use super::events::PipelineEvent;
use tokio::sync::mpsc::UnboundedSender;

/// A trait that abstracts the sending of pipeline events.
/// This is "fire-and-forget" and doesn't return a result, simplifying its use.
pub trait EventSink: Send + Sync + Clone + 'static {
    fn send_event(&self, event: PipelineEvent);
}

impl EventSink for UnboundedSender<PipelineEvent> {
    fn send_event(&self, event: PipelineEvent) {
        // A closed receiver means the host is gone; there is nobody left to tell.
        if let Err(e) = self.send(event) {
            tracing::warn!("Failed to deliver pipeline event: {:?}", e.0);
        }
    }
}
