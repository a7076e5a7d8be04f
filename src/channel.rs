use crate::models::{CompletionEvent, ProgressEvent};
use tokio::sync::broadcast;

/// Buffered events per subscription before the oldest are dropped
const CHANNEL_CAPACITY: usize = 256;

/// In-process publish/subscribe channel for run events.
///
/// One instance exists per session. The transport side publishes decoded
/// `evaluation_progress` and `evaluation_complete` events; the coordinator
/// subscribes at submission time and unsubscribes at completion. Publishing
/// with no live subscriber is not an error.
#[derive(Debug, Clone)]
pub struct EventChannel {
    progress_tx: broadcast::Sender<ProgressEvent>,
    completion_tx: broadcast::Sender<CompletionEvent>,
}

impl EventChannel {
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (completion_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            progress_tx,
            completion_tx,
        }
    }

    /// Register a listener for progress events
    pub fn subscribe_progress(&self) -> Subscription<ProgressEvent> {
        Subscription {
            rx: Some(self.progress_tx.subscribe()),
        }
    }

    /// Register a listener for the completion signal
    pub fn subscribe_completion(&self) -> Subscription<CompletionEvent> {
        Subscription {
            rx: Some(self.completion_tx.subscribe()),
        }
    }

    /// Publish a progress event to all current listeners
    pub fn publish_progress(&self, event: ProgressEvent) {
        let _ = self.progress_tx.send(event);
    }

    /// Publish the completion signal to all current listeners
    pub fn publish_completion(&self, event: CompletionEvent) {
        let _ = self.completion_tx.send(event);
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one registered listener.
///
/// Events are delivered in publish order with no coalescing. Deregistering
/// is explicit and idempotent; a deregistered handle never yields again.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: Option<broadcast::Receiver<T>>,
}

impl<T: Clone> Subscription<T> {
    /// Receive the next event, or `None` once deregistered or the channel
    /// has shut down
    pub async fn recv(&mut self) -> Option<T> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscription lagged; oldest events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    /// Deregister this listener. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        self.rx = None;
    }

    /// Whether this handle is still registered
    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}
