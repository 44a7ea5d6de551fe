use serde::Serialize;
use tokio::sync::broadcast;

/// Best-effort notifications emitted after progress-affecting operations.
/// The scrobble/sync collaborator subscribes to the read/unread transitions;
/// nobody listening is not an error.
#[derive(Debug, Clone, Serialize)]
pub enum ProgressEvent {
    ProgressUpdated {
        user_id: i64,
        series_id: i64,
        chapter_id: i64,
        pages_read: i32,
    },
    ChaptersMarkedRead {
        user_id: i64,
        series_id: i64,
        chapter_ids: Vec<i64>,
    },
    ChaptersMarkedUnread {
        user_id: i64,
        series_id: i64,
        chapter_ids: Vec<i64>,
    },
}

#[derive(Clone)]
pub struct EventSink {
    tx: broadcast::Sender<ProgressEvent>,
}

impl EventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget. A send failure means no subscriber is attached and
    /// must never fail the operation that produced the event.
    pub fn publish(&self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Progress event dropped: no subscribers");
        }
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new(64)
    }
}
