//! Event emission for the embedding UI.
//!
//! Every processed message publishes a fresh view snapshot. Clipboard
//! requests are forwarded as events because only the UI can reach the
//! system clipboard.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event type of a view snapshot.
pub const VIEW_UPDATED: &str = "ViewUpdated";

/// Event type of a clipboard request.
pub const COPY_TO_CLIPBOARD: &str = "CopyToClipboard";

/// Event type emitted once the runtime has issued its first requests.
pub const CLIENT_STARTED: &str = "ClientStarted";

/// An event emitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type name (e.g. "ViewUpdated", "CopyToClipboard").
    pub event_type: String,
    /// Monotonic sequence number assigned by the bus.
    pub sequence: u64,
    /// Unix timestamp.
    pub timestamp: u64,
    /// Type-specific payload.
    pub payload: serde_json::Value,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event_type: &str, payload: serde_json::Value) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let event = Event {
            event_type: event_type.to_string(),
            sequence,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            payload,
        };
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}
