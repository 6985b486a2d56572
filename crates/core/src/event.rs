//! Real-time broadcast of completed exchanges.
//!
//! Observers (WebSocket clients) subscribe to the [`EventBus`] and receive
//! every [`EventFrame`] published after they subscribed. Nothing is
//! replayed to late subscribers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use crate::error::BroadcastError;
use crate::exchange::BroadcastEvent;

/// Channel name for completed exchanges.
pub const NEW_MESSAGE_EVENT: &str = "new_message";

/// Channel name for the greeting sent to each new observer.
pub const STATUS_EVENT: &str = "status";

/// One named event as delivered to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    pub event: String,
    pub data: serde_json::Value,
}

impl EventFrame {
    /// The status frame sent once at connection time.
    pub fn status(msg: impl Into<String>) -> Self {
        Self {
            event: STATUS_EVENT.to_string(),
            data: serde_json::json!({ "msg": msg.into() }),
        }
    }
}

/// The outbound broadcast contract used by the pipeline.
///
/// Publishing is fire-and-forget: the return value is the number of
/// observers the frame was handed to, never an acknowledgement.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, channel: &str, event: &BroadcastEvent) -> Result<usize, BroadcastError>;
}

/// A broadcast-based event bus.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. Slow
/// subscribers lag and lose frames rather than blocking publishers.
pub struct EventBus {
    sender: broadcast::Sender<Arc<EventFrame>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a frame to all current subscribers.
    pub fn publish_frame(&self, frame: EventFrame) -> usize {
        // No subscribers is not an error
        self.sender.send(Arc::new(frame)).unwrap_or(0)
    }

    /// Subscribe to receive frames.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<EventFrame>> {
        self.sender.subscribe()
    }

    /// Number of currently connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Broadcaster for EventBus {
    fn publish(&self, channel: &str, event: &BroadcastEvent) -> Result<usize, BroadcastError> {
        let data = serde_json::to_value(event).map_err(|e| BroadcastError::Encoding(e.to_string()))?;
        Ok(self.publish_frame(EventFrame {
            event: channel.to_string(),
            data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::InboundMessage;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let msg = InboundMessage::new("whatsapp:+1", "hello");
        let delivered = bus
            .publish(NEW_MESSAGE_EVENT, &BroadcastEvent::new(&msg, "hi there"))
            .unwrap();
        assert_eq!(delivered, 1);

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.event, "new_message");
        assert_eq!(frame.data["from"], "whatsapp:+1");
        assert_eq!(frame.data["reply"], "hi there");
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new(16);
        let msg = InboundMessage::new("a", "b");
        assert_eq!(bus.publish(NEW_MESSAGE_EVENT, &BroadcastEvent::new(&msg, "c")).unwrap(), 0);
    }

    #[tokio::test]
    async fn late_subscribers_miss_earlier_events() {
        let bus = EventBus::new(16);
        bus.publish_frame(EventFrame::status("early"));
        let mut rx = bus.subscribe();
        bus.publish_frame(EventFrame::status("late"));
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.data["msg"], "late");
    }
}
