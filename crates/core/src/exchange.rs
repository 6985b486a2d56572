//! Exchange domain types.
//!
//! An exchange is one inbound message and everything that happens to it:
//! InboundMessage → CompletionOutcome → reply → ExchangeRecord + BroadcastEvent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::ToolInvocation;

/// Fixed reply used when the completion service returns no text at all.
pub const NO_CONTENT_FALLBACK: &str = "(no content)";

/// A message received from the messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Channel-specific sender identity (e.g. `whatsapp:+15551234567`)
    pub sender: String,

    /// The message text, already trimmed by the transport
    pub body: String,
}

impl InboundMessage {
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
        }
    }
}

/// What the completion service decided to do with an utterance.
///
/// Decided once at the dispatch boundary and never re-inspected.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// A direct textual answer (never empty)
    PlainText(String),

    /// A request to run a registered tool
    ToolCall(ToolInvocation),
}

impl CompletionOutcome {
    /// Build a `PlainText` outcome, substituting the fallback for empty text.
    pub fn text_or_fallback(content: Option<String>) -> Self {
        match content {
            Some(text) if !text.is_empty() => Self::PlainText(text),
            _ => Self::PlainText(NO_CONTENT_FALLBACK.to_string()),
        }
    }
}

/// The append-only audit record of one completed exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    /// Unique record ID
    pub id: String,

    /// Who sent the inbound message
    pub sender: String,

    /// The inbound body as received
    pub input_body: String,

    /// The reply that was sent back
    pub output_body: String,

    /// When the reply was finalized
    pub timestamp: DateTime<Utc>,
}

impl ExchangeRecord {
    /// Create a record for `msg` answered with `reply`, stamped now.
    pub fn new(msg: &InboundMessage, reply: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: msg.sender.clone(),
            input_body: msg.body.clone(),
            output_body: reply.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The payload pushed to live observers after an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub from: String,
    pub body: String,
    pub reply: String,
}

impl BroadcastEvent {
    pub fn new(msg: &InboundMessage, reply: impl Into<String>) -> Self {
        Self {
            from: msg.sender.clone(),
            body: msg.body.clone(),
            reply: reply.into(),
        }
    }
}
