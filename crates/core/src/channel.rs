//! Messaging gateway trait — the outbound half of a chat platform.
//!
//! Inbound messages arrive through the HTTP webhook; replies leave through
//! a `MessagingGateway` (Twilio WhatsApp, or a log-only gateway in
//! development).

use async_trait::async_trait;
use crate::error::DeliveryError;

/// The core outbound messaging trait.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Human-readable gateway name (e.g., "twilio", "log").
    fn name(&self) -> &str;

    /// Send `body` from the configured sender identity `from` to `to`.
    async fn send(&self, from: &str, to: &str, body: &str) -> Result<(), DeliveryError>;

    /// Health check — are credentials present and the gateway usable?
    async fn health_check(&self) -> Result<bool, DeliveryError> {
        Ok(true)
    }
}
