//! Log-only gateway for development.
//!
//! Used when no Twilio credentials are configured. Every reply is logged;
//! a gateway built with [`LogGateway::recording`] also keeps what it sent
//! so tests can inspect it.

use async_trait::async_trait;
use chatrelay_core::channel::MessagingGateway;
use chatrelay_core::error::DeliveryError;
use std::sync::Mutex;
use tracing::info;

/// A reply that would have been sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub from: String,
    pub to: String,
    pub body: String,
}

#[derive(Default)]
pub struct LogGateway {
    /// `None` unless built with `recording()`.
    sent: Option<Mutex<Vec<SentMessage>>>,
}

impl LogGateway {
    /// Log replies and keep nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log replies and remember them, for tests and local tooling.
    pub fn recording() -> Self {
        Self {
            sent: Some(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of every message sent so far, oldest first.
    ///
    /// Always empty for a non-recording gateway.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .as_ref()
            .and_then(|sent| sent.lock().ok().map(|s| s.clone()))
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessagingGateway for LogGateway {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, from: &str, to: &str, body: &str) -> Result<(), DeliveryError> {
        info!(from = %from, to = %to, body = %body, "Reply (log gateway, not delivered)");

        let Some(sent) = &self.sent else {
            return Ok(());
        };
        let mut sent = sent.lock().map_err(|_| DeliveryError::DeliveryFailed {
            destination: to.to_string(),
            reason: "log gateway poisoned".into(),
        })?;
        sent.push(SentMessage {
            from: from.to_string(),
            to: to.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
