//! The exchange pipeline.
//!
//! One inbound message flows through:
//!
//! ```text
//! Received → Dispatching → (Executing)? → Persisting → Delivering → Broadcasting → Completed
//! ```
//!
//! Only `Dispatching` can fail the exchange. Tool failures become a
//! diagnostic reply, and side-effect failures are logged and reported
//! without touching the reply.
//!
//! Persist, deliver and broadcast always run in order on their own task, so
//! an exchange finishes even when the caller that started it goes away.

use chatrelay_core::channel::MessagingGateway;
use chatrelay_core::error::{DispatchError, ExecutionError};
use chatrelay_core::event::{Broadcaster, NEW_MESSAGE_EVENT};
use chatrelay_core::exchange::{BroadcastEvent, ExchangeRecord, InboundMessage};
use chatrelay_core::store::AuditStore;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dispatcher::CompletionDispatcher;
use crate::reply::{Reply, ReplyResolver};

/// Where an exchange currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Dispatching,
    Executing,
    Persisting,
    Delivering,
    Broadcasting,
    Completed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Dispatching => "dispatching",
            Self::Executing => "executing",
            Self::Persisting => "persisting",
            Self::Delivering => "delivering",
            Self::Broadcasting => "broadcasting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Whether `process_exchange` waits for persist, deliver and broadcast.
///
/// Either way they run on one spawned task; only the caller's wait differs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SideEffectMode {
    /// Wait for the side-effect task before returning.
    Awaited,
    /// Return as soon as the reply is known.
    #[default]
    Detached,
}

/// Failures of the non-fatal stages, as display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SideEffectReport {
    pub store_error: Option<String>,
    pub delivery_error: Option<String>,
    pub broadcast_error: Option<String>,
    /// Observers the event was handed to.
    pub observers: usize,
}

impl SideEffectReport {
    pub fn is_clean(&self) -> bool {
        self.store_error.is_none() && self.delivery_error.is_none() && self.broadcast_error.is_none()
    }
}

/// Side effects of one exchange, finished or still running.
#[derive(Debug)]
pub enum SideEffects {
    Finished(SideEffectReport),
    Running(JoinHandle<SideEffectReport>),
}

impl SideEffects {
    /// The report, if the side effects have already been waited for.
    pub fn report(&self) -> Option<&SideEffectReport> {
        match self {
            Self::Finished(report) => Some(report),
            Self::Running(_) => None,
        }
    }

    /// Wait for the side effects to finish.
    ///
    /// `None` only if the task panicked or the runtime shut down.
    pub async fn wait(self) -> Option<SideEffectReport> {
        match self {
            Self::Finished(report) => Some(report),
            Self::Running(handle) => match handle.await {
                Ok(report) => Some(report),
                Err(e) => {
                    error!(error = %e, "Side-effect task did not finish");
                    None
                }
            },
        }
    }
}

/// The caller-visible result of an exchange.
#[derive(Debug)]
pub struct ExchangeOutcome {
    pub message_sent: String,
    pub reply: String,
    pub tool: Option<String>,
    pub tool_error: Option<ExecutionError>,
    pub side_effects: SideEffects,
}

/// Collaborators for the persist → deliver → broadcast tail.
#[derive(Clone)]
struct EffectSinks {
    store: Arc<dyn AuditStore>,
    gateway: Arc<dyn MessagingGateway>,
    broadcaster: Arc<dyn Broadcaster>,
    sender_identity: Arc<str>,
}

impl EffectSinks {
    /// Run the tail on its own task. Dropping the handle does not stop it.
    fn spawn(&self, msg: InboundMessage, reply: String) -> JoinHandle<SideEffectReport> {
        let sinks = self.clone();
        tokio::spawn(async move {
            let report = sinks.run(&msg, &reply).await;
            debug!(sender = %msg.sender, clean = report.is_clean(), "Side effects finished");
            report
        })
    }

    async fn run(&self, msg: &InboundMessage, reply: &str) -> SideEffectReport {
        let mut report = SideEffectReport::default();

        debug!(stage = %Stage::Persisting, sender = %msg.sender, store = %self.store.name());
        let record = ExchangeRecord::new(msg, reply);
        let record_id = record.id.clone();
        match self.store.append(record).await {
            Ok(()) => debug!(record_id = %record_id, "Exchange persisted"),
            Err(e) => {
                error!(stage = %Stage::Persisting, sender = %msg.sender, error = %e, "Failed to persist exchange");
                report.store_error = Some(e.to_string());
            }
        }

        debug!(stage = %Stage::Delivering, sender = %msg.sender, gateway = %self.gateway.name());
        if let Err(e) = self.gateway.send(&self.sender_identity, &msg.sender, reply).await {
            error!(stage = %Stage::Delivering, sender = %msg.sender, error = %e, "Failed to deliver reply");
            report.delivery_error = Some(e.to_string());
        }

        debug!(stage = %Stage::Broadcasting, sender = %msg.sender);
        match self.broadcaster.publish(NEW_MESSAGE_EVENT, &BroadcastEvent::new(msg, reply)) {
            Ok(observers) => report.observers = observers,
            Err(e) => {
                warn!(stage = %Stage::Broadcasting, sender = %msg.sender, error = %e, "Failed to broadcast exchange");
                report.broadcast_error = Some(e.to_string());
            }
        }

        report
    }
}

/// Runs inbound messages through dispatch, execution and side effects.
///
/// Holds no per-message state; one instance serves every request.
pub struct ExchangePipeline {
    resolver: ReplyResolver,
    sinks: EffectSinks,
    mode: SideEffectMode,
}

impl ExchangePipeline {
    pub fn new(
        dispatcher: CompletionDispatcher,
        store: Arc<dyn AuditStore>,
        gateway: Arc<dyn MessagingGateway>,
        broadcaster: Arc<dyn Broadcaster>,
        sender_identity: impl Into<String>,
    ) -> Self {
        Self {
            resolver: ReplyResolver::new(dispatcher),
            sinks: EffectSinks {
                store,
                gateway,
                broadcaster,
                sender_identity: Arc::from(sender_identity.into()),
            },
            mode: SideEffectMode::default(),
        }
    }

    pub fn with_side_effect_mode(mut self, mode: SideEffectMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn side_effect_mode(&self) -> SideEffectMode {
        self.mode
    }

    pub fn dispatcher(&self) -> &CompletionDispatcher {
        self.resolver.dispatcher()
    }

    /// Decide the reply for `utterance` without any side effect.
    pub async fn resolve_reply(&self, utterance: &str) -> Result<Reply, DispatchError> {
        self.resolver.resolve(utterance).await
    }

    /// Process one inbound message end to end.
    ///
    /// A `DispatchError` means no side effect was attempted.
    pub async fn process_exchange(&self, msg: InboundMessage) -> Result<ExchangeOutcome, DispatchError> {
        info!(stage = %Stage::Received, sender = %msg.sender, body_len = msg.body.len(), "Inbound message");

        debug!(stage = %Stage::Dispatching, sender = %msg.sender);
        let reply = match self.resolve_reply(&msg.body).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(stage = %Stage::Failed, sender = %msg.sender, kind = e.kind(), error = %e, "Exchange failed");
                return Err(e);
            }
        };

        let handle = self.sinks.spawn(msg.clone(), reply.text.clone());
        let side_effects = match self.mode {
            SideEffectMode::Awaited => match handle.await {
                Ok(report) => SideEffects::Finished(report),
                Err(e) => {
                    error!(sender = %msg.sender, error = %e, "Side-effect task did not finish");
                    let reason = Some(format!("side-effect task failed: {e}"));
                    SideEffects::Finished(SideEffectReport {
                        store_error: reason.clone(),
                        delivery_error: reason.clone(),
                        broadcast_error: reason,
                        observers: 0,
                    })
                }
            },
            SideEffectMode::Detached => SideEffects::Running(handle),
        };

        info!(stage = %Stage::Completed, sender = %msg.sender, tool = ?reply.tool, "Exchange completed");

        Ok(ExchangeOutcome {
            message_sent: msg.body,
            reply: reply.text,
            tool: reply.tool,
            tool_error: reply.tool_error,
            side_effects,
        })
    }
}
