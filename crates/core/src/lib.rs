//! # ChatRelay Core
//!
//! Domain types, collaborator traits, and error definitions for the
//! ChatRelay exchange pipeline. This crate has **zero framework
//! dependencies** — it defines the model that every other crate
//! implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (completion service, audit store,
//! messaging gateway, broadcast transport) is a trait here. Adapters
//! live in their own crates. This enables:
//! - Swapping adapters via configuration
//! - Testing the pipeline with recording/scripted collaborators
//! - A clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod exchange;
pub mod provider;
pub mod tool;
pub mod store;
pub mod channel;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role, MessageToolCall};
pub use exchange::{BroadcastEvent, CompletionOutcome, ExchangeRecord, InboundMessage};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use tool::{ParameterType, Tool, ToolInvocation, ToolParameter, ToolRegistry, ToolSchema};
pub use store::AuditStore;
pub use channel::MessagingGateway;
pub use event::{Broadcaster, EventBus, EventFrame};
