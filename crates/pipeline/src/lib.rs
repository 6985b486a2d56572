//! The ChatRelay exchange pipeline.
//!
//! Each inbound message goes through one stateless pass:
//!
//! 1. **Dispatch** the body to the completion service with the tool schemas
//! 2. **Execute** the requested tool, if any (failures become a diagnostic reply)
//! 3. **Persist** an exchange record
//! 4. **Deliver** the reply through the messaging gateway
//! 5. **Broadcast** the exchange to live observers
//!
//! Only step 1 can fail the exchange. Steps 3 to 5 run on a spawned task,
//! so by default the caller waits only for the reply text.

pub mod dispatcher;
pub mod exchange;
pub mod executor;
pub mod reply;

#[cfg(test)]
mod test_helpers;

pub use dispatcher::{CompletionDispatcher, system_instruction};
pub use exchange::{ExchangeOutcome, ExchangePipeline, SideEffectMode, SideEffectReport, SideEffects, Stage};
pub use executor::ToolExecutor;
pub use reply::{Reply, ReplyResolver, diagnostic_reply};
