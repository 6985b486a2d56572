//! Reply resolution: dispatch an utterance and run the requested tool.
//!
//! No persistence, delivery or broadcast happens here; the exchange
//! pipeline layers those on top, and `chatrelay ask` uses this alone.

use chatrelay_core::error::{DispatchError, ExecutionError};
use chatrelay_core::exchange::CompletionOutcome;
use tracing::debug;

use crate::dispatcher::CompletionDispatcher;
use crate::exchange::Stage;
use crate::executor::ToolExecutor;

/// The reply decided for an utterance, before any side effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// Tool that produced the reply, if any.
    pub tool: Option<String>,
    /// Set when the tool failed and `text` is the diagnostic.
    pub tool_error: Option<ExecutionError>,
}

/// The text sent back when a requested tool could not run.
pub fn diagnostic_reply(err: &ExecutionError) -> String {
    format!("Sorry, I couldn't complete that request: {err}")
}

/// Dispatcher plus executor over the same tool registry.
pub struct ReplyResolver {
    dispatcher: CompletionDispatcher,
    executor: ToolExecutor,
}

impl ReplyResolver {
    pub fn new(dispatcher: CompletionDispatcher) -> Self {
        let executor = ToolExecutor::new(dispatcher.tools().clone());
        Self { dispatcher, executor }
    }

    pub fn dispatcher(&self) -> &CompletionDispatcher {
        &self.dispatcher
    }

    /// Dispatch `utterance`, then run the tool if one was requested.
    ///
    /// Tool failures are folded into a diagnostic reply; only dispatch
    /// errors surface.
    pub async fn resolve(&self, utterance: &str) -> Result<Reply, DispatchError> {
        let outcome = self.dispatcher.complete(utterance).await?;

        Ok(match outcome {
            CompletionOutcome::PlainText(text) => Reply {
                text,
                tool: None,
                tool_error: None,
            },
            CompletionOutcome::ToolCall(invocation) => {
                debug!(stage = %Stage::Executing, tool = %invocation.name);
                match self.executor.execute(&invocation).await {
                    Ok(text) => Reply {
                        text,
                        tool: Some(invocation.name),
                        tool_error: None,
                    },
                    Err(e) => Reply {
                        text: diagnostic_reply(&e),
                        tool: Some(invocation.name),
                        tool_error: Some(e),
                    },
                }
            }
        })
    }
}
