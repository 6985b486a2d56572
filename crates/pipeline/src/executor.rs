//! Tool executor: resolves an invocation against the registry and runs it.

use chatrelay_core::error::ExecutionError;
use chatrelay_core::tool::{ToolInvocation, ToolRegistry};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct ToolExecutor {
    tools: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    /// Run `invocation`. Required parameters are checked against the
    /// tool's schema before the handler sees the arguments.
    pub async fn execute(&self, invocation: &ToolInvocation) -> Result<String, ExecutionError> {
        let tool = self.tools.resolve(&invocation.name).inspect_err(|_| {
            warn!(tool = %invocation.name, "Completion requested an unknown tool");
        })?;

        let schema = tool.schema();
        if let Some(missing) = schema.missing_required(&invocation.arguments).first() {
            return Err(ExecutionError::MissingArgument {
                tool: invocation.name.clone(),
                argument: (*missing).to_string(),
            });
        }

        let start = Instant::now();
        let result = tool.execute(&invocation.arguments).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(output) => debug!(tool = %invocation.name, duration_ms, output_len = output.len(), "Tool executed"),
            Err(e) => warn!(tool = %invocation.name, duration_ms, error = %e, "Tool execution failed"),
        }
        result
    }
}
