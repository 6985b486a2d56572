//! Completion dispatcher.
//!
//! Sends one utterance to the completion service together with the
//! registered tool schemas, and decides the response shape exactly once
//! into a [`CompletionOutcome`].

use chatrelay_config::CompletionConfig;
use chatrelay_core::error::DispatchError;
use chatrelay_core::exchange::CompletionOutcome;
use chatrelay_core::message::Message;
use chatrelay_core::provider::{Provider, ProviderRequest, ProviderResponse};
use chatrelay_core::tool::{ToolInvocation, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the fixed system instruction from the registry contents.
///
/// With the built-in tools this reads
/// `You have tools: summarize(text), translate(text, targetLang).`
pub fn system_instruction(tools: &ToolRegistry) -> String {
    if tools.is_empty() {
        return "You have no tools.".to_string();
    }
    let signatures: Vec<String> = tools.list_schemas().iter().map(|s| s.signature()).collect();
    format!("You have tools: {}.", signatures.join(", "))
}

/// Stateless front end to the completion service.
pub struct CompletionDispatcher {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl CompletionDispatcher {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, model: impl Into<String>) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build a dispatcher using the model settings in `config`.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        config: &CompletionConfig,
    ) -> Self {
        let mut dispatcher = Self::new(provider, tools, &config.model)
            .with_temperature(config.temperature)
            .with_timeout(Duration::from_secs(config.timeout_secs));
        dispatcher.max_tokens = config.max_tokens;
        dispatcher
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Upper bound on a single completion call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The request sent for `utterance`: system instruction, the single user
    /// turn, and every registered tool schema.
    pub fn build_request(&self, utterance: &str) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(system_instruction(&self.tools)),
                Message::user(utterance),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        }
    }

    /// Ask the completion service about `utterance`.
    pub async fn complete(&self, utterance: &str) -> Result<CompletionOutcome, DispatchError> {
        let request = self.build_request(utterance);
        debug!(
            provider = %self.provider.name(),
            model = %request.model,
            tools = request.tools.len(),
            "Dispatching completion request"
        );

        let response = match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(provider = %self.provider.name(), error = %e, "Completion call failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(provider = %self.provider.name(), timeout_secs = self.timeout.as_secs_f64(), "Completion call timed out");
                return Err(DispatchError::CompletionUnavailable(format!(
                    "no response within {:.1}s",
                    self.timeout.as_secs_f64()
                )));
            }
        };

        if let Some(usage) = &response.usage {
            debug!(model = %response.model, tokens = usage.total_tokens, "Completion usage");
        }

        let outcome = interpret(response)?;
        match &outcome {
            CompletionOutcome::PlainText(text) => info!(reply_len = text.len(), "Completion returned text"),
            CompletionOutcome::ToolCall(inv) => info!(tool = %inv.name, "Completion requested a tool"),
        }
        Ok(outcome)
    }
}

/// Classify a raw provider response.
pub fn interpret(response: ProviderResponse) -> Result<CompletionOutcome, DispatchError> {
    let message = response.message;

    match message.tool_calls.as_slice() {
        [] => Ok(CompletionOutcome::text_or_fallback(Some(message.content))),
        [call] => {
            if !message.content.trim().is_empty() {
                return Err(DispatchError::AmbiguousOutcome(format!(
                    "response carries both text and a call to '{}'",
                    call.name
                )));
            }

            let value: serde_json::Value = serde_json::from_str(&call.arguments).map_err(|e| {
                DispatchError::MalformedToolArguments {
                    tool: call.name.clone(),
                    reason: e.to_string(),
                }
            })?;

            match value {
                serde_json::Value::Object(arguments) => {
                    Ok(CompletionOutcome::ToolCall(ToolInvocation::new(&call.name, arguments)))
                }
                other => Err(DispatchError::MalformedToolArguments {
                    tool: call.name.clone(),
                    reason: format!("expected a JSON object, got {other}"),
                }),
            }
        }
        calls => {
            let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
            Err(DispatchError::AmbiguousOutcome(format!(
                "response requests {} tools at once: {}",
                calls.len(),
                names.join(", ")
            )))
        }
    }
}
