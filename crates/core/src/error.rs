//! Error types for the ChatRelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each pipeline stage has its own error enum; only [`DispatchError`]
//! is fatal for an exchange.

use thiserror::Error;

/// The top-level error type for all ChatRelay operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Dispatch errors (fatal for an exchange) ---
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    // --- Tool execution errors ---
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    // --- Side-effect errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Broadcast error: {0}")]
    Broadcast(#[from] BroadcastError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by a completion provider adapter.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Fatal failures of the completion dispatch step.
///
/// Any of these aborts the exchange before a side effect happens.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("Malformed arguments for tool '{tool}': {reason}")]
    MalformedToolArguments { tool: String, reason: String },

    #[error("Completion service unavailable: {0}")]
    CompletionUnavailable(String),

    #[error("Ambiguous completion: {0}")]
    AmbiguousOutcome(String),
}

impl DispatchError {
    /// Short machine-readable tag for logs and error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedToolArguments { .. } => "malformed_tool_arguments",
            Self::CompletionUnavailable(_) => "completion_unavailable",
            Self::AmbiguousOutcome(_) => "ambiguous_outcome",
        }
    }
}

impl From<ProviderError> for DispatchError {
    fn from(err: ProviderError) -> Self {
        Self::CompletionUnavailable(err.to_string())
    }
}

/// Recoverable failures of the tool execution step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing argument '{argument}' for tool '{tool}'")]
    MissingArgument { tool: String, argument: String },

    #[error("Tool '{tool}' failed: {reason}")]
    HandlerFailed { tool: String, reason: String },
}

/// Audit-store failures. Logged, never fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Messaging-gateway failures. Logged, never fatal.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Gateway not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery to {destination} failed: {reason}")]
    DeliveryFailed { destination: String, reason: String },

    #[error("Gateway rejected message (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Broadcast-transport failures. Logged, never fatal.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("Failed to encode event: {0}")]
    Encoding(String),

    #[error("Broadcast transport closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_becomes_unavailable() {
        let err: DispatchError = ProviderError::ApiError {
            status_code: 503,
            message: "upstream down".into(),
        }
        .into();
        assert!(matches!(err, DispatchError::CompletionUnavailable(_)));
        assert!(err.to_string().contains("503"));
        assert_eq!(err.kind(), "completion_unavailable");
    }

    #[test]
    fn execution_error_displays_correctly() {
        let err = Error::Execution(ExecutionError::MissingArgument {
            tool: "translate".into(),
            argument: "targetLang".into(),
        });
        assert!(err.to_string().contains("translate"));
        assert!(err.to_string().contains("targetLang"));
    }
}
