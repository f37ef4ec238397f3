//! Error taxonomy for the decision loop.
//!
//! There is deliberately no unified error type: each boundary converts its
//! failures where they land. `ToolError` becomes an error-status tool result
//! fed back to the model, never an abort. `TransportError` is retried with
//! backoff and then ends the cycle with an error exit reason. Budget
//! exhaustion (rounds, wall clock) is not represented here at all — it is a
//! normal exit reason on the decision result.

use thiserror::Error;

/// Failures on the model-call boundary. Cloneable so a retry loop can
/// retain the last error while attempting further calls.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by model backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model call timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed model response: {0}")]
    Malformed(String),

    #[error("Transport not configured: {0}")]
    NotConfigured(String),
}

impl TransportError {
    /// Whether a retry could plausibly succeed. Auth and configuration
    /// failures are terminal; everything else is transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            TransportError::AuthenticationFailed(_) | TransportError::NotConfigured(_)
        )
    }
}

/// Failures on the tool boundary. The registry converts every one of these
/// into a `ToolResult` with error status; none of them crosses back into
/// the decision loop as an `Err`.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },
}
