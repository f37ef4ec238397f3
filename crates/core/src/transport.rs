//! Model transport trait — the abstraction over LLM backends.
//!
//! A transport knows how to send one conversation (plus the tool catalogue)
//! to a model and return the complete response: free text, requested tool
//! calls, and token usage. The decision engine calls `complete()` without
//! knowing which backend is behind it.

use crate::error::TransportError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// One model call.
///
/// An empty `tools` catalogue disables tool calling — the engine uses this
/// for the forced no-tool fallback call when the round budget is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportRequest {
    /// The model to use (e.g., "anthropic/claude-sonnet-4")
    pub model: String,

    /// The full conversation so far
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the model may call this round (empty = tool calling disabled)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

/// Token usage for one model call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete response from a transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportResponse {
    /// The generated assistant message (free text + requested tool calls)
    pub message: Message,

    /// Token usage, when the backend reports it
    pub usage: Option<TokenUsage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// The model-call boundary.
///
/// Failures here are the retryable kind: the engine retries a small fixed
/// number of times with backoff before aborting the cycle.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// A human-readable name for this transport (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;

    /// List available models for this backend.
    async fn list_models(&self) -> std::result::Result<Vec<String>, TransportError> {
        Ok(Vec::new())
    }

    /// Health check — can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, TransportError> {
        Ok(true)
    }
}
