//! OpenAI-compatible transport.
//!
//! One implementation covers most hosted and local backends (OpenRouter,
//! OpenAI, Ollama, vLLM, Together AI): anything exposing a
//! `/v1/chat/completions` endpoint with function calling. The decision cycle
//! is strictly request/response, so no streaming support is carried here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use verdant_core::error::TransportError;
use verdant_core::message::{Message, MessageToolCall, Role};
use verdant_core::transport::{
    ModelTransport, TokenUsage, ToolDefinition, TransportRequest, TransportResponse,
};

/// A transport speaking the OpenAI chat-completions wire format.
pub struct OpenAiCompatTransport {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatTransport {
    /// Build a transport against an arbitrary base URL. The timeout applies
    /// per HTTP request; the engine layers its own per-call budget on top.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// OpenRouter, the default hosted backend.
    pub fn openrouter(api_key: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key, timeout)
    }

    /// A local Ollama instance. Ollama ignores the bearer token but the
    /// header must still be present.
    pub fn ollama(base_url: Option<&str>, timeout: Duration) -> Result<Self, TransportError> {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama",
            timeout,
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

/// Map a non-200 status to the transport error taxonomy.
fn status_to_error(status: u16, body: String) -> TransportError {
    match status {
        429 => TransportError::RateLimited { retry_after_secs: 5 },
        401 | 403 => TransportError::AuthenticationFailed(
            "backend rejected the API key or the request scope".into(),
        ),
        _ => TransportError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

#[async_trait]
impl ModelTransport for OpenAiCompatTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest::from_transport(&request);

        debug!(transport = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(e.to_string())
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model backend returned error");
            return Err(status_to_error(status, error_body));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(format!("unparseable response body: {e}")))?;
        completion.into_transport_response()
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, TransportError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let listing: ModelListing = response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(format!("unparseable model list: {e}")))?;
        Ok(listing.data.into_iter().map(|m| m.id).collect())
    }

    async fn health_check(&self) -> std::result::Result<bool, TransportError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// ── Wire types ──────────────────────────────────────────────────────────────

/// The request body. Serialized directly; `tools` is omitted entirely when
/// empty, which is how the fallback round disables tool calling.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

impl ChatRequest {
    fn from_transport(request: &TransportRequest) -> Self {
        Self {
            model: request.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature,
            stream: false,
            max_tokens: request.max_tokens,
            tools: request.tools.iter().map(WireTool::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&Message> for WireMessage {
    fn from(m: &Message) -> Self {
        let role = match m.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        let tool_calls = if m.tool_calls.is_empty() {
            None
        } else {
            Some(m.tool_calls.iter().map(WireToolCall::from).collect())
        };
        Self {
            role: role.into(),
            content: Some(m.content.clone()),
            tool_calls,
            tool_call_id: m.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    r#type: String,
    function: WireFunctionCall,
}

impl From<&MessageToolCall> for WireToolCall {
    fn from(tc: &MessageToolCall) -> Self {
        Self {
            id: tc.id.clone(),
            r#type: "function".into(),
            function: WireFunctionCall {
                name: tc.name.clone(),
                arguments: tc.arguments.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    r#type: String,
    function: WireFunctionDef,
}

impl From<&ToolDefinition> for WireTool {
    fn from(t: &ToolDefinition) -> Self {
        Self {
            r#type: "function".into(),
            function: WireFunctionDef {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

impl ChatCompletion {
    fn into_transport_response(self) -> Result<TransportResponse, TransportError> {
        let usage = self.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::Malformed("response carried no choices".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| MessageToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(TransportResponse {
            message: Message::assistant_with_tools(
                choice.message.content.unwrap_or_default(),
                tool_calls,
            ),
            usage,
            model: self.model,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelListing {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}
