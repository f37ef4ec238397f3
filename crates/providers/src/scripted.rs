//! Scripted transport — deterministic canned responses, no network.
//!
//! Each `complete()` call consumes the next scripted step. Used by the
//! engine and scheduler tests to drive every loop path (tool rounds,
//! transport failures, round-cap exhaustion) and by `ask --dry-run` to
//! exercise the wiring without spending tokens.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use verdant_core::error::TransportError;
use verdant_core::message::{Message, MessageToolCall};
use verdant_core::transport::{ModelTransport, TokenUsage, TransportRequest, TransportResponse};

/// One scripted model turn.
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    /// Free text, no tool calls — ends the cycle naturally.
    Text(String),
    /// Request tool calls.
    ToolCalls(Vec<MessageToolCall>),
    /// Fail the call with a transport error.
    Fail(TransportError),
}

/// What the transport saw in one request. Recorded so tests can assert on
/// conversation growth and on the tool catalogue (e.g., that the no-tool
/// fallback call really disabled tools).
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub message_count: usize,
    pub tool_count: usize,
    /// Content of the leading system message, when present
    pub system_content: Option<String>,
}

/// A transport that replays a fixed script.
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<ScriptedStep>>,
    requests: Mutex<Vec<SeenRequest>>,
    /// Returned when the script runs out
    exhausted_text: String,
    /// Usage reported per successful call
    usage: TokenUsage,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            exhausted_text: "Nothing further to report.".into(),
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 25,
                total_tokens: 125,
            },
        }
    }

    /// Append a step to the script.
    pub fn then(self, step: ScriptedStep) -> Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    /// Append a free-text step.
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then(ScriptedStep::Text(text.into()))
    }

    /// Append a step requesting a single tool call.
    pub fn then_tool_call(self, id: &str, name: &str, arguments: &str) -> Self {
        self.then(ScriptedStep::ToolCalls(vec![tool_call(id, name, arguments)]))
    }

    /// Append a failing step.
    pub fn then_fail(self, error: TransportError) -> Self {
        self.then(ScriptedStep::Fail(error))
    }

    /// Override the per-call token usage.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Every request seen so far.
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of completed (non-failing) and failing calls seen.
    pub fn calls_seen(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a `MessageToolCall` with raw argument text.
pub fn tool_call(id: &str, name: &str, arguments: &str) -> MessageToolCall {
    MessageToolCall {
        id: id.into(),
        name: name.into(),
        arguments: arguments.into(),
    }
}

#[async_trait]
impl ModelTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(SeenRequest {
            message_count: request.messages.len(),
            tool_count: request.tools.len(),
            system_content: request
                .messages
                .first()
                .filter(|m| m.role == verdant_core::message::Role::System)
                .map(|m| m.content.clone()),
        });

        let step = self.steps.lock().unwrap().pop_front();
        let message = match step {
            Some(ScriptedStep::Text(text)) => Message::assistant(text),
            Some(ScriptedStep::ToolCalls(calls)) => Message::assistant_with_tools("", calls),
            Some(ScriptedStep::Fail(error)) => return Err(error),
            None => Message::assistant(self.exhausted_text.clone()),
        };

        Ok(TransportResponse {
            message,
            usage: Some(self.usage),
            model: "scripted".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(messages: Vec<Message>) -> TransportRequest {
        TransportRequest {
            model: "scripted".into(),
            messages,
            temperature: 0.0,
            max_tokens: None,
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn steps_replay_in_order() {
        let transport = ScriptedTransport::new()
            .then_tool_call("call_1", "read_sensor", r#"{"sensor":"ph"}"#)
            .then_text("pH is fine.");

        let r1 = transport.complete(request(vec![Message::user("check ph")])).await.unwrap();
        assert_eq!(r1.message.tool_calls.len(), 1);
        assert_eq!(r1.message.tool_calls[0].name, "read_sensor");

        let r2 = transport.complete(request(vec![])).await.unwrap();
        assert!(r2.message.tool_calls.is_empty());
        assert_eq!(r2.message.content, "pH is fine.");
    }

    #[tokio::test]
    async fn exhausted_script_returns_fallback_text() {
        let transport = ScriptedTransport::new();
        let r = transport.complete(request(vec![])).await.unwrap();
        assert_eq!(r.message.content, "Nothing further to report.");
    }

    #[tokio::test]
    async fn failing_step_returns_error() {
        let transport =
            ScriptedTransport::new().then_fail(TransportError::Network("boom".into()));
        let err = transport.complete(request(vec![])).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[tokio::test]
    async fn records_seen_requests() {
        let transport = ScriptedTransport::new().then_text("ok");
        transport
            .complete(request(vec![Message::system("sys"), Message::user("hi")]))
            .await
            .unwrap();
        let seen = transport.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message_count, 2);
        assert_eq!(seen[0].tool_count, 0);
    }
}
