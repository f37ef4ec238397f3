//! Message and Conversation domain types.
//!
//! A conversation is the working state of exactly one decision cycle: it is
//! seeded at cycle start, grows monotonically as the model reasons and tools
//! report back, and is discarded when the cycle produces its result. Nothing
//! here persists across cycles — long-term memory is a collaborator the
//! model queries through a tool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions and the injected context snapshot
    System,
    /// The trigger's query or seed
    User,
    /// The model
    Assistant,
    /// A tool execution result
    Tool,
}

/// A tool call as it arrives from the model: arguments are raw text that
/// may or may not parse as JSON. Parsing and validation happen in the
/// registry, never here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Model-assigned ID, echoed back on the matching tool message
    pub id: String,

    /// Tool name as the model spelled it
    pub name: String,

    /// Arguments as a raw JSON string
    pub arguments: String,
}

/// One message in a cycle's conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Per-message UUID
    pub id: String,

    /// Sender role
    pub role: Role,

    /// Free-text content (may be empty on tool-call-only messages)
    pub content: String,

    /// Pending tool calls (assistant messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool message, the one prior tool call it answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message with no pending tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message carrying pending tool calls.
    pub fn assistant_with_tools(
        content: impl Into<String>,
        tool_calls: Vec<MessageToolCall>,
    ) -> Self {
        let mut msg = Self::new(Role::Assistant, content);
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a tool message answering exactly one prior tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }
}

/// The ordered message sequence of one decision cycle.
///
/// Exclusively owned by the running cycle; grows monotonically and is
/// dropped with the cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Messages in arrival order
    pub messages: Vec<Message>,

    /// When this conversation was seeded
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Start an empty conversation.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append one message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The most recent assistant free-text content, if any. Used as the
    /// best-available partial answer when a cycle times out.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && !m.content.is_empty())
            .map(|m| m.content.as_str())
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("How is the basil doing?");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "How is the basil doing?");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn tool_result_correlates_to_call() {
        let msg = Message::tool_result("call_7", "22.5");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
    }

    #[test]
    fn conversation_grows_monotonically() {
        let mut conv = Conversation::new();
        conv.push(Message::system("You are a plant-care agent"));
        conv.push(Message::user("status?"));
        assert_eq!(conv.messages.len(), 2);
    }

    #[test]
    fn last_assistant_text_skips_tool_call_only_messages() {
        let mut conv = Conversation::new();
        conv.push(Message::assistant("Checking soil moisture first."));
        conv.push(Message::assistant_with_tools(
            "",
            vec![MessageToolCall {
                id: "call_1".into(),
                name: "read_sensor".into(),
                arguments: "{}".into(),
            }],
        ));
        assert_eq!(
            conv.last_assistant_text(),
            Some("Checking soil moisture first.")
        );
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::user("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "Test message");
        assert_eq!(deserialized.role, Role::User);
    }
}
