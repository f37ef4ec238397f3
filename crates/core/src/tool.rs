//! Tool contract, registry, and executor.
//!
//! Tools are what let the agent act in the world: read sensors, drive
//! actuators, query its journal, fetch data. Each tool declares a typed
//! argument schema; the registry validates arguments against it, invokes the
//! handler at most once per call, captures every failure as an error-status
//! result, and truncates payloads to a fixed ceiling before they re-enter
//! the conversation. Nothing on this boundary ever propagates an `Err` back
//! into the decision loop — the model sees its own tool failures and may
//! adapt.

use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::transport::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// Byte ceiling applied to successful tool payloads before they are placed
/// into the conversation. Bounds context growth across rounds.
pub const MAX_PAYLOAD_BYTES: usize = 3072;

/// Marker appended to a payload that was cut at the ceiling, so the model
/// knows it is looking at a prefix.
pub const TRUNCATION_MARKER: &str = "\n…[payload truncated]";

// ── Argument schema ─────────────────────────────────────────────────────────

/// Coarse argument types the executor can check before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ArgKind {
    fn json_type(&self) -> &'static str {
        match self {
            ArgKind::String => "string",
            ArgKind::Integer => "integer",
            ArgKind::Number => "number",
            ArgKind::Boolean => "boolean",
            ArgKind::Object => "object",
            ArgKind::Array => "array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            ArgKind::String => value.is_string(),
            ArgKind::Integer => value.is_i64() || value.is_u64(),
            ArgKind::Number => value.is_number(),
            ArgKind::Boolean => value.is_boolean(),
            ArgKind::Object => value.is_object(),
            ArgKind::Array => value.is_array(),
        }
    }
}

/// One declared argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgKind,
    pub required: bool,
    pub description: String,
}

/// A tool's declared argument schema.
///
/// The JSON Schema object sent to the model is derived from this, and the
/// executor validates incoming arguments against it before the handler ever
/// runs — unknown names, missing required arguments, and coarse type
/// mismatches are all caught on this side of the boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSchema {
    pub args: Vec<ArgSpec>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required argument.
    pub fn required(mut self, name: &str, kind: ArgKind, description: &str) -> Self {
        self.args.push(ArgSpec {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        });
        self
    }

    /// Declare an optional argument.
    pub fn optional(mut self, name: &str, kind: ArgKind, description: &str) -> Self {
        self.args.push(ArgSpec {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        });
        self
    }

    /// Derive the JSON Schema parameters object sent to the model.
    pub fn to_parameters(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for arg in &self.args {
            properties.insert(
                arg.name.clone(),
                serde_json::json!({
                    "type": arg.kind.json_type(),
                    "description": arg.description,
                }),
            );
            if arg.required {
                required.push(Value::String(arg.name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validate a parsed argument object against this schema.
    pub fn validate(&self, arguments: &Value) -> Result<(), ToolError> {
        let map = arguments
            .as_object()
            .ok_or_else(|| ToolError::InvalidArguments("arguments must be an object".into()))?;

        for arg in &self.args {
            match map.get(&arg.name) {
                Some(value) => {
                    if !arg.kind.matches(value) {
                        return Err(ToolError::InvalidArguments(format!(
                            "argument '{}' must be of type {}",
                            arg.name,
                            arg.kind.json_type()
                        )));
                    }
                }
                None if arg.required => {
                    return Err(ToolError::InvalidArguments(format!(
                        "missing required argument '{}'",
                        arg.name
                    )));
                }
                None => {}
            }
        }
        Ok(())
    }
}

// ── Tool call / result ──────────────────────────────────────────────────────

/// A validated request to execute a tool. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// The model-assigned call ID
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON object (`Value::Null` when the raw arguments
    /// never parsed — kept so the trace still records what was requested)
    pub arguments: Value,
}

impl ToolCall {
    /// Parse raw argument text into a call.
    ///
    /// Arguments arrive from the model as a string that may fail to parse;
    /// an empty string is treated as "no arguments". Anything that parses
    /// to a non-object is rejected the same way unparseable text is.
    pub fn parse(id: &str, name: &str, raw_arguments: &str) -> Result<Self, ToolError> {
        let arguments = Self::parse_arguments(raw_arguments)?;
        Ok(Self {
            id: id.into(),
            name: name.into(),
            arguments,
        })
    }

    fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
        if raw.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}")))?;
        match value {
            Value::Object(_) => Ok(value),
            Value::Null => Ok(Value::Object(serde_json::Map::new())),
            other => Err(ToolError::InvalidArguments(format!(
                "arguments must be a JSON object, got {}",
                match other {
                    Value::Array(_) => "an array",
                    Value::String(_) => "a string",
                    Value::Number(_) => "a number",
                    Value::Bool(_) => "a boolean",
                    _ => "an unexpected value",
                }
            ))),
        }
    }
}

/// Execution status of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Ok,
    Error,
}

/// The result of exactly one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call this result answers
    pub tool_call_id: String,

    pub status: ToolStatus,

    /// Payload fed back to the model (already truncated to the ceiling)
    pub payload: String,

    /// Human-readable failure reason when `status == Error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Whether the payload was cut at the byte ceiling
    #[serde(default)]
    pub truncated: bool,
}

impl ToolResult {
    /// Build a success result, applying the payload ceiling.
    pub fn ok(tool_call_id: impl Into<String>, payload: String, ceiling: usize) -> Self {
        let (payload, truncated) = truncate_payload(payload, ceiling);
        Self {
            tool_call_id: tool_call_id.into(),
            status: ToolStatus::Ok,
            payload,
            error_message: None,
            truncated,
        }
    }

    /// Build an error result. The error text doubles as the payload so the
    /// model sees the failure in the tool message.
    pub fn error(tool_call_id: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            tool_call_id: tool_call_id.into(),
            status: ToolStatus::Error,
            payload: format!("Error: {message}"),
            error_message: Some(message),
            truncated: false,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ToolStatus::Ok
    }
}

/// Truncate a payload to `ceiling` bytes on a char boundary, appending the
/// truncation marker. The marker fits inside the ceiling so the total stays
/// at or under it.
fn truncate_payload(payload: String, ceiling: usize) -> (String, bool) {
    if payload.len() <= ceiling {
        return (payload, false);
    }
    let budget = ceiling.saturating_sub(TRUNCATION_MARKER.len());
    let mut cut = budget;
    while cut > 0 && !payload.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut truncated = payload[..cut].to_string();
    truncated.push_str(TRUNCATION_MARKER);
    (truncated, true)
}

// ── Tool trait ──────────────────────────────────────────────────────────────

/// The core Tool trait.
///
/// Handlers report failure as `Err`; they never see unvalidated arguments
/// and are never invoked more than once per call. Side effects (actuating
/// hardware, outbound requests) live behind this trait, outside the
/// decision loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_sensor").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// The declared argument schema.
    fn schema(&self) -> ToolSchema;

    /// Execute with pre-validated arguments, returning the raw payload.
    async fn execute(&self, arguments: Value) -> Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for the model catalogue.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema().to_parameters(),
        }
    }
}

// ── Registry / executor ─────────────────────────────────────────────────────

/// Executor limits, owned by the registry.
#[derive(Debug, Clone)]
pub struct ExecutorLimits {
    /// Byte ceiling for successful payloads
    pub payload_ceiling_bytes: usize,

    /// Per-call handler timeout
    pub tool_timeout: Duration,
}

impl Default for ExecutorLimits {
    fn default() -> Self {
        Self {
            payload_ceiling_bytes: MAX_PAYLOAD_BYTES,
            tool_timeout: Duration::from_secs(30),
        }
    }
}

/// A registry of available tools, closed after startup.
///
/// The decision engine uses this to get the tool catalogue for the model
/// and to dispatch the calls the model requests. Unknown names are a
/// validation error on the result, not a crash.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    limits: ExecutorLimits,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            limits: ExecutorLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ExecutorLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool definitions, for the model catalogue.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Execute one raw tool call from the model.
    ///
    /// Returns the parsed call (for the cycle trace) and its result. Every
    /// failure mode — unparseable arguments, unknown tool, schema
    /// violation, handler error, handler timeout — comes back as an
    /// error-status result; this method never returns `Err` and never
    /// invokes a handler more than once.
    pub async fn dispatch(&self, raw: &MessageToolCall) -> (ToolCall, ToolResult) {
        let call = match ToolCall::parse(&raw.id, &raw.name, &raw.arguments) {
            Ok(call) => call,
            Err(e) => {
                warn!(tool = %raw.name, error = %e, "Rejected tool call arguments");
                let call = ToolCall {
                    id: raw.id.clone(),
                    name: raw.name.clone(),
                    arguments: Value::Null,
                };
                return (call, ToolResult::error(&raw.id, e.to_string()));
            }
        };

        let Some(tool) = self.tools.get(&call.name) else {
            let err = ToolError::NotFound(call.name.clone());
            return (call, ToolResult::error(&raw.id, err.to_string()));
        };

        if let Err(e) = tool.schema().validate(&call.arguments) {
            warn!(tool = %call.name, error = %e, "Tool arguments failed schema validation");
            return (call, ToolResult::error(&raw.id, e.to_string()));
        }

        let result = match tokio::time::timeout(
            self.limits.tool_timeout,
            tool.execute(call.arguments.clone()),
        )
        .await
        {
            Ok(Ok(payload)) => {
                ToolResult::ok(&raw.id, payload, self.limits.payload_ceiling_bytes)
            }
            Ok(Err(e)) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                ToolResult::error(&raw.id, e.to_string())
            }
            Err(_) => {
                let err = ToolError::Timeout {
                    tool_name: call.name.clone(),
                    timeout_secs: self.limits.tool_timeout.as_secs(),
                };
                warn!(tool = %call.name, "Tool execution timed out");
                ToolResult::error(&raw.id, err.to_string())
            }
        };

        (call, result)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
