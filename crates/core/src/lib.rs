//! # Verdant Core
//!
//! Domain types, traits, and errors for the Verdant plant-care decision
//! agent. Every boundary the decision loop crosses is a trait in this
//! crate — the model transport, the tool contract, the context provider —
//! and the concrete implementations live in the outer crates. That keeps
//! the dependency graph pointing inward and lets tests substitute scripted
//! stand-ins for any collaborator.

pub mod context;
pub mod decision;
pub mod error;
pub mod event;
pub mod message;
pub mod tool;
pub mod transport;

// Crate-root re-exports
pub use context::{ContextProvider, ContextSnapshot, SensorReading, StaticContextProvider};
pub use decision::{DecisionResult, ExitReason, ReactiveEvent, Trigger};
pub use error::{ToolError, TransportError};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use tool::{
    ArgKind, ArgSpec, ExecutorLimits, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema,
    ToolStatus, MAX_PAYLOAD_BYTES,
};
pub use transport::{ModelTransport, TokenUsage, ToolDefinition, TransportRequest, TransportResponse};
