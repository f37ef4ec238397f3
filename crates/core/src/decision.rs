//! Decision cycle outputs: trigger provenance, exit reasons, and the
//! immutable result record delivered to whichever caller started the cycle.

use crate::tool::{ToolCall, ToolResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What started a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Fixed-interval cycle
    Scheduled,
    /// A reactive sensor event passed the cooldown gate
    Reactive { event_kind: String },
    /// The external watchdog raised an anomaly
    Anomaly { event_kind: String },
    /// Telegram command
    Telegram,
    /// HTTP API request
    Api,
    /// Direct interactive query
    Interactive,
}

impl Trigger {
    /// Whether this trigger queues behind a running cycle (on-demand paths)
    /// or is dropped when one is already in flight (autonomous paths).
    pub fn queues_when_busy(&self) -> bool {
        matches!(self, Trigger::Telegram | Trigger::Api | Trigger::Interactive)
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Scheduled => write!(f, "scheduled"),
            Trigger::Reactive { event_kind } => write!(f, "reactive:{event_kind}"),
            Trigger::Anomaly { event_kind } => write!(f, "anomaly:{event_kind}"),
            Trigger::Telegram => write!(f, "telegram"),
            Trigger::Api => write!(f, "api"),
            Trigger::Interactive => write!(f, "interactive"),
        }
    }
}

/// How a cycle terminated. Every cycle terminates with one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The model answered with free text and no tool calls
    Natural,
    /// Round budget exhausted; answer came from the no-tool fallback call
    MaxRounds,
    /// Wall-clock budget exhausted at a round boundary
    Timeout,
    /// Transport failure after retries, or external cancellation
    Error,
}

/// The immutable output record of one completed cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResult {
    /// Unique cycle ID
    pub cycle_id: String,

    /// The final natural-language decision (never empty)
    pub final_text: String,

    /// What started this cycle
    pub trigger: Trigger,

    /// Model-call ⇄ tool-execution iterations used
    pub rounds_used: u32,

    /// Every tool call requested during the cycle, in order
    pub tool_calls: Vec<ToolCall>,

    /// One result per tool call, same order
    pub tool_results: Vec<ToolResult>,

    /// Total tokens across every model call in the cycle
    pub tokens_used: u64,

    /// Wall-clock duration of the cycle
    pub wall_clock_ms: u64,

    pub exit_reason: ExitReason,

    /// When the result was produced
    pub decided_at: DateTime<Utc>,
}

/// An event produced by external anomaly detection, consumed by the
/// scheduler subject to a per-kind cooldown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactiveEvent {
    /// Cooldown key (e.g., "soil_moisture_low")
    pub kind: String,

    /// Detector-specific details
    pub payload: serde_json::Value,

    pub observed_at: DateTime<Utc>,
}

impl ReactiveEvent {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
            observed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_demand_triggers_queue_autonomous_triggers_drop() {
        assert!(Trigger::Interactive.queues_when_busy());
        assert!(Trigger::Telegram.queues_when_busy());
        assert!(Trigger::Api.queues_when_busy());
        assert!(!Trigger::Scheduled.queues_when_busy());
        assert!(
            !Trigger::Reactive {
                event_kind: "soil_moisture_low".into()
            }
            .queues_when_busy()
        );
    }

    #[test]
    fn trigger_display_includes_event_kind() {
        let t = Trigger::Anomaly {
            event_kind: "temp_spike".into(),
        };
        assert_eq!(t.to_string(), "anomaly:temp_spike");
    }

    #[test]
    fn exit_reason_serializes_snake_case() {
        let json = serde_json::to_string(&ExitReason::MaxRounds).unwrap();
        assert_eq!(json, "\"max_rounds\"");
    }

    #[test]
    fn decision_result_roundtrip() {
        let result = DecisionResult {
            cycle_id: "cycle_1".into(),
            final_text: "Soil moisture is fine; no action needed.".into(),
            trigger: Trigger::Scheduled,
            rounds_used: 1,
            tool_calls: vec![],
            tool_results: vec![],
            tokens_used: 150,
            wall_clock_ms: 2400,
            exit_reason: ExitReason::Natural,
            decided_at: Utc::now(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: DecisionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.exit_reason, ExitReason::Natural);
        assert_eq!(back.rounds_used, 1);
    }
}
