//! The decision cycle — a bounded state machine around the model.
//!
//! Each call to [`DecisionEngine::decide`] runs one cycle: seed the
//! conversation from a fresh context snapshot, then alternate model calls
//! and sequential tool execution until the model answers in free text or a
//! budget runs out. Two caps (rounds, tools per round), a wall-clock
//! deadline, and a forced no-tool final call make the loop total: every
//! cycle terminates with an exit reason and a usable final text, whatever
//! the model or the tools do.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use verdant_config::EngineConfig;
use verdant_core::context::ContextProvider;
use verdant_core::decision::{DecisionResult, ExitReason, Trigger};
use verdant_core::error::TransportError;
use verdant_core::event::{DomainEvent, EventBus};
use verdant_core::message::{Conversation, Message};
use verdant_core::tool::{ToolCall, ToolRegistry, ToolResult};
use verdant_core::transport::{ModelTransport, ToolDefinition, TransportRequest, TransportResponse};

/// Error text reported to the model for tool calls beyond the per-round cap.
pub const SKIPPED_ROUND_CAP: &str = "skipped: round tool budget exhausted";

const UNABLE_TO_COMPLETE: &str =
    "Unable to complete this decision cycle in time. No action was taken.";
const AGENT_UNAVAILABLE: &str =
    "The decision agent could not reach its model backend. No action was taken.";
const CANCELLED_TEXT: &str = "This decision cycle was cancelled before completion.";
const EMPTY_ANSWER_FALLBACK: &str = "Nothing to report for this cycle.";

/// The decision engine. One instance serves many cycles; each cycle owns
/// its own conversation and result, referencing the shared collaborators
/// (registry, context provider, transport) by read-only handle.
pub struct DecisionEngine {
    transport: Arc<dyn ModelTransport>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    context: Arc<dyn ContextProvider>,
    identity: String,
    limits: EngineConfig,
    event_bus: Arc<EventBus>,
}

impl DecisionEngine {
    pub fn new(
        transport: Arc<dyn ModelTransport>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        context: Arc<dyn ContextProvider>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            transport,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tools,
            context,
            identity: default_identity(),
            limits: EngineConfig::default(),
            event_bus,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_limits(mut self, limits: EngineConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the identity block of the system prompt.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Run one decision cycle. Total: never returns `Err`, never hangs past
    /// the cycle budget — failures come back as `exit_reason = error`.
    pub async fn decide(&self, trigger: Trigger, seed: Option<Vec<Message>>) -> DecisionResult {
        self.decide_with_cancel(trigger, seed, CancellationToken::new())
            .await
    }

    /// Seed a cycle from a free-text query, with interactive provenance.
    pub async fn interactive_query(&self, query: impl Into<String>) -> DecisionResult {
        self.decide(Trigger::Interactive, Some(vec![Message::user(query)]))
            .await
    }

    /// Like [`decide`], but externally cancellable. Cancellation is observed
    /// at round boundaries; an in-flight model or tool call finishes first.
    pub async fn decide_with_cancel(
        &self,
        trigger: Trigger,
        seed: Option<Vec<Message>>,
        cancel: CancellationToken,
    ) -> DecisionResult {
        let cycle_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let deadline = started + self.limits.cycle_timeout();

        info!(cycle_id = %cycle_id, trigger = %trigger, "Starting decision cycle");
        self.event_bus.publish(DomainEvent::CycleStarted {
            cycle_id: cycle_id.clone(),
            trigger: trigger.clone(),
            timestamp: Utc::now(),
        });

        // Context is read exactly once per cycle.
        let snapshot = self.context.snapshot().await;

        let mut conversation = Conversation::new();
        conversation.push(Message::system(format!(
            "{}\n\n{}\nThis cycle was triggered by: {}.",
            self.identity,
            snapshot.render(),
            trigger
        )));
        if let Some(seed) = seed {
            for message in seed {
                conversation.push(message);
            }
        }

        let catalogue = self.tools.definitions();
        let mut trace = CycleTrace::default();

        loop {
            // Round boundary: cancellation and deadline are only ever
            // observed here, never mid-call.
            if cancel.is_cancelled() {
                warn!(cycle_id = %cycle_id, "Cycle cancelled between rounds");
                return self.finish(
                    &cycle_id,
                    trigger,
                    started,
                    trace,
                    ExitReason::Error,
                    CANCELLED_TEXT.to_string(),
                );
            }
            if Instant::now() >= deadline {
                warn!(cycle_id = %cycle_id, "Cycle wall-clock budget exhausted");
                let text = conversation
                    .last_assistant_text()
                    .map(str::to_string)
                    .unwrap_or_else(|| UNABLE_TO_COMPLETE.to_string());
                return self.finish(&cycle_id, trigger, started, trace, ExitReason::Timeout, text);
            }

            // Once the round budget is spent, one last call runs with tool
            // calling disabled so a natural-language answer always exists.
            let fallback_round = trace.rounds_used >= self.limits.max_tool_rounds;
            let tools_this_call = if fallback_round {
                Vec::new()
            } else {
                catalogue.clone()
            };

            let response = match self
                .call_model_with_retry(&cycle_id, &conversation, tools_this_call, deadline)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(cycle_id = %cycle_id, error = %e, "Transport failed, aborting cycle");
                    return self.finish(
                        &cycle_id,
                        trigger,
                        started,
                        trace,
                        ExitReason::Error,
                        AGENT_UNAVAILABLE.to_string(),
                    );
                }
            };

            if let Some(usage) = response.usage {
                trace.tokens_used += usage.total_tokens as u64;
            }
            self.event_bus.publish(DomainEvent::ModelResponded {
                cycle_id: cycle_id.clone(),
                model: response.model.clone(),
                tokens_used: response.usage.map(|u| u.total_tokens).unwrap_or(0),
                requested_tool_calls: response.message.tool_calls.len(),
                timestamp: Utc::now(),
            });

            let requested = response.message.tool_calls.clone();

            if fallback_round || requested.is_empty() {
                // Any tool calls emitted on the fallback round are ignored;
                // the answer is whatever text the model produced.
                let text = non_empty(response.message.content.clone());
                conversation.push(response.message);
                let exit = if fallback_round {
                    ExitReason::MaxRounds
                } else {
                    ExitReason::Natural
                };
                return self.finish(&cycle_id, trigger, started, trace, exit, text);
            }

            conversation.push(response.message);

            // Sequential execution, first-N policy: later calls in a round
            // may assume earlier side effects landed, and calls past the cap
            // are reported back as skipped rather than silently dropped.
            for (index, raw) in requested.iter().enumerate() {
                if index < self.limits.max_tools_per_round {
                    let tool_started = Instant::now();
                    let (call, result) = self.tools.dispatch(raw).await;
                    self.event_bus.publish(DomainEvent::ToolExecuted {
                        cycle_id: cycle_id.clone(),
                        tool_name: raw.name.clone(),
                        success: result.is_ok(),
                        duration_ms: tool_started.elapsed().as_millis() as u64,
                        timestamp: Utc::now(),
                    });
                    conversation.push(Message::tool_result(&result.tool_call_id, &result.payload));
                    trace.record(call, result);
                } else {
                    debug!(
                        cycle_id = %cycle_id,
                        tool = %raw.name,
                        cap = self.limits.max_tools_per_round,
                        "Tool call beyond round cap, reporting as skipped"
                    );
                    let call = ToolCall::parse(&raw.id, &raw.name, &raw.arguments)
                        .unwrap_or_else(|_| ToolCall {
                            id: raw.id.clone(),
                            name: raw.name.clone(),
                            arguments: serde_json::Value::Null,
                        });
                    let result = ToolResult::error(&raw.id, SKIPPED_ROUND_CAP);
                    conversation.push(Message::tool_result(&result.tool_call_id, &result.payload));
                    trace.record(call, result);
                }
            }

            trace.rounds_used += 1;
        }
    }

    /// One model call with bounded retry and doubling backoff. Each attempt
    /// carries its own sub-timeout, clamped to the remaining cycle budget so
    /// a hung call cannot silently eat the deadline.
    async fn call_model_with_retry(
        &self,
        cycle_id: &str,
        conversation: &Conversation,
        tools: Vec<ToolDefinition>,
        deadline: Instant,
    ) -> Result<TransportResponse, TransportError> {
        let mut last_error = TransportError::NotConfigured("no transport attempt made".into());

        for attempt in 0..=self.limits.transport_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(250 * (1u64 << (attempt - 1)));
                debug!(cycle_id = %cycle_id, attempt, backoff_ms = backoff.as_millis() as u64, "Retrying model call");
                tokio::time::sleep(backoff).await;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout("cycle budget exhausted".into()));
            }
            let per_call = remaining.min(self.limits.model_call_timeout());

            let request = TransportRequest {
                model: self.model.clone(),
                messages: conversation.messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tools.clone(),
            };

            match tokio::time::timeout(per_call, self.transport.complete(request)).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => {
                    warn!(cycle_id = %cycle_id, attempt, error = %e, "Model call failed");
                    if !e.is_retryable() {
                        return Err(e);
                    }
                    last_error = e;
                }
                Err(_) => {
                    warn!(cycle_id = %cycle_id, attempt, timeout_secs = per_call.as_secs(), "Model call timed out");
                    last_error =
                        TransportError::Timeout(format!("model call exceeded {}s", per_call.as_secs()));
                }
            }
        }

        Err(last_error)
    }

    fn finish(
        &self,
        cycle_id: &str,
        trigger: Trigger,
        started: Instant,
        trace: CycleTrace,
        exit_reason: ExitReason,
        final_text: String,
    ) -> DecisionResult {
        let wall_clock_ms = started.elapsed().as_millis() as u64;
        info!(
            cycle_id = %cycle_id,
            exit_reason = ?exit_reason,
            rounds_used = trace.rounds_used,
            tokens_used = trace.tokens_used,
            wall_clock_ms,
            "Decision cycle finished"
        );
        self.event_bus.publish(DomainEvent::DecisionCompleted {
            cycle_id: cycle_id.to_string(),
            exit_reason,
            rounds_used: trace.rounds_used,
            wall_clock_ms,
            timestamp: Utc::now(),
        });

        DecisionResult {
            cycle_id: cycle_id.to_string(),
            final_text,
            trigger,
            rounds_used: trace.rounds_used,
            tool_calls: trace.tool_calls,
            tool_results: trace.tool_results,
            tokens_used: trace.tokens_used,
            wall_clock_ms,
            exit_reason,
            decided_at: Utc::now(),
        }
    }
}

/// Per-cycle bookkeeping, owned by one `decide` call.
#[derive(Default)]
struct CycleTrace {
    rounds_used: u32,
    tokens_used: u64,
    tool_calls: Vec<ToolCall>,
    tool_results: Vec<ToolResult>,
}

impl CycleTrace {
    fn record(&mut self, call: ToolCall, result: ToolResult) {
        self.tool_calls.push(call);
        self.tool_results.push(result);
    }
}

fn non_empty(text: String) -> String {
    if text.trim().is_empty() {
        EMPTY_ANSWER_FALLBACK.to_string()
    } else {
        text
    }
}

fn default_identity() -> String {
    "You are Verdant, an autonomous plant-care agent. You observe the plant \
     through sensors, act through actuators, and keep a care journal. Decide \
     what, if anything, needs doing right now, and explain your decision \
     briefly."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use verdant_core::context::{ContextSnapshot, SensorReading, StaticContextProvider};
    use verdant_core::error::ToolError;
    use verdant_core::tool::{ArgKind, Tool, ToolSchema, ToolStatus};
    use verdant_providers::{tool_call, ScriptedStep, ScriptedTransport};

    /// A sensor-read stand-in that counts invocations.
    struct CountingSensorTool {
        invocations: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for CountingSensorTool {
        fn name(&self) -> &str {
            "read_sensor"
        }
        fn description(&self) -> &str {
            "Read a sensor"
        }
        fn schema(&self) -> ToolSchema {
            ToolSchema::new().required("sensor", ArgKind::String, "Sensor name")
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<String, ToolError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            Ok(r#"{"sensor":"soil_moisture","value":41.5,"unit":"%"}"#.into())
        }
    }

    struct FaultyPumpTool;

    #[async_trait]
    impl Tool for FaultyPumpTool {
        fn name(&self) -> &str {
            "set_actuator"
        }
        fn description(&self) -> &str {
            "Command an actuator"
        }
        fn schema(&self) -> ToolSchema {
            ToolSchema::new()
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<String, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "set_actuator".into(),
                reason: "pump controller offline".into(),
            })
        }
    }

    struct OversizedTool;

    #[async_trait]
    impl Tool for OversizedTool {
        fn name(&self) -> &str {
            "dump_history"
        }
        fn description(&self) -> &str {
            "Returns a 10KB payload"
        }
        fn schema(&self) -> ToolSchema {
            ToolSchema::new()
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<String, ToolError> {
            Ok("h".repeat(10 * 1024))
        }
    }

    fn snapshot() -> ContextSnapshot {
        ContextSnapshot {
            captured_at: chrono::NaiveDate::from_ymd_opt(2026, 8, 6)
                .unwrap()
                .and_hms_opt(14, 20, 0)
                .unwrap()
                .and_utc(),
            growth_stage: "vegetative".into(),
            is_dark_period: false,
            readings: vec![SensorReading {
                sensor: "soil_moisture".into(),
                value: 41.5,
                unit: "%".into(),
                fresh: true,
            }],
            notes: vec![],
        }
    }

    struct EngineFixture {
        engine: DecisionEngine,
        transport: Arc<ScriptedTransport>,
        sensor_invocations: Arc<AtomicUsize>,
    }

    fn fixture(transport: ScriptedTransport, limits: EngineConfig) -> EngineFixture {
        let transport = Arc::new(transport);
        let invocations = Arc::new(AtomicUsize::new(0));

        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CountingSensorTool {
            invocations: invocations.clone(),
        }));
        registry.register(Box::new(FaultyPumpTool));
        registry.register(Box::new(OversizedTool));

        let engine = DecisionEngine::new(
            transport.clone(),
            "scripted",
            Arc::new(registry),
            Arc::new(StaticContextProvider::new(snapshot())),
            Arc::new(EventBus::default()),
        )
        .with_limits(limits);

        EngineFixture {
            engine,
            transport,
            sensor_invocations: invocations,
        }
    }

    fn fast_limits() -> EngineConfig {
        EngineConfig {
            max_tool_rounds: 3,
            max_tools_per_round: 2,
            cycle_timeout_secs: 30,
            model_call_timeout_secs: 5,
            tool_timeout_secs: 5,
            transport_retries: 2,
            max_payload_bytes: 3072,
        }
    }

    #[tokio::test]
    async fn free_text_response_exits_naturally() {
        let f = fixture(
            ScriptedTransport::new().then_text("All readings look healthy. No action needed."),
            fast_limits(),
        );

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        assert_eq!(result.exit_reason, ExitReason::Natural);
        assert_eq!(result.rounds_used, 0);
        assert_eq!(result.final_text, "All readings look healthy. No action needed.");
        assert!(result.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn sensor_read_then_natural_exit() {
        let f = fixture(
            ScriptedTransport::new()
                .then_tool_call("call_1", "read_sensor", r#"{"sensor":"soil_moisture"}"#)
                .then_text("Soil moisture is 41.5%, comfortably in range. No action."),
            fast_limits(),
        );

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        assert_eq!(result.exit_reason, ExitReason::Natural);
        assert_eq!(result.rounds_used, 1);
        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(result.tool_results.len(), 1);
        assert!(result.tool_results[0].is_ok());
        assert_eq!(f.sensor_invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn relentless_tool_requests_hit_round_cap() {
        let mut transport = ScriptedTransport::new();
        for i in 0..10 {
            transport = transport.then_tool_call(
                &format!("call_{i}"),
                "read_sensor",
                r#"{"sensor":"soil_moisture"}"#,
            );
        }
        let f = fixture(transport, fast_limits());

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        assert_eq!(result.exit_reason, ExitReason::MaxRounds);
        assert_eq!(result.rounds_used, 3);

        // 3 tool rounds + 1 forced fallback call.
        let requests = f.transport.requests();
        assert_eq!(requests.len(), 4);
        // The fallback call must have tool calling disabled.
        assert_eq!(requests.last().unwrap().tool_count, 0);
        for earlier in &requests[..3] {
            assert!(earlier.tool_count > 0);
        }
        // The fallback answer is still a usable text.
        assert!(!result.final_text.is_empty());
    }

    #[tokio::test]
    async fn over_cap_tool_calls_skipped_not_executed() {
        // Cap is 2; request 5 in one round.
        let calls = (0..5)
            .map(|i| {
                tool_call(
                    &format!("call_{i}"),
                    "read_sensor",
                    r#"{"sensor":"soil_moisture"}"#,
                )
            })
            .collect();
        let f = fixture(
            ScriptedTransport::new()
                .then(ScriptedStep::ToolCalls(calls))
                .then_text("Done checking."),
            fast_limits(),
        );

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        assert_eq!(f.sensor_invocations.load(Ordering::SeqCst), 2);
        assert_eq!(result.tool_calls.len(), 5);
        assert_eq!(result.tool_results.len(), 5);

        let skipped: Vec<_> = result
            .tool_results
            .iter()
            .filter(|r| {
                r.error_message
                    .as_deref()
                    .is_some_and(|m| m.contains("skipped"))
            })
            .collect();
        assert_eq!(skipped.len(), 3);
        for s in skipped {
            assert_eq!(s.status, ToolStatus::Error);
        }
    }

    #[tokio::test]
    async fn tool_failure_feeds_back_and_cycle_continues() {
        let f = fixture(
            ScriptedTransport::new()
                .then_tool_call("call_1", "set_actuator", r#"{"actuator":"pump","command":"on"}"#)
                .then_text("The pump is offline; flagging for manual watering."),
            fast_limits(),
        );

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        assert_eq!(result.exit_reason, ExitReason::Natural);
        assert_eq!(result.tool_results.len(), 1);
        assert_eq!(result.tool_results[0].status, ToolStatus::Error);
        assert!(result.tool_results[0].payload.contains("offline"));
        // The failure did not abort the cycle.
        assert!(result.final_text.contains("manual watering"));
    }

    #[tokio::test]
    async fn oversized_payload_truncated_before_conversation() {
        let f = fixture(
            ScriptedTransport::new()
                .then_tool_call("call_1", "dump_history", "{}")
                .then_text("Reviewed the history."),
            fast_limits(),
        );

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        let tr = &result.tool_results[0];
        assert!(tr.truncated);
        assert!(tr.payload.len() <= 3072);
        assert!(tr.payload.contains("truncated"));
    }

    #[tokio::test]
    async fn unparseable_arguments_become_error_result() {
        let f = fixture(
            ScriptedTransport::new()
                .then_tool_call("call_1", "read_sensor", "{not valid json")
                .then_text("Could not read the sensor; will retry next cycle."),
            fast_limits(),
        );

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        assert_eq!(result.exit_reason, ExitReason::Natural);
        assert_eq!(result.tool_results[0].status, ToolStatus::Error);
        // The handler never ran.
        assert_eq!(f.sensor_invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transport_failures_exhaust_retries_then_error() {
        let f = fixture(
            ScriptedTransport::new()
                .then_fail(TransportError::Network("connection reset".into()))
                .then_fail(TransportError::Network("connection reset".into()))
                .then_fail(TransportError::Network("connection reset".into())),
            fast_limits(),
        );

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        assert_eq!(result.exit_reason, ExitReason::Error);
        // retries = 2 → three attempts in total.
        assert_eq!(f.transport.calls_seen(), 3);
        assert!(!result.final_text.is_empty());
    }

    #[tokio::test]
    async fn transport_recovers_within_retry_budget() {
        let f = fixture(
            ScriptedTransport::new()
                .then_fail(TransportError::RateLimited { retry_after_secs: 1 })
                .then_text("Recovered; all is well."),
            fast_limits(),
        );

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        assert_eq!(result.exit_reason, ExitReason::Natural);
        assert_eq!(result.final_text, "Recovered; all is well.");
        assert_eq!(f.transport.calls_seen(), 2);
    }

    #[tokio::test]
    async fn auth_failure_aborts_without_retry() {
        let f = fixture(
            ScriptedTransport::new()
                .then_fail(TransportError::AuthenticationFailed("bad key".into()))
                .then_text("should never be reached"),
            fast_limits(),
        );

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        assert_eq!(result.exit_reason, ExitReason::Error);
        assert_eq!(f.transport.calls_seen(), 1);
    }

    #[tokio::test]
    async fn exhausted_budget_times_out_with_canned_text() {
        let mut limits = fast_limits();
        limits.cycle_timeout_secs = 0;
        let f = fixture(ScriptedTransport::new().then_text("never called"), limits);

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        assert_eq!(result.exit_reason, ExitReason::Timeout);
        assert!(!result.final_text.is_empty());
        assert_eq!(f.transport.calls_seen(), 0);
    }

    #[tokio::test]
    async fn cancellation_between_rounds_is_error_result() {
        let f = fixture(ScriptedTransport::new().then_text("never called"), fast_limits());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = f
            .engine
            .decide_with_cancel(Trigger::Scheduled, None, cancel)
            .await;
        assert_eq!(result.exit_reason, ExitReason::Error);
        assert!(result.final_text.contains("cancelled"));
    }

    #[tokio::test]
    async fn context_injection_carries_time_and_mode_flags() {
        let f = fixture(
            ScriptedTransport::new().then_text("Understood."),
            fast_limits(),
        );

        f.engine.decide(Trigger::Scheduled, None).await;
        let requests = f.transport.requests();
        let system = requests[0].system_content.as_deref().unwrap();
        // The injection guarantee: explicit authoritative time and mode
        // flags are in the prompt, regardless of what the model does.
        assert!(system.contains("Current time (UTC): 2026-08-06 14:20:00"));
        assert!(system.contains("Dark period active: false"));
        assert!(system.contains("triggered by: scheduled"));
    }

    #[tokio::test]
    async fn interactive_query_seeds_user_message() {
        let f = fixture(
            ScriptedTransport::new().then_text("The basil looks great."),
            fast_limits(),
        );

        let result = f.engine.interactive_query("How is the basil?").await;
        assert_eq!(result.trigger, Trigger::Interactive);
        // System + seeded user message.
        assert_eq!(f.transport.requests()[0].message_count, 2);
    }

    #[tokio::test]
    async fn tokens_accumulate_across_rounds() {
        let f = fixture(
            ScriptedTransport::new()
                .then_tool_call("call_1", "read_sensor", r#"{"sensor":"soil_moisture"}"#)
                .then_text("Fine."),
            fast_limits(),
        );

        let result = f.engine.decide(Trigger::Scheduled, None).await;
        // Two model calls at 125 tokens each (scripted default usage).
        assert_eq!(result.tokens_used, 250);
    }

    #[tokio::test]
    async fn empty_model_text_replaced_with_fallback() {
        let f = fixture(ScriptedTransport::new().then_text("  "), fast_limits());
        let result = f.engine.decide(Trigger::Scheduled, None).await;
        assert_eq!(result.exit_reason, ExitReason::Natural);
        assert!(!result.final_text.trim().is_empty());
    }
}
