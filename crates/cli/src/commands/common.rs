//! Shared wiring between subcommands: config → collaborators → engine.

use std::sync::Arc;
use verdant_config::AppConfig;
use verdant_core::event::EventBus;
use verdant_core::tool::ExecutorLimits;
use verdant_core::transport::ModelTransport;
use verdant_engine::DecisionEngine;
use verdant_tools::{HubContextProvider, JournalStore, MockActuatorPort, SensorHub};

/// Assemble a decision engine around the given transport.
///
/// The sensor hub is seeded with demo readings and the actuator port is the
/// recording mock — real drivers replace both by pushing into the hub and
/// supplying their own `ActuatorPort` when embedding the crates.
pub async fn build_engine(
    config: &AppConfig,
    transport: Arc<dyn ModelTransport>,
    event_bus: Arc<EventBus>,
) -> anyhow::Result<DecisionEngine> {
    let hub = Arc::new(SensorHub::new());
    hub.seed_demo().await;
    let journal = Arc::new(JournalStore::new());
    let actuators = Arc::new(MockActuatorPort::default_site());

    let registry = verdant_tools::default_registry(
        hub.clone(),
        journal,
        actuators,
        ExecutorLimits {
            payload_ceiling_bytes: config.engine.max_payload_bytes,
            tool_timeout: config.engine.tool_timeout(),
        },
    )?;

    let context = Arc::new(HubContextProvider::new(
        hub,
        config.site.growth_stage.clone(),
        config.site.dark_start_hour,
        config.site.dark_end_hour,
    ));

    let identity = format!(
        "You are Verdant, an autonomous care agent for {}. You observe the \
         plant through sensors, act through actuators, and keep a care \
         journal. Decide what, if anything, needs doing right now, and \
         explain your decision briefly. Timestamps are UTC; the operator's \
         timezone is {}.",
        config.site.plant_name, config.site.timezone_label
    );

    Ok(DecisionEngine::new(
        transport,
        config.model.clone(),
        Arc::new(registry),
        context,
        event_bus,
    )
    .with_temperature(config.temperature)
    .with_max_tokens(config.max_tokens)
    .with_limits(config.engine.clone())
    .with_identity(identity))
}

/// Print a one-line accounting summary for a decision result.
pub fn print_summary(result: &verdant_core::decision::DecisionResult) {
    println!(
        "\n[{} | rounds: {} | tools: {} | tokens: {} | {} ms | exit: {:?}]",
        result.trigger,
        result.rounds_used,
        result.tool_calls.len(),
        result.tokens_used,
        result.wall_clock_ms,
        result.exit_reason,
    );
}
