//! `verdant run` — the autonomous daemon.
//!
//! Wires the engine to the trigger scheduler and prints each autonomous
//! decision as it lands. Ctrl-C shuts the scheduler down cleanly; an
//! in-flight cycle is allowed to finish.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use verdant_config::AppConfig;
use verdant_core::event::EventBus;
use verdant_scheduler::TriggerScheduler;

use super::common;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        anyhow::bail!(
            "No API key configured. Set VERDANT_API_KEY or add api_key to {}.",
            AppConfig::config_dir().join("config.toml").display()
        );
    }

    let transport = verdant_providers::build_from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to build transport: {e}"))?;
    let event_bus = Arc::new(EventBus::default());
    let engine = Arc::new(common::build_engine(&config, transport, event_bus.clone()).await?);

    let (scheduler, mut results) =
        TriggerScheduler::new(engine, config.scheduler.clone(), event_bus);
    let scheduler = Arc::new(scheduler);

    let shutdown = CancellationToken::new();
    let scheduler_handle = {
        let scheduler = scheduler.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { scheduler.run(shutdown).await })
    };

    info!(
        interval_minutes = config.scheduler.cycle_interval_minutes,
        plant = %config.site.plant_name,
        "Verdant daemon running; press Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                shutdown.cancel();
                break;
            }
            result = results.recv() => {
                let Some(result) = result else { break };
                println!("\n=== Decision ({}) ===", result.decided_at.format("%Y-%m-%d %H:%M:%S UTC"));
                println!("{}", result.final_text);
                common::print_summary(&result);
            }
        }
    }

    scheduler_handle.await?;
    Ok(())
}
