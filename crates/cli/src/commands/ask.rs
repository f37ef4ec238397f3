//! `verdant ask` — one-shot interactive query.

use std::sync::Arc;
use verdant_config::AppConfig;
use verdant_core::event::EventBus;
use verdant_core::transport::ModelTransport;
use verdant_providers::ScriptedTransport;

use super::common;

pub async fn run(question: &str, dry_run: bool) -> anyhow::Result<()> {
    let config = AppConfig::load().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    let transport: Arc<dyn ModelTransport> = if dry_run {
        // Offline walkthrough: one sensor read, then a verdict.
        Arc::new(
            ScriptedTransport::new()
                .then_tool_call("call_1", "read_sensor", r#"{"sensor":"soil_moisture"}"#)
                .then_text(
                    "Soil moisture is 41.5%, comfortably in range for the \
                     vegetative stage. No watering needed this cycle.",
                ),
        )
    } else {
        if !config.has_api_key() {
            eprintln!();
            eprintln!("  ERROR: No API key configured!");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    VERDANT_API_KEY     (generic)");
            eprintln!("    OPENROUTER_API_KEY  (recommended)");
            eprintln!("    OPENAI_API_KEY      (for OpenAI direct)");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            anyhow::bail!("No API key found. See above for setup instructions.");
        }
        verdant_providers::build_from_config(&config)
            .map_err(|e| anyhow::anyhow!("Failed to build transport: {e}"))?
    };

    let engine = common::build_engine(&config, transport, Arc::new(EventBus::default())).await?;

    let result = engine.interactive_query(question).await;
    println!("{}", result.final_text);
    common::print_summary(&result);

    Ok(())
}
