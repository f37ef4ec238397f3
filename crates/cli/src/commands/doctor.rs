//! `verdant doctor` — configuration and backend diagnostics.

use verdant_config::AppConfig;
use verdant_core::transport::ModelTransport;

pub async fn run() -> anyhow::Result<()> {
    println!("Verdant doctor\n");

    // Config
    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  [ok] configuration loaded");
            config
        }
        Err(e) => {
            println!("  [fail] configuration: {e}");
            anyhow::bail!("configuration invalid");
        }
    };

    println!("       model: {}", config.model);
    println!(
        "       limits: {} rounds x {} tools, {}s cycle budget",
        config.engine.max_tool_rounds,
        config.engine.max_tools_per_round,
        config.engine.cycle_timeout_secs
    );

    // API key
    if config.has_api_key() {
        println!("  [ok] API key present");
    } else {
        println!("  [fail] no API key (set VERDANT_API_KEY)");
        return Ok(());
    }

    // Backend reachability
    let transport = match verdant_providers::build_from_config(&config) {
        Ok(t) => t,
        Err(e) => {
            println!("  [fail] transport: {e}");
            return Ok(());
        }
    };

    match transport.health_check().await {
        Ok(true) => println!("  [ok] model backend reachable"),
        Ok(false) => println!("  [warn] model backend responded unhealthy"),
        Err(e) => println!("  [fail] model backend unreachable: {e}"),
    }

    match transport.list_models().await {
        Ok(models) if !models.is_empty() => {
            println!("  [ok] {} models available", models.len());
            if !models.iter().any(|m| m == &config.model) {
                println!("  [warn] configured model '{}' not in backend list", config.model);
            }
        }
        Ok(_) => println!("  [warn] backend reported no models"),
        Err(e) => println!("  [warn] could not list models: {e}"),
    }

    Ok(())
}
