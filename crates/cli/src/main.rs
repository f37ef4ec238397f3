//! Verdant CLI — the main entry point.
//!
//! Commands:
//! - `run`    — Start the autonomous daemon (scheduler + decision engine)
//! - `ask`    — One-shot interactive query against the current context
//! - `doctor` — Diagnose configuration and model backend health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "verdant",
    about = "Verdant — autonomous plant-care decision agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the autonomous daemon
    Run,

    /// Ask the agent a question and print its decision
    Ask {
        /// The question to ask
        question: String,

        /// Use the scripted offline transport instead of a live model
        #[arg(long)]
        dry_run: bool,
    },

    /// Diagnose configuration and backend health
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run => commands::run::run().await?,
        Commands::Ask { question, dry_run } => commands::ask::run(&question, dry_run).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
