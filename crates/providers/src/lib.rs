//! Model transport implementations for Verdant.
//!
//! - [`OpenAiCompatTransport`] — any OpenAI-compatible chat-completions
//!   backend (OpenRouter, OpenAI, Ollama, vLLM, …)
//! - [`ScriptedTransport`] — deterministic canned responses for tests and
//!   dry runs

pub mod openai_compat;
pub mod scripted;

pub use openai_compat::OpenAiCompatTransport;
pub use scripted::{tool_call, ScriptedStep, ScriptedTransport, SeenRequest};

use std::sync::Arc;
use std::time::Duration;
use verdant_core::error::TransportError;
use verdant_core::transport::ModelTransport;

/// Build the configured transport.
///
/// An explicit api_key selects the OpenAI-compatible backend; without one,
/// configuration is incomplete and startup should fail loudly rather than
/// burn a cycle discovering it.
pub fn build_from_config(
    config: &verdant_config::AppConfig,
) -> Result<Arc<dyn ModelTransport>, TransportError> {
    let Some(api_key) = config.api_key.as_deref() else {
        return Err(TransportError::NotConfigured(
            "no API key configured (set VERDANT_API_KEY or api_key in config.toml)".into(),
        ));
    };

    let transport = OpenAiCompatTransport::new(
        "openai-compat",
        config.api_url.clone(),
        api_key,
        Duration::from_secs(config.engine.model_call_timeout_secs),
    )?;
    Ok(Arc::new(transport))
}
