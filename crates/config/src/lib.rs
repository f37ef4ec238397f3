//! Configuration loading, validation, and management for Verdant.
//!
//! Loads configuration from `~/.verdant/config.toml` with environment
//! variable overrides. Validates all settings at startup. Every limit the
//! decision engine and scheduler enforce lives here with an explicit
//! default, so the TOML file only needs to name what it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.verdant/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model backend base URL (OpenAI-compatible)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Decision engine limits
    #[serde(default)]
    pub engine: EngineConfig,

    /// Trigger scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Site/plant identity injected into the agent's system prompt
    #[serde(default)]
    pub site: SiteConfig,
}

fn default_api_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2048
}

// Manual Debug so a logged config can never leak the key.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let api_key = if self.api_key.is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        f.debug_struct("AppConfig")
            .field("api_key", &api_key)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("engine", &self.engine)
            .field("scheduler", &self.scheduler)
            .field("site", &self.site)
            .finish()
    }
}

/// Limits enforced by the decision engine. The round cap and per-round
/// tool cap bound the otherwise-unbounded recursive tool-use pattern;
/// the timeouts bound wall-clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum model-call ⇄ tool-execution rounds per cycle
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Maximum tool calls executed per round; extra requests are reported
    /// back as skipped
    #[serde(default = "default_max_tools_per_round")]
    pub max_tools_per_round: usize,

    /// Wall-clock budget for a whole cycle, checked at round boundaries
    #[serde(default = "default_cycle_timeout_secs")]
    pub cycle_timeout_secs: u64,

    /// Sub-timeout for a single model call
    #[serde(default = "default_model_call_timeout_secs")]
    pub model_call_timeout_secs: u64,

    /// Sub-timeout for a single tool call
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Transport retries before the cycle aborts with an error result
    #[serde(default = "default_transport_retries")]
    pub transport_retries: u32,

    /// Byte ceiling for tool payloads fed back to the model
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

fn default_max_tool_rounds() -> u32 {
    8
}
fn default_max_tools_per_round() -> usize {
    4
}
fn default_cycle_timeout_secs() -> u64 {
    120
}
fn default_model_call_timeout_secs() -> u64 {
    60
}
fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_transport_retries() -> u32 {
    2
}
fn default_max_payload_bytes() -> usize {
    3072
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            max_tools_per_round: default_max_tools_per_round(),
            cycle_timeout_secs: default_cycle_timeout_secs(),
            model_call_timeout_secs: default_model_call_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
            transport_retries: default_transport_retries(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

impl EngineConfig {
    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }

    pub fn model_call_timeout(&self) -> Duration {
        Duration::from_secs(self.model_call_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

/// Trigger scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Fixed interval between scheduled cycles
    #[serde(default = "default_cycle_interval_minutes")]
    pub cycle_interval_minutes: u64,

    /// Per-event-kind cooldown for reactive triggers
    #[serde(default = "default_reactive_cooldown_secs")]
    pub reactive_cooldown_secs: u64,

    /// Reactive event queue capacity
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
}

fn default_cycle_interval_minutes() -> u64 {
    120
}
fn default_reactive_cooldown_secs() -> u64 {
    600
}
fn default_event_queue_capacity() -> usize {
    64
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycle_interval_minutes: default_cycle_interval_minutes(),
            reactive_cooldown_secs: default_reactive_cooldown_secs(),
            event_queue_capacity: default_event_queue_capacity(),
        }
    }
}

impl SchedulerConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_minutes * 60)
    }

    pub fn reactive_cooldown(&self) -> Duration {
        Duration::from_secs(self.reactive_cooldown_secs)
    }
}

/// Identity of the plant and site the agent cares for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Display name for the plant (used in prompts and summaries)
    #[serde(default = "default_plant_name")]
    pub plant_name: String,

    /// Current growth stage, reported in the context snapshot
    #[serde(default = "default_growth_stage")]
    pub growth_stage: String,

    /// Timezone label shown alongside UTC timestamps
    #[serde(default = "default_timezone_label")]
    pub timezone_label: String,

    /// Dark period start hour (UTC). Equal start and end hours mean no
    /// dark period.
    #[serde(default)]
    pub dark_start_hour: u32,

    /// Dark period end hour (UTC), exclusive; may wrap past midnight
    #[serde(default)]
    pub dark_end_hour: u32,
}

fn default_plant_name() -> String {
    "the plant".into()
}
fn default_growth_stage() -> String {
    "vegetative".into()
}
fn default_timezone_label() -> String {
    "UTC".into()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            plant_name: default_plant_name(),
            growth_stage: default_growth_stage(),
            timezone_label: default_timezone_label(),
            dark_start_hour: 0,
            dark_end_hour: 0,
        }
    }
}

impl AppConfig {
    /// Load `~/.verdant/config.toml` (defaults when absent) and apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_dir().join("config.toml"))?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific file path. A missing file is not
    /// an error; every field has a default.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Environment overrides: `VERDANT_API_KEY` (then `OPENROUTER_API_KEY`,
    /// `OPENAI_API_KEY`) for the key, `VERDANT_MODEL` for the model. A key
    /// in the TOML file wins over the environment.
    fn apply_env(&mut self) {
        if self.api_key.is_none() {
            self.api_key = ["VERDANT_API_KEY", "OPENROUTER_API_KEY", "OPENAI_API_KEY"]
                .iter()
                .find_map(|name| std::env::var(name).ok());
        }
        if let Ok(model) = std::env::var("VERDANT_MODEL") {
            self.model = model;
        }
    }

    /// Directory holding config.toml.
    pub fn config_dir() -> PathBuf {
        home_dir().join(".verdant")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::Invalid(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.engine.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_tool_rounds must be at least 1".into(),
            ));
        }
        if self.engine.max_tools_per_round == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_tools_per_round must be at least 1".into(),
            ));
        }
        if self.engine.cycle_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "engine.cycle_timeout_secs must be at least 1".into(),
            ));
        }
        if self.engine.model_call_timeout_secs > self.engine.cycle_timeout_secs {
            return Err(ConfigError::Invalid(
                "engine.model_call_timeout_secs must not exceed engine.cycle_timeout_secs".into(),
            ));
        }
        if self.scheduler.cycle_interval_minutes == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.cycle_interval_minutes must be at least 1".into(),
            ));
        }
        if self.site.dark_start_hour > 23 || self.site.dark_end_hour > 23 {
            return Err(ConfigError::Invalid(
                "site.dark_start_hour and site.dark_end_hour must be 0-23".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            engine: EngineConfig::default(),
            scheduler: SchedulerConfig::default(),
            site: SiteConfig::default(),
        }
    }
}

fn home_dir() -> PathBuf {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("cannot parse config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.max_tool_rounds, 8);
        assert_eq!(config.engine.max_tools_per_round, 4);
        assert_eq!(config.engine.cycle_timeout_secs, 120);
        assert_eq!(config.scheduler.reactive_cooldown_secs, 600);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.engine.max_tool_rounds, config.engine.max_tool_rounds);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_round_cap_rejected() {
        let mut config = AppConfig::default();
        config.engine.max_tool_rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn model_timeout_must_fit_cycle_budget() {
        let mut config = AppConfig::default();
        config.engine.model_call_timeout_secs = 300;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().engine.max_tool_rounds, 8);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
model = "anthropic/claude-opus-4"

[engine]
max_tool_rounds = 5

[scheduler]
reactive_cooldown_secs = 120
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model, "anthropic/claude-opus-4");
        assert_eq!(config.engine.max_tool_rounds, 5);
        // Unset fields fall back to defaults
        assert_eq!(config.engine.max_tools_per_round, 4);
        assert_eq!(config.scheduler.reactive_cooldown_secs, 120);
        assert_eq!(config.scheduler.cycle_interval_minutes, 120);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn load_from_tempfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = \"test-model\"\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "test-model");
    }

    #[test]
    fn duration_helpers() {
        let config = AppConfig::default();
        assert_eq!(config.engine.cycle_timeout(), Duration::from_secs(120));
        assert_eq!(config.scheduler.reactive_cooldown(), Duration::from_secs(600));
        assert_eq!(
            config.scheduler.cycle_interval(),
            Duration::from_secs(120 * 60)
        );
    }
}
