//! Cycle context — the snapshot injected at the start of every cycle.
//!
//! The engine reads the context provider exactly once per cycle and renders
//! the snapshot into the system prompt. The snapshot always carries an
//! explicit authoritative timestamp and explicit mode flags: a model left to
//! infer time-of-day from proxy signals (lamp state, temperature drift) gets
//! it wrong, so the prompt tells it outright and tells it to trust what it
//! is told.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sensor reading in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    /// Sensor name (e.g., "soil_moisture")
    pub sensor: String,

    pub value: f64,

    /// Unit label (e.g., "%", "°C")
    pub unit: String,

    /// False when the driver hasn't refreshed this reading recently
    pub fresh: bool,
}

/// A point-in-time view of the plant and its environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Authoritative wall-clock time of the snapshot
    pub captured_at: DateTime<Utc>,

    /// Current growth stage (e.g., "seedling", "vegetative", "flowering")
    pub growth_stage: String,

    /// Whether the configured dark period is currently active. Trusted
    /// over any inference from readings.
    pub is_dark_period: bool,

    /// Current sensor readings with freshness flags
    pub readings: Vec<SensorReading>,

    /// Free-form operator notes for this cycle
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl ContextSnapshot {
    /// Render the snapshot as a prompt block.
    pub fn render(&self) -> String {
        let mut out = String::from(
            "## Current context\n\
             The following values are authoritative. Trust them over anything \
             you might infer from sensor readings or prior messages.\n",
        );
        out.push_str(&format!(
            "- Current time (UTC): {}\n",
            self.captured_at.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("- Growth stage: {}\n", self.growth_stage));
        out.push_str(&format!("- Dark period active: {}\n", self.is_dark_period));

        if self.readings.is_empty() {
            out.push_str("- Sensor readings: none available\n");
        } else {
            out.push_str("- Sensor readings:\n");
            for r in &self.readings {
                out.push_str(&format!(
                    "  - {}: {}{}{}\n",
                    r.sensor,
                    r.value,
                    r.unit,
                    if r.fresh { "" } else { " (stale)" }
                ));
            }
        }

        for note in &self.notes {
            out.push_str(&format!("- Note: {note}\n"));
        }
        out
    }
}

/// Supplies the context snapshot at cycle start.
///
/// Called once per cycle; the engine does not poll it mid-cycle. A mid-cycle
/// refresh would let the context drift under the model's feet while it is
/// still reasoning about the first snapshot.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn snapshot(&self) -> ContextSnapshot;
}

/// A provider that always returns a fixed snapshot. Useful for tests and
/// for one-shot queries where live context is unavailable.
pub struct StaticContextProvider {
    snapshot: ContextSnapshot,
}

impl StaticContextProvider {
    pub fn new(snapshot: ContextSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ContextProvider for StaticContextProvider {
    async fn snapshot(&self) -> ContextSnapshot {
        self.snapshot.clone()
    }
}
