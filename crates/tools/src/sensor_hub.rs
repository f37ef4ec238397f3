//! Shared sensor store and the context provider built on top of it.
//!
//! Sensor drivers live outside this crate; they push readings into the hub
//! whenever they have them. The hub answers two questions: "what is sensor X
//! right now?" (the `read_sensor` tool) and "what does the whole site look
//! like?" (the context snapshot taken at cycle start). Readings older than
//! the freshness window are still returned, but flagged stale.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use verdant_core::context::{ContextProvider, ContextSnapshot, SensorReading};

/// One stored reading.
#[derive(Debug, Clone)]
pub struct StoredReading {
    pub value: f64,
    pub unit: String,
    pub updated_at: DateTime<Utc>,
}

/// Process-wide sensor state, written by drivers and read by cycles.
pub struct SensorHub {
    readings: RwLock<HashMap<String, StoredReading>>,
    freshness_window: Duration,
}

impl SensorHub {
    pub fn new() -> Self {
        Self {
            readings: RwLock::new(HashMap::new()),
            freshness_window: Duration::from_secs(15 * 60),
        }
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Record a reading (called by sensor drivers).
    pub async fn record(&self, sensor: &str, value: f64, unit: &str) {
        self.readings.write().await.insert(
            sensor.to_string(),
            StoredReading {
                value,
                unit: unit.to_string(),
                updated_at: Utc::now(),
            },
        );
    }

    /// Read one sensor by name.
    pub async fn read(&self, sensor: &str) -> Option<StoredReading> {
        self.readings.read().await.get(sensor).cloned()
    }

    /// Names of all known sensors, sorted.
    pub async fn sensor_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.readings.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether a reading taken at `updated_at` still counts as fresh.
    pub fn is_fresh(&self, updated_at: DateTime<Utc>) -> bool {
        let age = Utc::now().signed_duration_since(updated_at);
        age.num_seconds() >= 0 && (age.num_seconds() as u64) <= self.freshness_window.as_secs()
    }

    /// All readings as context-snapshot entries, sorted by sensor name.
    pub async fn snapshot_readings(&self) -> Vec<SensorReading> {
        let map = self.readings.read().await;
        let mut readings: Vec<SensorReading> = map
            .iter()
            .map(|(name, r)| SensorReading {
                sensor: name.clone(),
                value: r.value,
                unit: r.unit.clone(),
                fresh: self.is_fresh(r.updated_at),
            })
            .collect();
        readings.sort_by(|a, b| a.sensor.cmp(&b.sensor));
        readings
    }

    /// Seed plausible readings for development and demos (no hardware).
    pub async fn seed_demo(&self) {
        self.record("soil_moisture", 41.5, "%").await;
        self.record("air_temp", 23.1, "°C").await;
        self.record("humidity", 58.0, "%").await;
        self.record("light_level", 310.0, "µmol/m²/s").await;
    }
}

impl Default for SensorHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Context provider backed by the hub plus site configuration.
///
/// The dark period is derived from the configured photoperiod window, not
/// from the light sensor — the snapshot is the authority the model trusts,
/// so it must come from configuration, not from a proxy signal.
pub struct HubContextProvider {
    hub: std::sync::Arc<SensorHub>,
    growth_stage: String,
    /// Dark period as [start, end) hours UTC; wraps midnight when start > end
    dark_start_hour: u32,
    dark_end_hour: u32,
}

impl HubContextProvider {
    pub fn new(
        hub: std::sync::Arc<SensorHub>,
        growth_stage: impl Into<String>,
        dark_start_hour: u32,
        dark_end_hour: u32,
    ) -> Self {
        Self {
            hub,
            growth_stage: growth_stage.into(),
            dark_start_hour,
            dark_end_hour,
        }
    }

    fn dark_period_at(&self, at: DateTime<Utc>) -> bool {
        use chrono::Timelike;
        let hour = at.hour();
        if self.dark_start_hour <= self.dark_end_hour {
            hour >= self.dark_start_hour && hour < self.dark_end_hour
        } else {
            hour >= self.dark_start_hour || hour < self.dark_end_hour
        }
    }
}

#[async_trait::async_trait]
impl ContextProvider for HubContextProvider {
    async fn snapshot(&self) -> ContextSnapshot {
        let captured_at = Utc::now();
        ContextSnapshot {
            captured_at,
            growth_stage: self.growth_stage.clone(),
            is_dark_period: self.dark_period_at(captured_at),
            readings: self.hub.snapshot_readings().await,
            notes: Vec::new(),
        }
    }
}
