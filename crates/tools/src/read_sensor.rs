//! Sensor read tool — the model's view into the hub.

use async_trait::async_trait;
use std::sync::Arc;
use verdant_core::error::ToolError;
use verdant_core::tool::{ArgKind, Tool, ToolSchema};

use crate::sensor_hub::SensorHub;

pub struct ReadSensorTool {
    hub: Arc<SensorHub>,
}

impl ReadSensorTool {
    pub fn new(hub: Arc<SensorHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl Tool for ReadSensorTool {
    fn name(&self) -> &str {
        "read_sensor"
    }

    fn description(&self) -> &str {
        "Read the current value of a named sensor (e.g. soil_moisture, air_temp, \
         humidity, light_level). Returns the value, unit, age of the reading, and \
         whether it is fresh."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().required("sensor", ArgKind::String, "The sensor name to read")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let sensor = arguments["sensor"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'sensor' argument".into()))?;

        let Some(reading) = self.hub.read(sensor).await else {
            let known = self.hub.sensor_names().await;
            return Err(ToolError::ExecutionFailed {
                tool_name: "read_sensor".into(),
                reason: format!(
                    "no sensor named '{sensor}' (known sensors: {})",
                    if known.is_empty() {
                        "none".to_string()
                    } else {
                        known.join(", ")
                    }
                ),
            });
        };

        let age_secs = chrono::Utc::now()
            .signed_duration_since(reading.updated_at)
            .num_seconds()
            .max(0);

        let payload = serde_json::json!({
            "sensor": sensor,
            "value": reading.value,
            "unit": reading.unit,
            "age_secs": age_secs,
            "fresh": self.hub.is_fresh(reading.updated_at),
        });
        Ok(payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_known_sensor() {
        let hub = Arc::new(SensorHub::new());
        hub.record("soil_moisture", 41.5, "%").await;

        let tool = ReadSensorTool::new(hub);
        let out = tool
            .execute(serde_json::json!({"sensor": "soil_moisture"}))
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["value"], 41.5);
        assert_eq!(parsed["unit"], "%");
        assert_eq!(parsed["fresh"], true);
    }

    #[tokio::test]
    async fn unknown_sensor_lists_known_names() {
        let hub = Arc::new(SensorHub::new());
        hub.record("air_temp", 23.0, "°C").await;

        let tool = ReadSensorTool::new(hub);
        let err = tool
            .execute(serde_json::json!({"sensor": "co2"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("air_temp"));
    }

    #[test]
    fn tool_definition() {
        let tool = ReadSensorTool::new(Arc::new(SensorHub::new()));
        let def = tool.to_definition();
        assert_eq!(def.name, "read_sensor");
        assert_eq!(def.parameters["required"], serde_json::json!(["sensor"]));
    }
}
