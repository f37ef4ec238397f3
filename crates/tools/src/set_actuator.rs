//! Actuator tool — the hardware side-effect boundary.
//!
//! The tool itself owns no hardware. Commands go through an [`ActuatorPort`]
//! implementation supplied at construction; the real port (GPIO, relay
//! board, pump controller) lives outside this workspace. A recording mock
//! port ships here for tests and dry runs.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use verdant_core::error::ToolError;
use verdant_core::tool::{ArgKind, Tool, ToolSchema};

/// The hardware boundary. `apply` returns a short confirmation string or a
/// failure reason.
#[async_trait]
pub trait ActuatorPort: Send + Sync {
    async fn apply(&self, actuator: &str, command: &str) -> Result<String, String>;

    /// Actuator names this port controls.
    fn actuators(&self) -> Vec<String>;
}

/// A port that records every command and confirms it. No hardware.
pub struct MockActuatorPort {
    actuators: Vec<String>,
    log: std::sync::Mutex<Vec<(String, String)>>,
}

impl MockActuatorPort {
    pub fn new(actuators: Vec<String>) -> Self {
        Self {
            actuators,
            log: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Default set for a single-plant site.
    pub fn default_site() -> Self {
        Self::new(vec![
            "pump".into(),
            "grow_light".into(),
            "exhaust_fan".into(),
        ])
    }

    /// Every command applied so far.
    pub fn commands(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActuatorPort for MockActuatorPort {
    async fn apply(&self, actuator: &str, command: &str) -> Result<String, String> {
        if !self.actuators.iter().any(|a| a == actuator) {
            return Err(format!("no actuator named '{actuator}'"));
        }
        self.log
            .lock()
            .unwrap()
            .push((actuator.to_string(), command.to_string()));
        Ok(format!("{actuator}: {command} applied"))
    }

    fn actuators(&self) -> Vec<String> {
        self.actuators.clone()
    }
}

/// Tool exposing the actuator port to the model.
pub struct SetActuatorTool {
    port: Arc<dyn ActuatorPort>,
}

impl SetActuatorTool {
    pub fn new(port: Arc<dyn ActuatorPort>) -> Self {
        Self { port }
    }
}

#[async_trait]
impl Tool for SetActuatorTool {
    fn name(&self) -> &str {
        "set_actuator"
    }

    fn description(&self) -> &str {
        "Send a command to a named actuator (e.g. pump, grow_light, exhaust_fan). \
         Commands: 'on', 'off', or a device-specific setting like 'run_seconds:30'."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .required("actuator", ArgKind::String, "The actuator to command")
            .required("command", ArgKind::String, "The command to apply")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let actuator = arguments["actuator"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'actuator' argument".into()))?;
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;

        if command.trim().is_empty() {
            return Err(ToolError::InvalidArguments("Command must not be empty".into()));
        }

        info!(actuator, command, "Applying actuator command");
        self.port
            .apply(actuator, command)
            .await
            .map_err(|reason| ToolError::ExecutionFailed {
                tool_name: "set_actuator".into(),
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn applies_command_through_port() {
        let port = Arc::new(MockActuatorPort::default_site());
        let tool = SetActuatorTool::new(port.clone());

        let out = tool
            .execute(serde_json::json!({"actuator": "pump", "command": "run_seconds:30"}))
            .await
            .unwrap();
        assert!(out.contains("applied"));
        assert_eq!(port.commands(), vec![("pump".into(), "run_seconds:30".into())]);
    }

    #[tokio::test]
    async fn unknown_actuator_fails() {
        let tool = SetActuatorTool::new(Arc::new(MockActuatorPort::default_site()));
        let err = tool
            .execute(serde_json::json!({"actuator": "laser", "command": "on"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("laser"));
    }

    #[tokio::test]
    async fn empty_command_rejected() {
        let tool = SetActuatorTool::new(Arc::new(MockActuatorPort::default_site()));
        let err = tool
            .execute(serde_json::json!({"actuator": "pump", "command": "  "}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
