//! Built-in tool implementations for Verdant.
//!
//! Tools give the decision engine its hands and memory: read sensors,
//! command actuators, keep a care journal, fetch external data. The
//! registry is assembled once at startup; the engine never hardcodes tool
//! identities.

pub mod http_request;
pub mod journal;
pub mod read_sensor;
pub mod sensor_hub;
pub mod set_actuator;

pub use journal::{JournalEntry, JournalStore, JournalTool};
pub use read_sensor::ReadSensorTool;
pub use sensor_hub::{HubContextProvider, SensorHub, StoredReading};
pub use set_actuator::{ActuatorPort, MockActuatorPort, SetActuatorTool};

use std::sync::Arc;
use verdant_core::error::ToolError;
use verdant_core::tool::{ExecutorLimits, ToolRegistry};

/// Create the default tool registry wired to the given collaborators.
pub fn default_registry(
    hub: Arc<SensorHub>,
    journal: Arc<JournalStore>,
    actuators: Arc<dyn ActuatorPort>,
    limits: ExecutorLimits,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new().with_limits(limits);
    registry.register(Box::new(ReadSensorTool::new(hub)));
    registry.register(Box::new(SetActuatorTool::new(actuators)));
    registry.register(Box::new(JournalTool::new(journal)));
    registry.register(Box::new(http_request::HttpRequestTool::new()?));
    Ok(registry)
}
