// HTTP control surface over the measurement engine

mod control;
mod telemetry;

pub use control::create_control_router;
pub use telemetry::create_telemetry_router;

use crate::measure::MeasurementEngine;
use std::sync::Arc;

/// Shared application state for the agent routers.
#[derive(Clone)]
pub struct AgentAppState {
    pub engine: Arc<MeasurementEngine>,
}
