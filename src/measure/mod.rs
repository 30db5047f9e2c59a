// Measurement engine and agent lifecycle

mod engine;
mod reading;

pub use engine::{EngineConfig, MeasurementEngine};
pub use reading::{AgentState, EngineStatus, Reading};

#[cfg(test)]
mod tests;
