use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of the agent.
///
/// Single source of truth for whether the production loop is expected to be
/// active. `Crashed` is terminal for the run: the loop has exited and only
/// an explicit reset followed by a start resumes production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Idle,
    Running,
    Crashed,
}

/// One synthetic sensor reading.
///
/// Created only by the production loop; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// Point-in-time view of the engine, as served by GET /status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub state: AgentState,
    pub reading_count: usize,
    pub error: Option<String>,
}
