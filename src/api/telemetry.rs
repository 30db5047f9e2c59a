use crate::api::AgentAppState;
use crate::measure::{EngineStatus, Reading};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query parameters for the readings endpoint.
#[derive(Deserialize)]
struct DataParams {
    /// How many of the most recent readings to return (default 20).
    n: Option<i64>,
}

#[derive(Serialize)]
struct HealthResponse {
    healthy: bool,
}

/// Create router for the read-only telemetry endpoints
pub fn create_telemetry_router(state: AgentAppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/data", get(get_data))
        .route("/health", get(health))
        .with_state(Arc::new(state))
}

/// GET /status - current state, reading count, and any fault message
async fn get_status(State(state): State<Arc<AgentAppState>>) -> Json<EngineStatus> {
    Json(state.engine.status())
}

/// GET /data?n=N - up to the last N readings, oldest first (default 20)
///
/// Negative values clamp to an empty result; a non-numeric `n` is rejected
/// by query deserialization with 400.
async fn get_data(
    State(state): State<Arc<AgentAppState>>,
    Query(params): Query<DataParams>,
) -> Json<Vec<Reading>> {
    let n = params.n.unwrap_or(20).max(0) as usize;
    Json(state.engine.latest(n))
}

/// GET /health - liveness probe, 200 whenever the process is up
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { healthy: true })
}
