use crate::api::AgentAppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Body for every control response.
#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

fn message(status: StatusCode, message: &'static str) -> Response {
    (status, Json(MessageResponse { message })).into_response()
}

/// Create router for the lifecycle control endpoints
pub fn create_control_router(state: AgentAppState) -> Router {
    Router::new()
        .route("/start", post(start_measurement))
        .route("/stop", post(stop_measurement))
        .route("/reset", post(reset_agent))
        .with_state(Arc::new(state))
}

/// POST /start - begin producing measurements
async fn start_measurement(State(state): State<Arc<AgentAppState>>) -> Response {
    if state.engine.start().await {
        message(StatusCode::OK, "Measurement started")
    } else {
        message(StatusCode::CONFLICT, "Already running")
    }
}

/// POST /stop - stop producing measurements
async fn stop_measurement(State(state): State<Arc<AgentAppState>>) -> Response {
    if state.engine.stop().await {
        message(StatusCode::OK, "Measurement stopped")
    } else {
        message(StatusCode::CONFLICT, "Not running")
    }
}

/// POST /reset - clear a crash so the agent can be started again
async fn reset_agent(State(state): State<Arc<AgentAppState>>) -> Response {
    state.engine.reset();
    message(StatusCode::OK, "Agent reset")
}
