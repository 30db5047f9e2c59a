use anyhow::{Context, Result};
use axum::Router;
use sensorsim::api::{create_control_router, create_telemetry_router, AgentAppState};
use sensorsim::config::AgentConfig;
use sensorsim::measure::MeasurementEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sensorsim=info".into()),
        )
        .init();

    let config = AgentConfig::from_env();
    info!(
        interval_ms = config.engine.interval.as_millis() as u64,
        crash_probability = config.engine.crash_probability,
        max_history = config.engine.max_history,
        "Sensor agent starting"
    );

    // The engine is constructed idle; production starts on POST /start
    let engine = Arc::new(MeasurementEngine::new(config.engine.clone()));
    let state = AgentAppState { engine };

    // The dashboard polls the agent from another origin
    let app = Router::new()
        .merge(create_control_router(state.clone()))
        .merge(create_telemetry_router(state))
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
