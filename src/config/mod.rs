use crate::measure::EngineConfig;
use std::time::Duration;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub engine: EngineConfig,
    /// HTTP listen port.
    pub port: u16,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                interval: Duration::from_secs(1),
                crash_probability: 0.005,
                max_history: 200,
            },
            port: 5100,
        }
    }
}

impl AgentConfig {
    /// Build from env vars, falling back to defaults on absence or parse
    /// failure. Non-positive intervals and history caps keep their defaults;
    /// the crash probability is clamped to [0, 1].
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("MEASUREMENT_INTERVAL") {
            if let Ok(secs) = v.parse::<f64>() {
                if secs.is_finite() && secs > 0.0 {
                    cfg.engine.interval = Duration::from_secs_f64(secs);
                }
            }
        }
        if let Ok(v) = std::env::var("CRASH_PROBABILITY") {
            if let Ok(p) = v.parse::<f64>() {
                if p.is_finite() {
                    cfg.engine.crash_probability = p.clamp(0.0, 1.0);
                }
            }
        }
        if let Ok(v) = std::env::var("MAX_HISTORY") {
            if let Ok(n) = v.parse::<usize>() {
                if n > 0 {
                    cfg.engine.max_history = n;
                }
            }
        }
        if let Ok(v) = std::env::var("PORT") {
            if let Ok(p) = v.parse::<u16>() {
                cfg.port = p;
            }
        }

        cfg
    }
}
