use crate::measure::reading::{AgentState, EngineStatus, Reading};
use chrono::Utc;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Message stored when a tick draws a simulated fault.
const SENSOR_FAULT: &str = "Simulated sensor hardware fault!";

/// Upper bound on how long `stop` waits for the production task to exit.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Construction parameters, fixed for the engine's lifetime.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Time between production ticks.
    pub interval: Duration,
    /// Probability of a simulated fault per tick, in [0, 1].
    pub crash_probability: f64,
    /// Cap on retained readings; oldest evicted first.
    pub max_history: usize,
}

/// Mutable aggregate shared between the production task and callers.
///
/// All access goes through the single mutex in [`MeasurementEngine`], so a
/// reader can never observe a torn (state, error_message) pair.
struct EngineShared {
    state: AgentState,
    history: VecDeque<Reading>,
    error_message: Option<String>,
}

/// Handle to the spawned production task for the current run.
struct Runner {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Simulated measurement device.
///
/// Produces random sensor readings at a configurable interval from a
/// background task, with a configurable probability of "crashing" on each
/// tick to exercise external health-monitoring logic. A crash is terminal
/// for the run: production resumes only after [`reset`](Self::reset)
/// followed by [`start`](Self::start).
pub struct MeasurementEngine {
    config: EngineConfig,
    shared: Arc<Mutex<EngineShared>>,
    /// Serializes start/stop so a second production task can never be
    /// spawned while one is active.
    runner: tokio::sync::Mutex<Option<Runner>>,
}

impl MeasurementEngine {
    /// Create an idle engine. Construction never starts background work.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Mutex::new(EngineShared {
                state: AgentState::Idle,
                history: VecDeque::new(),
                error_message: None,
            })),
            runner: tokio::sync::Mutex::new(None),
        }
    }

    /// Start producing measurements. Returns `false` if already running.
    ///
    /// Starting from `Crashed` clears the fault message without requiring a
    /// separate reset.
    pub async fn start(&self) -> bool {
        let mut runner = self.runner.lock().await;

        {
            let mut shared = self.shared.lock().expect("engine state lock poisoned");
            if shared.state == AgentState::Running {
                return false;
            }
            shared.state = AgentState::Running;
            shared.error_message = None;
        }

        // Any previous task has already exited (stopped or crashed out);
        // drop its finished handle.
        runner.take();

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_production_loop(
            self.config.clone(),
            Arc::clone(&self.shared),
            stop_rx,
        ));
        *runner = Some(Runner { stop_tx, handle });

        info!("Measurement started");
        true
    }

    /// Gracefully stop the engine. Returns `false` if not running.
    ///
    /// A crashed engine is not running; it must go through
    /// [`reset`](Self::reset) instead. Blocks the caller until the
    /// production task acknowledges the stop signal, bounded by a 5 second
    /// join timeout; on timeout the stale task is aborted and the engine
    /// still reports success.
    pub async fn stop(&self) -> bool {
        let mut runner = self.runner.lock().await;

        {
            let shared = self.shared.lock().expect("engine state lock poisoned");
            if shared.state != AgentState::Running {
                return false;
            }
        }

        if let Some(run) = runner.take() {
            let _ = run.stop_tx.send(true);
            let mut handle = run.handle;
            match tokio::time::timeout(STOP_JOIN_TIMEOUT, &mut handle).await {
                Ok(_) => {}
                Err(_) => {
                    warn!("Production task did not exit within join timeout, aborting it");
                    handle.abort();
                }
            }
        }

        let mut shared = self.shared.lock().expect("engine state lock poisoned");
        shared.state = AgentState::Idle;
        // A fault may have landed between the running-check and the join;
        // stop wins so the (state, error) pair stays consistent.
        shared.error_message = None;

        info!("Measurement stopped");
        true
    }

    /// Reset after a crash so the agent can be started again.
    ///
    /// No-op in any other state; idempotent. History is kept.
    pub fn reset(&self) {
        let mut shared = self.shared.lock().expect("engine state lock poisoned");
        if shared.state == AgentState::Crashed {
            shared.state = AgentState::Idle;
            shared.error_message = None;
            info!("Agent reset");
        }
    }

    /// Current state, retained reading count, and any fault message.
    pub fn status(&self) -> EngineStatus {
        let shared = self.shared.lock().expect("engine state lock poisoned");
        EngineStatus {
            state: shared.state,
            reading_count: shared.history.len(),
            error: shared.error_message.clone(),
        }
    }

    /// Up to the last `n` readings in chronological order (oldest of the
    /// returned slice first). `n = 0` yields an empty vec; `n` past the
    /// retained count yields the full history.
    pub fn latest(&self, n: usize) -> Vec<Reading> {
        let shared = self.shared.lock().expect("engine state lock poisoned");
        let skip = shared.history.len().saturating_sub(n);
        shared.history.iter().skip(skip).cloned().collect()
    }
}

/// Outcome of a single production tick.
enum TickOutcome {
    Produced(Reading),
    Faulted(String),
    Stopped,
}

/// One tick: poll the stop signal, then draw a fault, then synthesize.
fn tick(config: &EngineConfig, stop_rx: &watch::Receiver<bool>) -> TickOutcome {
    if *stop_rx.borrow() {
        return TickOutcome::Stopped;
    }

    let mut rng = rand::thread_rng();
    if rng.gen::<f64>() < config.crash_probability {
        return TickOutcome::Faulted(SENSOR_FAULT.to_string());
    }

    TickOutcome::Produced(synthesize_reading(&mut rng))
}

/// Baseline plus Gaussian noise, rounded to 2 decimal places:
/// temperature N(20, 2), humidity N(50, 5), pressure N(1013, 3).
fn synthesize_reading(rng: &mut impl Rng) -> Reading {
    Reading {
        timestamp: Utc::now(),
        temperature: noisy(rng, 20.0, 2.0),
        humidity: noisy(rng, 50.0, 5.0),
        pressure: noisy(rng, 1013.0, 3.0),
    }
}

fn noisy(rng: &mut impl Rng, mean: f64, std_dev: f64) -> f64 {
    let normal = Normal::new(mean, std_dev).expect("finite mean and positive stddev");
    (normal.sample(rng) * 100.0).round() / 100.0
}

/// Background production loop. One instance per run; exits on the stop
/// signal or on a simulated fault.
async fn run_production_loop(
    config: EngineConfig,
    shared: Arc<Mutex<EngineShared>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    info!(
        interval_ms = config.interval.as_millis() as u64,
        crash_probability = config.crash_probability,
        "Production loop started"
    );

    loop {
        match tick(&config, &stop_rx) {
            TickOutcome::Stopped => break,
            TickOutcome::Faulted(reason) => {
                {
                    let mut shared = shared.lock().expect("engine state lock poisoned");
                    shared.state = AgentState::Crashed;
                    shared.error_message = Some(reason.clone());
                }
                error!(reason = %reason, "Simulated fault, production halted until reset");
                return;
            }
            TickOutcome::Produced(reading) => {
                let mut shared = shared.lock().expect("engine state lock poisoned");
                shared.history.push_back(reading);
                while shared.history.len() > config.max_history {
                    shared.history.pop_front();
                }
            }
        }

        // Interruptible sleep: wake immediately when stop is signalled.
        tokio::select! {
            _ = stop_rx.changed() => {}
            _ = tokio::time::sleep(config.interval) => {}
        }
    }

    debug!("Production loop exited on stop signal");
}
