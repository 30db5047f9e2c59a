use super::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

fn test_config(interval_ms: u64, crash_probability: f64, max_history: usize) -> EngineConfig {
    EngineConfig {
        interval: Duration::from_millis(interval_ms),
        crash_probability,
        max_history,
    }
}

#[tokio::test]
async fn test_start_transitions_idle_to_running() {
    let engine = MeasurementEngine::new(test_config(60_000, 0.0, 10));

    let status = engine.status();
    assert_eq!(status.state, AgentState::Idle);
    assert_eq!(status.reading_count, 0);
    assert_eq!(status.error, None);

    assert!(engine.start().await);
    assert_eq!(engine.status().state, AgentState::Running);

    // Second start is refused and changes nothing
    assert!(!engine.start().await);
    assert_eq!(engine.status().state, AgentState::Running);

    assert!(engine.stop().await);
}

#[tokio::test]
async fn test_stop_requires_running() {
    let engine = MeasurementEngine::new(test_config(60_000, 0.0, 10));

    // Stop while idle is refused
    assert!(!engine.stop().await);
    assert_eq!(engine.status().state, AgentState::Idle);

    assert!(engine.start().await);
    assert!(engine.stop().await);
    assert_eq!(engine.status().state, AgentState::Idle);

    // Already stopped
    assert!(!engine.stop().await);
}

#[tokio::test]
async fn test_reset_is_noop_unless_crashed() {
    let engine = MeasurementEngine::new(test_config(60_000, 0.0, 10));

    engine.reset();
    assert_eq!(engine.status().state, AgentState::Idle);

    assert!(engine.start().await);
    engine.reset();
    assert_eq!(engine.status().state, AgentState::Running);

    assert!(engine.stop().await);
}

#[tokio::test]
async fn test_crash_sets_error_and_requires_reset() {
    let engine = MeasurementEngine::new(test_config(10, 1.0, 10));

    assert!(engine.start().await);
    sleep(Duration::from_millis(100)).await;

    let status = engine.status();
    assert_eq!(status.state, AgentState::Crashed);
    assert!(status.error.as_deref().is_some_and(|e| !e.is_empty()));

    // Crashed is not running: stop is refused and changes nothing
    assert!(!engine.stop().await);
    assert_eq!(engine.status().state, AgentState::Crashed);

    engine.reset();
    let status = engine.status();
    assert_eq!(status.state, AgentState::Idle);
    assert_eq!(status.error, None);

    // Reset is idempotent
    engine.reset();
    assert_eq!(engine.status().state, AgentState::Idle);

    // The agent can be started again after a reset
    assert!(engine.start().await);
}

#[tokio::test]
async fn test_production_appends_ordered_plausible_readings() {
    let engine = MeasurementEngine::new(test_config(50, 0.0, 100));

    assert!(engine.start().await);
    sleep(Duration::from_millis(300)).await;
    assert!(engine.stop().await);

    let readings = engine.latest(100);
    assert!(readings.len() >= 2, "expected at least 2 readings, got {}", readings.len());

    for window in readings.windows(2) {
        assert!(window[0].timestamp < window[1].timestamp);
    }

    // Values stay within a few standard deviations of their baselines
    for r in &readings {
        assert!((8.0..=32.0).contains(&r.temperature), "temperature {}", r.temperature);
        assert!((20.0..=80.0).contains(&r.humidity), "humidity {}", r.humidity);
        assert!((995.0..=1031.0).contains(&r.pressure), "pressure {}", r.pressure);
    }
}

#[tokio::test]
async fn test_stop_halts_production() {
    let engine = MeasurementEngine::new(test_config(10, 0.0, 100));

    assert!(engine.start().await);
    sleep(Duration::from_millis(100)).await;
    assert!(engine.stop().await);

    let count = engine.status().reading_count;
    assert!(count >= 1);

    // No further appends after stop
    sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.status().reading_count, count);

    // Reset in idle is a no-op and keeps history
    engine.reset();
    assert_eq!(engine.status().reading_count, count);
}

#[tokio::test]
async fn test_history_capped_fifo() {
    let engine = MeasurementEngine::new(test_config(1, 0.0, 5));

    assert!(engine.start().await);
    sleep(Duration::from_millis(200)).await;
    assert!(engine.stop().await);

    // Cap held, oldest evicted
    assert_eq!(engine.status().reading_count, 5);
    let readings = engine.latest(100);
    assert_eq!(readings.len(), 5);
    for window in readings.windows(2) {
        assert!(window[0].timestamp < window[1].timestamp);
    }
}

#[tokio::test]
async fn test_latest_returns_most_recent_slice() {
    let engine = MeasurementEngine::new(test_config(1, 0.0, 50));

    assert!(engine.start().await);
    sleep(Duration::from_millis(100)).await;
    assert!(engine.stop().await);

    let all = engine.latest(50);
    let total = all.len();
    assert!(total >= 3);
    assert_eq!(engine.status().reading_count, total);

    assert!(engine.latest(0).is_empty());
    assert_eq!(engine.latest(total + 10).len(), total);

    // latest(3) is the tail of the full history, oldest-first
    let last_three = engine.latest(3);
    assert_eq!(last_three.len(), 3);
    assert_eq!(last_three, all[total - 3..].to_vec());
}

#[tokio::test]
async fn test_stop_wakes_sleeping_loop_promptly() {
    let engine = MeasurementEngine::new(test_config(60_000, 0.0, 10));

    assert!(engine.start().await);
    // Let the loop produce its first reading and enter the long sleep
    sleep(Duration::from_millis(50)).await;

    let begin = Instant::now();
    assert!(engine.stop().await);
    assert!(
        begin.elapsed() < Duration::from_secs(1),
        "stop took {:?}",
        begin.elapsed()
    );
    assert_eq!(engine.status().state, AgentState::Idle);
}

#[tokio::test]
async fn test_concurrent_callers_never_observe_torn_state() {
    let engine = Arc::new(MeasurementEngine::new(test_config(1, 0.05, 20)));
    let mut handles = vec![];

    // Readers assert the state/error invariant on every observation
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            for _ in 0..100 {
                let status = engine.status();
                assert_eq!(
                    status.error.is_some(),
                    status.state == AgentState::Crashed,
                    "torn read: error={:?} state={:?}",
                    status.error,
                    status.state
                );
                let _ = engine.latest(5);
                sleep(Duration::from_millis(1)).await;
            }
        }));
    }

    // Writers churn the lifecycle concurrently
    for i in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            for _ in 0..25 {
                match i % 3 {
                    0 => {
                        engine.start().await;
                    }
                    1 => {
                        engine.stop().await;
                    }
                    _ => engine.reset(),
                }
                sleep(Duration::from_millis(2)).await;
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    engine.stop().await;
    let status = engine.status();
    assert_eq!(status.error.is_some(), status.state == AgentState::Crashed);
}
