//! Idle-watcher timing tests, run on tokio's paused clock so quiet
//! periods and ceilings elapse instantly and deterministically.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use warcforge::net_watch::{IdleOutcome, IdleParams, NetIdleWatcher, NetworkSignal};

fn test_params() -> IdleParams {
    IdleParams {
        global_wait: Duration::from_secs(30),
        idle_time: Duration::from_millis(500),
        idle_inflight_threshold: 2,
        nav_timeout: Duration::from_secs(5),
    }
}

#[tokio::test(start_paused = true)]
async fn zero_traffic_resolves_exactly_once_at_global_ceiling() {
    let watcher = NetIdleWatcher::new(test_params());
    let (_tx, rx) = mpsc::unbounded_channel::<NetworkSignal>();

    let start = tokio::time::Instant::now();
    let outcome = watcher.run(rx).await;

    // The quiet period only arms once a finished signal is seen, so a
    // page with no traffic at all rides out the full ceiling.
    assert_eq!(outcome, IdleOutcome::GlobalTimeout);
    assert!(start.elapsed() >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn single_request_lifecycle_reaches_idle() {
    let watcher = NetIdleWatcher::new(test_params());
    let (tx, rx) = mpsc::unbounded_channel();

    tx.send(NetworkSignal::RequestStarted("doc".to_string()))
        .unwrap();
    tx.send(NetworkSignal::RequestFinished("doc".to_string()))
        .unwrap();

    let start = tokio::time::Instant::now();
    let outcome = watcher.run(rx).await;

    assert_eq!(outcome, IdleOutcome::NetworkIdle);
    assert!(start.elapsed() >= Duration::from_millis(500));
    assert!(start.elapsed() < Duration::from_secs(30));
    drop(tx);
}

#[tokio::test(start_paused = true)]
async fn traffic_above_threshold_defers_idle() {
    let watcher = NetIdleWatcher::new(test_params());
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = tokio::spawn(async move {
        // Three concurrent requests exceed the threshold of two.
        for id in ["a", "b", "c"] {
            tx.send(NetworkSignal::RequestStarted(id.to_string()))
                .unwrap();
        }
        sleep(Duration::from_secs(2)).await;
        // One finishes; two remain, which is quiet enough.
        tx.send(NetworkSignal::RequestFinished("a".to_string()))
            .unwrap();
        // Keep the channel open past resolution.
        sleep(Duration::from_secs(60)).await;
        drop(tx);
    });

    let start = tokio::time::Instant::now();
    let outcome = watcher.run(rx).await;
    driver.abort();

    assert_eq!(outcome, IdleOutcome::NetworkIdle);
    // Two seconds of over-threshold traffic, then the quiet period.
    assert!(start.elapsed() >= Duration::from_secs(2) + Duration::from_millis(500));
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn global_ceiling_fires_under_constant_traffic() {
    let watcher = NetIdleWatcher::new(test_params());
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = tokio::spawn(async move {
        let mut n = 0u64;
        loop {
            tx.send(NetworkSignal::RequestStarted(format!("req-{n}")))
                .unwrap();
            n += 1;
            sleep(Duration::from_millis(100)).await;
        }
    });

    let start = tokio::time::Instant::now();
    let outcome = watcher.run(rx).await;
    driver.abort();

    assert_eq!(outcome, IdleOutcome::GlobalTimeout);
    assert!(start.elapsed() >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn channel_close_lets_timers_resolve() {
    let watcher = NetIdleWatcher::new(test_params());
    let (tx, rx) = mpsc::unbounded_channel();

    tx.send(NetworkSignal::RequestStarted("a".to_string()))
        .unwrap();
    drop(tx);

    let outcome = watcher.run(rx).await;
    assert_eq!(outcome, IdleOutcome::NetworkIdle);
}

#[tokio::test(start_paused = true)]
async fn finish_below_threshold_arms_quiet_period() {
    let watcher = NetIdleWatcher::new(test_params());
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = tokio::spawn(async move {
        for id in ["a", "b", "c", "d"] {
            tx.send(NetworkSignal::RequestStarted(id.to_string()))
                .unwrap();
        }
        sleep(Duration::from_secs(1)).await;
        tx.send(NetworkSignal::RequestFinished("a".to_string()))
            .unwrap();
        tx.send(NetworkSignal::RequestFinished("b".to_string()))
            .unwrap();
        sleep(Duration::from_secs(60)).await;
    });

    let start = tokio::time::Instant::now();
    let outcome = watcher.run(rx).await;
    driver.abort();

    assert_eq!(outcome, IdleOutcome::NetworkIdle);
    // Roughly one second of traffic plus the half-second quiet period.
    assert!(start.elapsed() >= Duration::from_millis(1500));
    assert!(start.elapsed() < Duration::from_secs(30));
}
