//! Network-idle detection.
//!
//! `NetIdleWatcher` decides when a navigation's network activity has
//! settled. In-flight counting alone is not robust, since keep-alive and
//! long-polling connections never quiesce, so the watcher treats up to
//! `idle_inflight_threshold` concurrent requests as "quiet enough" and
//! backs the whole thing with a hard `global_wait` ceiling that guarantees
//! forward progress no matter what the page does.
//!
//! The watcher is consumed by `run()`, which reads a serialized stream of
//! `NetworkSignal`s from a channel and resolves to exactly one
//! `IdleOutcome`. Dropping the signal sender at the end of a navigation is
//! the unsubscribe step: a watcher from a stale navigation can never
//! observe events from the next one.

use std::collections::HashSet;
use std::time::Duration;

use log::{debug, trace};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Request lifecycle signals observed from the protocol transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkSignal {
    /// A request was issued; the id is the transport's request id.
    RequestStarted(String),
    /// A request finished loading or failed; either way it is no longer
    /// in flight.
    RequestFinished(String),
}

/// The terminal event for one navigation. `GlobalTimeout` means the hard
/// ceiling fired before the idle criteria were met; the orchestrator
/// proceeds identically in both cases; the distinction is observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleOutcome {
    NetworkIdle,
    GlobalTimeout,
}

/// Timing parameters for idle detection. All durations.
#[derive(Debug, Clone, Copy)]
pub struct IdleParams {
    /// Absolute ceiling before idle is forced regardless of traffic.
    pub global_wait: Duration,
    /// Quiet period required once the in-flight count is low.
    pub idle_time: Duration,
    /// Max concurrent in-flight requests still considered quiet.
    pub idle_inflight_threshold: usize,
    /// Ceiling for the initial navigation await. The watcher itself does
    /// not track navigation separately; the orchestrator bounds
    /// `page.goto` with this.
    pub nav_timeout: Duration,
}

impl Default for IdleParams {
    fn default() -> Self {
        Self {
            global_wait: Duration::from_secs(60),
            idle_time: Duration::from_millis(1500),
            idle_inflight_threshold: 2,
            nav_timeout: Duration::from_secs(8),
        }
    }
}

/// The idle-detection state machine for one navigation attempt.
#[derive(Debug)]
pub struct NetIdleWatcher {
    params: IdleParams,
    inflight: HashSet<String>,
    idle_deadline: Option<Instant>,
}

impl NetIdleWatcher {
    #[must_use]
    pub fn new(params: IdleParams) -> Self {
        Self {
            params,
            inflight: HashSet::new(),
            idle_deadline: None,
        }
    }

    /// Watch the signal stream until idle is reached or the global ceiling
    /// fires. Resolves exactly once; signals arriving after resolution are
    /// dropped with the channel.
    pub async fn run(mut self, mut signals: mpsc::UnboundedReceiver<NetworkSignal>) -> IdleOutcome {
        self.inflight.clear();
        let global_deadline = Instant::now() + self.params.global_wait;
        let mut channel_open = true;

        debug!(
            target: "warcforge::netwatch",
            "Watching network: global_wait={:?} idle_time={:?} threshold={} nav_wait={:?}",
            self.params.global_wait,
            self.params.idle_time,
            self.params.idle_inflight_threshold,
            self.params.nav_timeout
        );

        loop {
            // An idle deadline far in the future stands in for "not
            // armed" so the select arm can stay unconditional on a guard.
            let idle_at = self.idle_deadline.unwrap_or(global_deadline + self.params.idle_time);

            tokio::select! {
                () = sleep_until(global_deadline) => {
                    debug!(
                        target: "warcforge::netwatch",
                        "Global wait ceiling reached with {} request(s) in flight",
                        self.inflight.len()
                    );
                    return IdleOutcome::GlobalTimeout;
                }
                () = sleep_until(idle_at), if self.idle_deadline.is_some() => {
                    debug!(
                        target: "warcforge::netwatch",
                        "Network idle: {} request(s) in flight after quiet period",
                        self.inflight.len()
                    );
                    return IdleOutcome::NetworkIdle;
                }
                signal = signals.recv(), if channel_open => {
                    match signal {
                        Some(signal) => self.apply(signal),
                        None => {
                            // Transport gone; let the timers decide.
                            channel_open = false;
                            if self.idle_deadline.is_none() {
                                self.idle_deadline = Some(Instant::now() + self.params.idle_time);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Apply one signal to the in-flight set, arming or cancelling the
    /// idle timer per the threshold rules.
    fn apply(&mut self, signal: NetworkSignal) {
        match signal {
            NetworkSignal::RequestStarted(id) => {
                self.inflight.insert(id);
                trace!(
                    target: "warcforge::netwatch",
                    "Request started, {} in flight",
                    self.inflight.len()
                );
                if self.inflight.len() > self.params.idle_inflight_threshold {
                    // Traffic picked back up; the quiet period must
                    // restart once it drains again.
                    self.idle_deadline = None;
                }
            }
            NetworkSignal::RequestFinished(id) => {
                self.inflight.remove(&id);
                trace!(
                    target: "warcforge::netwatch",
                    "Request finished, {} in flight",
                    self.inflight.len()
                );
                if self.inflight.len() <= self.params.idle_inflight_threshold
                    && self.idle_deadline.is_none()
                {
                    self.idle_deadline = Some(Instant::now() + self.params.idle_time);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn inflight_count(&self) -> usize {
        self.inflight.len()
    }

    #[cfg(test)]
    pub(crate) fn idle_timer_armed(&self) -> bool {
        self.idle_deadline.is_some()
    }

    #[cfg(test)]
    pub(crate) fn apply_for_test(&mut self, signal: NetworkSignal) {
        self.apply(signal);
    }
}
