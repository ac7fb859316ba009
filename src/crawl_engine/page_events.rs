//! Per-navigation CDP event pump.
//!
//! Subscribes to the four network event streams for one navigation and
//! fans them into the capture buffer and the idle watcher from a single
//! `select!` loop: one event is handled to completion before the next is
//! processed, so neither consumer ever sees concurrent mutation. Dropping
//! the pump drops the subscriptions, which is the unsubscribe step that
//! keeps a stale navigation's handlers from observing the next one.

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::net_watch::{IdleOutcome, NetIdleWatcher, NetworkSignal};
use crate::request_monitor::RequestMonitor;

/// The four network event subscriptions for one navigation.
pub struct PageEventPump {
    requests: EventStream<EventRequestWillBeSent>,
    responses: EventStream<EventResponseReceived>,
    finished: EventStream<EventLoadingFinished>,
    failed: EventStream<EventLoadingFailed>,
}

impl PageEventPump {
    /// Subscribe to the page's network events. Must happen before the
    /// navigation command so no early event is missed; the streams buffer
    /// until `drive` drains them.
    pub async fn subscribe(page: &Page) -> Result<Self> {
        let requests = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .context("Failed to subscribe to requestWillBeSent")?;
        let responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .context("Failed to subscribe to responseReceived")?;
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .context("Failed to subscribe to loadingFinished")?;
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .context("Failed to subscribe to loadingFailed")?;
        Ok(Self {
            requests,
            responses,
            finished,
            failed,
        })
    }

    /// Pump events into the monitor and the watcher until the watcher
    /// yields its terminal outcome. Consumes the pump; the subscriptions
    /// and the watcher's signal channel are torn down on return.
    pub async fn drive(
        mut self,
        monitor: &mut RequestMonitor,
        watcher: NetIdleWatcher,
    ) -> IdleOutcome {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let watcher_fut = watcher.run(signal_rx);
        tokio::pin!(watcher_fut);

        loop {
            tokio::select! {
                outcome = &mut watcher_fut => return outcome,
                Some(event) = self.requests.next() => {
                    monitor.on_request_will_be_sent(&event);
                    let _ = signal_tx.send(NetworkSignal::RequestStarted(
                        event.request_id.inner().to_string(),
                    ));
                }
                Some(event) = self.responses.next() => {
                    monitor.on_response_received(&event);
                }
                Some(event) = self.finished.next() => {
                    let _ = signal_tx.send(NetworkSignal::RequestFinished(
                        event.request_id.inner().to_string(),
                    ));
                }
                Some(event) = self.failed.next() => {
                    let _ = signal_tx.send(NetworkSignal::RequestFinished(
                        event.request_id.inner().to_string(),
                    ));
                }
            }
        }
    }
}
