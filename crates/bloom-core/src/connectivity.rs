//! Network reachability tracking.
//!
//! [`ConnectivityMonitor`] publishes only the latest reachability value.
//! Observers are level-triggered: a disconnect that is reversed before an
//! observer wakes up may never be seen.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::remote::DiaryApiClient;
use crate::services::DraftStore;
use crate::session::{SaveReason, SessionHandle};

/// Latest known reachability, shared between one publisher side and many observers.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(initially_connected: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_connected);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    /// Publish a reachability reading; observers only wake when it changes.
    pub fn set_connected(&self, connected: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });
        if changed {
            tracing::info!(connected, "Connectivity changed");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Save the session locally each time connectivity is observed going down.
///
/// The task ends once every clone of the monitor is dropped; abort the
/// handle on session teardown.
pub fn spawn_autosave(
    monitor: &ConnectivityMonitor,
    session: SessionHandle,
    store: DraftStore,
) -> JoinHandle<()> {
    let mut rx = monitor.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let connected = *rx.borrow_and_update();
            if connected {
                continue;
            }
            if let Err(error) = session.save_draft(&store, SaveReason::Disconnected).await {
                tracing::warn!(
                    date = %session.date(),
                    "Automatic draft save failed: {error}"
                );
            }
        }
    })
}

/// Poll the backend and publish whether it answered.
///
/// For hosts without a platform reachability signal.
pub fn spawn_http_probe(
    monitor: ConnectivityMonitor,
    client: DiaryApiClient,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let reachable = client.ping().await;
            monitor.set_connected(reachable);
        }
    })
}
