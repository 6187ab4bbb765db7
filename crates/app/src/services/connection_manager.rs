//! Connection lifecycle: registration, removal and the periodic liveness sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use iopanel_domain::id::ObserverId;

use crate::observer_hub::{ObserverHub, ObserverSession};

/// Owns the lifecycle of every [`Observer`](ObserverSession).
///
/// Connecting does not trigger a resync; a fresh client asks for one with
/// `{"all":"update"}`.
#[derive(Clone)]
pub struct ConnectionManager {
    hub: Arc<ObserverHub>,
}

impl ConnectionManager {
    pub fn new(hub: Arc<ObserverHub>) -> Self {
        Self { hub }
    }

    #[must_use]
    pub fn hub(&self) -> &Arc<ObserverHub> {
        &self.hub
    }

    /// Register a new observer.
    #[must_use]
    pub fn connect(&self) -> ObserverSession {
        let session = self.hub.register();
        tracing::debug!(observer = %session.id, observers = self.hub.len(), "observer connected");
        session
    }

    /// Deregister an observer and release its queue.
    pub fn disconnect(&self, id: ObserverId) {
        if self.hub.deregister(id) {
            tracing::debug!(observer = %id, observers = self.hub.len(), "observer disconnected");
        }
    }

    /// Run one liveness sweep. Returns the number of observers pruned.
    pub fn sweep(&self) -> usize {
        let pruned = self.hub.sweep();
        for id in &pruned {
            tracing::debug!(observer = %id, "stale observer pruned");
        }
        pruned.len()
    }

    /// Spawn the periodic liveness sweep on the current tokio runtime.
    #[must_use]
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            tracing::info!(?interval, "liveness sweep started");
            loop {
                tokio::time::sleep(interval).await;
                manager.sweep();
            }
        })
    }
}
