//! Shared application state for axum handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use iopanel_app::observer_hub::ObserverHub;
use iopanel_app::ports::OutputDriver;
use iopanel_app::registry::OutputRegistry;
use iopanel_app::services::{CommandInterpreter, ConnectionManager};

/// Application state shared across all axum handlers.
///
/// Generic over the output driver to avoid dynamic dispatch. `Clone` is
/// implemented manually so the driver itself does not need to be `Clone`.
pub struct AppState<D> {
    /// Decodes and applies inbound frames.
    pub interpreter: Arc<CommandInterpreter<D, Arc<ObserverHub>>>,
    /// Registers and releases observers.
    pub connections: ConnectionManager,
    /// Directory holding `index.html` and the other page assets.
    pub assets: Arc<PathBuf>,
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            interpreter: Arc::clone(&self.interpreter),
            connections: self.connections.clone(),
            assets: Arc::clone(&self.assets),
        }
    }
}

impl<D: OutputDriver> AppState<D> {
    /// Wire a registry and a hub into a ready-to-serve state.
    ///
    /// The interpreter publishes into the same hub the connection manager
    /// registers observers on.
    pub fn new(
        registry: Arc<OutputRegistry<D>>,
        hub: Arc<ObserverHub>,
        assets: impl Into<PathBuf>,
    ) -> Self {
        Self {
            interpreter: Arc::new(CommandInterpreter::new(registry, Arc::clone(&hub))),
            connections: ConnectionManager::new(hub),
            assets: Arc::new(assets.into()),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<OutputRegistry<D>> {
        self.interpreter.registry()
    }

    #[must_use]
    pub fn assets(&self) -> &Path {
        &self.assets
    }
}
