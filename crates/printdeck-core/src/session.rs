// ── Session facade ──
//
// One registry, one poller and one dispatcher wired around an injected
// key-value store and notifier. Consumers (the CLI, tests) hold a `Session`
// and reach the components through it.

use std::sync::Arc;
use std::time::Duration;

use printdeck_api::{DeviceConnector, TransportConfig};
use tracing::debug;

use crate::dispatcher::{Dispatcher, Intent};
use crate::error::CoreError;
use crate::notify::Notifier;
use crate::poller::{DEFAULT_POLL_INTERVAL, StatusPoller};
use crate::registry::Registry;
use crate::store::{KeyValueStore, MemoryStore};

/// Runtime tuning for a session. Carries no file paths; the config crate
/// builds one of these and hands it in.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    pub transport: TransportConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            transport: TransportConfig::default(),
        }
    }
}

/// The engine's entry point.
#[derive(Clone)]
pub struct Session {
    registry: Registry,
    poller: StatusPoller,
    dispatcher: Dispatcher,
}

impl Session {
    /// Load the registry from `store` and wire the components. Does not
    /// start polling; call [`start()`](Self::start) for that.
    pub fn open(
        config: &SessionConfig,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CoreError> {
        let registry = Registry::open(store);
        let connector = DeviceConnector::new(&config.transport)?;
        let poller = StatusPoller::new(registry.clone(), connector.clone(), config.poll_interval);
        let dispatcher = Dispatcher::new(registry.clone(), connector, poller.clone(), notifier);
        debug!(profiles = registry.len(), "session opened");
        Ok(Self {
            registry,
            poller,
            dispatcher,
        })
    }

    /// A session whose registry lives only in memory.
    pub fn in_memory(config: &SessionConfig, notifier: Arc<dyn Notifier>) -> Result<Self, CoreError> {
        Self::open(config, Arc::new(MemoryStore::new()), notifier)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Start following the active printer.
    pub fn start(&self) {
        self.poller.start();
    }

    pub async fn execute(&self, intent: Intent) -> Result<(), CoreError> {
        self.dispatcher.execute(intent).await
    }

    /// Stop polling and wait for background tasks.
    pub async fn shutdown(&self) {
        self.poller.stop().await;
    }
}
