//! The collaborators every client is wired to.

use std::sync::Arc;

use crate::log::LogStore;
use crate::policy::EnablementRegistry;
use crate::queue::TaskQueue;
use crate::registry::Registry;
use crate::settings::Settings;
use crate::transport::{Transport, UreqTransport};

/// Shared handles to the policy store, log store, transport, task queue and
/// name registry. Cloning is cheap.
#[derive(Clone)]
pub struct ClientContext {
    pub settings: Settings,
    pub policies: Arc<dyn EnablementRegistry>,
    pub logs: Arc<dyn LogStore>,
    pub transport: Arc<dyn Transport>,
    pub queue: Arc<dyn TaskQueue>,
    pub registry: Arc<Registry>,
}

impl ClientContext {
    /// Context with default settings and the ureq transport.
    pub fn new(
        policies: Arc<dyn EnablementRegistry>,
        logs: Arc<dyn LogStore>,
        queue: Arc<dyn TaskQueue>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            settings: Settings::default(),
            policies,
            logs,
            transport: Arc::new(UreqTransport::new()),
            queue,
            registry,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_queue(mut self, queue: Arc<dyn TaskQueue>) -> Self {
        self.queue = queue;
        self
    }
}
