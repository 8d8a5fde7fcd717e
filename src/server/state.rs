//! Shared application state for the HTTP server.

use crate::config::ServerConfig;
use crate::store::StateStore;
use crate::sync::{BroadcastEngine, ConnectionRegistry, MessageCodec};
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Owner of the slot store and the connection registry.
    pub engine: Arc<BroadcastEngine>,

    /// Configuration the server was started with.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Creates fresh state: an empty store and no connections.
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(StateStore::new(config.slot_count));
        let registry = Arc::new(ConnectionRegistry::new());
        let codec = MessageCodec::new(config.slot_count, &config.labels);

        Self {
            engine: Arc::new(BroadcastEngine::new(store, registry, codec)),
            config: Arc::new(config),
        }
    }
}
