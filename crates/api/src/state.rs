use std::sync::Arc;

use blobgate_core::engine::PullEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; nothing in it is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Engine that performs pulls.
    pub engine: Arc<dyn PullEngine>,
}

impl AppState {
    pub fn new(config: ServerConfig, engine: impl PullEngine) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
        }
    }
}
