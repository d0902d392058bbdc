use std::sync::Arc;

use tether_engine::ChatEngine;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The engine is cheap to clone and owns every live generation, so one instance
/// is created at startup and shared by all requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: ChatEngine,
}

impl AppState {
    pub fn new(config: Config, engine: ChatEngine) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }
}
