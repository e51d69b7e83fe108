//! Server state management.

use std::sync::Arc;

use revise_core::{Engine, EngineConfig, ReviseResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

impl AppState {
    /// Create application state around an existing engine.
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Create application state with a SQLite-backed engine at
    /// `config.db_path`.
    pub fn with_sqlite(config: EngineConfig) -> ReviseResult<Self> {
        Ok(Self::new(Engine::with_sqlite(config)?))
    }
}
