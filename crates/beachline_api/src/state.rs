use std::sync::{Arc, Mutex, MutexGuard};

use beachline_core::CoreError;
use beachline_engine::Engine;

/// Application state shared by every handler and push connection
#[derive(Clone)]
pub struct AppState {
    /// The engine owns the store and the subscription registry
    engine: Arc<Mutex<Engine>>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    /// Lock the engine. Never hold the guard across an `.await`.
    pub fn engine(&self) -> Result<MutexGuard<'_, Engine>, CoreError> {
        self.engine.lock().map_err(|_| CoreError::StoreUnavailable {
            message: "engine state is poisoned".to_string(),
        })
    }
}
