//! Application state shared by all handlers

use std::sync::Arc;

use crate::config::Config;

/// Configuration plus the store handlers read and write through
///
/// Cheap to clone; both halves are reference counted.
pub struct AppState<S> {
    config: Arc<Config>,
    store: Arc<S>,
}

impl<S> AppState<S> {
    /// Create new application state
    pub fn new(config: Config, store: S) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the store
    pub fn store(&self) -> &S {
        &self.store
    }
}

// Derived Clone would require `S: Clone`
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            store: Arc::clone(&self.store),
        }
    }
}
