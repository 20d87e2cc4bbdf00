//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::InMemoryBackend;
use flipwise_core::ports::{AuthService, DatabaseService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// Holds only handles to the collaborator; handlers keep no state between requests.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthService>,
    pub db: Arc<dyn DatabaseService>,
}

impl AppState {
    pub fn new(auth: Arc<dyn AuthService>, db: Arc<dyn DatabaseService>) -> Self {
        Self { auth, db }
    }

    /// Serves both ports from one in-memory backend.
    pub fn in_memory(backend: Arc<InMemoryBackend>) -> Self {
        Self {
            auth: backend.clone(),
            db: backend,
        }
    }
}
