use std::sync::Arc;

use pedi_protocols::Registry;

/// Shared application state, injected into all route handlers via Axum state.
///
/// The registry is built and checked before the router exists and is never
/// mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}
