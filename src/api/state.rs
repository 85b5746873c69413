use std::sync::Arc;

use crate::{
    db::{CatalogStore, MemoryStore},
    services::Services,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

impl AppState {
    /// Wires every engine over `store`
    pub fn new<S: CatalogStore + 'static>(store: Arc<S>) -> Self {
        Self {
            services: Services::new(store),
        }
    }

    /// State over a fresh, seeded in-memory backend
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}
