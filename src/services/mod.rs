//! Orchestration layer between the HTTP surface and the stores, state
//! machine, and realtime bus.

pub mod documentation;
pub mod health_service;
pub mod matcher_service;
pub mod session_service;
pub mod sse_service;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::{
        config::AppConfig,
        dao::{queue_store::memory::MemoryQueueStore, session_store::memory::MemorySessionStore},
        state::{AppState, SharedState, StoreHandle},
    };

    /// Fresh application state backed by in-memory stores.
    pub async fn memory_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .install_stores(StoreHandle {
                queue: Arc::new(MemoryQueueStore::new()),
                sessions: Arc::new(MemorySessionStore::new()),
            })
            .await;
        state
    }
}
