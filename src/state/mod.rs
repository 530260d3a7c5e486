pub mod bus;
pub mod session_machine;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{queue_store::QueueStore, session_store::SessionStore},
    error::ServiceError,
};

pub use self::bus::{BusEvent, RealtimeBus, Topic};

/// Shared handle to the application state, cheap to clone.
pub type SharedState = Arc<AppState>;

/// Broadcast capacity of the realtime bus; lagged subscribers skip and
/// reconcile from storage.
const BUS_CAPACITY: usize = 64;

/// Installed storage backends. The queue and session stores are usually the
/// same object (one database), but the handles stay separate so tests can mix
/// backends.
#[derive(Clone)]
pub struct StoreHandle {
    /// Table of waiting users.
    pub queue: Arc<dyn QueueStore>,
    /// Persisted sessions and message logs.
    pub sessions: Arc<dyn SessionStore>,
}

/// Central application state holding configuration, storage handles, and the
/// realtime bus.
pub struct AppState {
    config: AppConfig,
    stores: RwLock<Option<StoreHandle>>,
    bus: RealtimeBus,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`].
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            stores: RwLock::new(None),
            bus: RealtimeBus::new(BUS_CAPACITY),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration constants.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Realtime bus shared by the matcher, session lifecycle, and SSE layer.
    pub fn bus(&self) -> &RealtimeBus {
        &self.bus
    }

    /// Obtain the current storage handles, if a backend is installed.
    pub async fn stores(&self) -> Option<StoreHandle> {
        let guard = self.stores.read().await;
        guard.clone()
    }

    /// Obtain the storage handles or fail with the degraded-mode error.
    pub async fn require_stores(&self) -> Result<StoreHandle, ServiceError> {
        self.stores().await.ok_or(ServiceError::Degraded)
    }

    /// Install storage backends and leave degraded mode.
    pub async fn install_stores(&self, handle: StoreHandle) {
        {
            let mut guard = self.stores.write().await;
            *guard = Some(handle);
        }
        self.update_degraded(false);
    }

    /// Remove the storage backends and enter degraded mode.
    pub async fn clear_stores(&self) {
        {
            let mut guard = self.stores.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.stores.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() == value {
            return;
        }

        let _ = self.degraded.send(value);
    }
}
