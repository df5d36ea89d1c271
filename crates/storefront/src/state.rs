//! Client state shared across services.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::api::CatalogCache;
use crate::config::ClientConfig;
use crate::persistence::{PersistenceAdapter, StorageError};
use crate::store::{Action, AppState, Store};

/// Handle to the store, persistence and caches.
///
/// This struct is cheaply cloneable via `Arc`. The store lock is only held
/// for the synchronous reduce/persist/publish step and is never held across
/// an `.await`.
#[derive(Clone)]
pub struct ClientState {
    inner: Arc<ClientStateInner>,
}

struct ClientStateInner {
    config: ClientConfig,
    store: Mutex<Store>,
    persistence: Arc<PersistenceAdapter>,
    cache: CatalogCache,
}

impl std::fmt::Debug for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientState")
            .field("api_url", &self.inner.config.api_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ClientState {
    /// Create client state over the given persistence, hydrating the store
    /// from it.
    #[must_use]
    pub fn new(config: ClientConfig, persistence: PersistenceAdapter) -> Self {
        let persistence = Arc::new(persistence);
        let store = Store::hydrate(Arc::clone(&persistence));
        let cache = CatalogCache::new(config.catalog_ttl);

        Self {
            inner: Arc::new(ClientStateInner {
                config,
                store: Mutex::new(store),
                persistence,
                cache,
            }),
        }
    }

    /// Create client state backed by files under the configured directories.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a storage directory cannot be created.
    pub fn open(config: ClientConfig) -> Result<Self, StorageError> {
        let persistence = PersistenceAdapter::open(&config)?;
        Ok(Self::new(config, persistence))
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn persistence(&self) -> &PersistenceAdapter {
        &self.inner.persistence
    }

    #[must_use]
    pub fn cache(&self) -> &CatalogCache {
        &self.inner.cache
    }

    /// The current state snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<AppState> {
        self.inner.store.lock().state()
    }

    /// Receive every published state snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.inner.store.lock().subscribe()
    }

    /// Dispatch one action.
    pub fn dispatch(&self, action: impl Into<Action>) -> Arc<AppState> {
        self.inner.store.lock().dispatch(action)
    }

    /// Run `f` with exclusive access to the store.
    ///
    /// Use this for check-then-act sequences that must not interleave with
    /// other dispatches.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        f(&mut self.inner.store.lock())
    }
}
