//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Database;
use crate::models::PickupStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the storage backend and the pickup stores.
pub struct AppState<D> {
    inner: Arc<AppStateInner<D>>,
}

struct AppStateInner<D> {
    config: StorefrontConfig,
    db: D,
}

// Manual impl: deriving would require `D: Clone` on the state itself.
impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Database> AppState<D> {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `db` - Storage backend
    #[must_use]
    pub fn new(config: StorefrontConfig, db: D) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, db }),
        }
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn db(&self) -> &D {
        &self.inner.db
    }

    /// Stores offered for the pickup delivery method.
    #[must_use]
    pub fn pickup_stores(&self) -> &[PickupStore] {
        &self.inner.config.pickup_stores
    }
}
