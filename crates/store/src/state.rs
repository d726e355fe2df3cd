//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StoreConfig;
use crate::services::catalog::ProductCatalog;
use crate::services::payment::GatewayClient;
use crate::services::tasks::TaskQueue;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the database pool, the
/// product catalog, the payment gateway client, and the task queue.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StoreConfig,
    pool: PgPool,
    catalog: ProductCatalog,
    gateway: GatewayClient,
    tasks: TaskQueue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the gateway HTTP client cannot be built.
    pub fn new(
        config: StoreConfig,
        pool: PgPool,
        catalog: ProductCatalog,
        tasks: TaskQueue,
    ) -> Result<Self, reqwest::Error> {
        let gateway = GatewayClient::new(&config.gateway)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                gateway,
                tasks,
            }),
        })
    }

    /// Get a reference to the store configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &ProductCatalog {
        &self.inner.catalog
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn gateway(&self) -> &GatewayClient {
        &self.inner.gateway
    }

    /// Get a reference to the background task queue.
    #[must_use]
    pub fn tasks(&self) -> &TaskQueue {
        &self.inner.tasks
    }
}
