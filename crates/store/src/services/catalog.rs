//! Product catalog with read caching, and the inventory ledger.
//!
//! Product detail reads go through a `moka` cache keyed by slug; every
//! mutation of a product invalidates its entry. The ledger half owns the only
//! code path that writes the inventory counter: a row-locked
//! read-modify-write inside one transaction.

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use blood_orange_core::ProductId;

use crate::db::{self, RepositoryError};
use crate::models::product::{NewProduct, Product, StockAdjustment, StockError, next_stock_state};

/// Cached product entries.
const CACHE_CAPACITY: u64 = 1000;
/// Cache TTL; invalidation on write is the primary freshness mechanism.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors from inventory ledger adjustments.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The product does not exist.
    #[error("product not found")]
    NotFound,

    /// The adjustment violates the stock invariant (underflow/overflow).
    #[error(transparent)]
    Stock(#[from] StockError),

    /// Database failure.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Product reads and inventory writes, shareable across handlers and the
/// task worker.
///
/// Cheaply cloneable: the pool and the cache both share state internally.
#[derive(Clone)]
pub struct ProductCatalog {
    pool: PgPool,
    cache: Cache<String, Product>,
}

impl ProductCatalog {
    /// Create a new catalog over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self { pool, cache }
    }

    /// Get a product by slug, consulting the cache first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        if let Some(product) = self.cache.get(slug).await {
            return Ok(Some(product));
        }

        let product = db::products::get_by_slug(&self.pool, slug).await?;
        if let Some(ref product) = product {
            self.cache
                .insert(product.slug.as_str().to_owned(), product.clone())
                .await;
        }

        Ok(product)
    }

    /// List purchasable products (uncached; listings change too often).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        db::products::list_active(&self.pool).await
    }

    /// Create a product (seeding / management).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the derived slug is taken.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        db::products::insert(&self.pool, new).await
    }

    /// Atomically adjust a product's inventory and activation flag.
    ///
    /// Takes the row lock, applies [`next_stock_state`], writes back, and
    /// invalidates the cache entry. Concurrent adjustments serialize on the
    /// lock; an underflowing decrease is rejected before anything is written.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] for a missing product,
    /// [`InventoryError::Stock`] when the adjustment is invalid.
    #[instrument(skip(self), fields(product = %product_id))]
    pub async fn adjust_inventory(
        &self,
        product_id: ProductId,
        quantity: i32,
        adjustment: StockAdjustment,
    ) -> Result<Product, InventoryError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let Some(mut product) = db::products::lock(&mut tx, product_id).await? else {
            return Err(InventoryError::NotFound);
        };

        let state = next_stock_state(product.inventory, quantity, adjustment)?;
        db::products::update_stock(&mut tx, product_id, state).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        self.cache.invalidate(product.slug.as_str()).await;

        product.inventory = state.inventory;
        product.activation = state.activation;
        Ok(product)
    }
}
