//! Database operations for the store `PostgreSQL`.
//!
//! ## Tables
//!
//! - `product` - Catalog with the inventory counter the ledger guards
//! - `app_user` / `customer` / `customer_address` - Accounts
//! - `cart` / `cart_item` - Live carts (user XOR session ownership)
//! - `store_order` / `order_item` - Placed orders with price snapshots
//! - `sessions` - Tower-sessions storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/store/migrations/` and run via:
//! ```bash
//! cargo run -p blood-orange-cli -- migrate store
//! ```
//!
//! Queries are runtime-checked (`sqlx::query_as` over `FromRow` domain
//! types); multi-statement flows open explicit transactions, and the two
//! contended rows (a cart being drained, a product's inventory) are always
//! taken `FOR UPDATE` first.

pub mod carts;
pub mod customers;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate cart product).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
