//! The cart→order transaction.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use blood_orange_core::{CartId, CustomerId, UserId};

use crate::db::{self, RepositoryError};
use crate::models::order::{Order, OrderLine};

/// Errors from order placement.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart does not exist or does not belong to the requester.
    #[error("cart not found")]
    CartNotFound,

    /// The cart has no items.
    #[error("cart is empty")]
    CartEmpty,

    /// Database failure; the transaction rolled back.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Convert a cart into an immutable order, atomically.
///
/// Locks the cart row, verifies it belongs to the requester (by user or by
/// session key), then inside the same transaction: inserts the order with
/// `expires_at = now + expiry_window`, copies every cart line into an order
/// item with the product's current price as a snapshot, and deletes the
/// drained cart. Any failure rolls the whole thing back — no dangling order
/// with zero or partial items.
///
/// Of two concurrent calls against the same cart, the loser blocks on the
/// lock and then finds the cart gone ([`CheckoutError::CartNotFound`]).
///
/// Inventory is untouched here; stock is consumed when payment confirms.
///
/// # Errors
///
/// [`CheckoutError::CartNotFound`] / [`CheckoutError::CartEmpty`] before
/// anything is mutated; [`CheckoutError::Repository`] on database failure.
#[instrument(skip(pool, session_key))]
pub async fn place_order(
    pool: &PgPool,
    customer_id: CustomerId,
    user_id: UserId,
    session_key: Option<&str>,
    cart_id: CartId,
    expiry_window: Duration,
) -> Result<(Order, Vec<OrderLine>), CheckoutError> {
    let mut tx = pool.begin().await.map_err(RepositoryError::from)?;

    let Some(cart) = db::carts::lock_by_id(&mut tx, cart_id).await? else {
        return Err(CheckoutError::CartNotFound);
    };

    if !cart.belongs_to(Some(user_id), session_key) {
        // Not the requester's cart: indistinguishable from absent.
        return Err(CheckoutError::CartNotFound);
    }

    let order = db::orders::insert(&mut tx, customer_id, Utc::now() + expiry_window).await?;

    let copied = db::orders::copy_cart_items(&mut tx, order.id, cart_id).await?;
    if copied == 0 {
        // Dropping the transaction rolls the order insert back.
        return Err(CheckoutError::CartEmpty);
    }

    db::carts::delete(&mut *tx, cart_id).await?;

    let lines = db::orders::lines(&mut *tx, order.id).await?;

    tx.commit().await.map_err(RepositoryError::from)?;

    tracing::info!(order = %order.id, items = lines.len(), "order placed");
    Ok((order, lines))
}
