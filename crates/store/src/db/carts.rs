//! Database operations for carts and cart items.
//!
//! Single-statement operations are generic over the executor so the
//! reconciliation and checkout transactions can reuse them; the `lock_*`
//! functions must run inside the caller's transaction.

use sqlx::{PgConnection, PgExecutor, PgPool};

use blood_orange_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartIdentity, CartItem, CartLine};

const CART_COLUMNS: &str = "id, user_id, session_key, created_at";
const ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity";

/// Find the live cart for an identity, if any.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find(
    executor: impl PgExecutor<'_>,
    identity: &CartIdentity,
) -> Result<Option<Cart>, RepositoryError> {
    let cart = match identity {
        CartIdentity::User(user_id) => {
            sqlx::query_as::<_, Cart>(&format!(
                "SELECT {CART_COLUMNS} FROM cart WHERE user_id = $1"
            ))
            .bind(user_id)
            .fetch_optional(executor)
            .await?
        }
        CartIdentity::Session(session_key) => {
            sqlx::query_as::<_, Cart>(&format!(
                "SELECT {CART_COLUMNS} FROM cart WHERE session_key = $1"
            ))
            .bind(session_key)
            .fetch_optional(executor)
            .await?
        }
    };

    Ok(cart)
}

/// Get the single live cart for an identity, creating one if absent.
///
/// Two requests racing on the first add-to-cart both reach the insert; the
/// unique constraint picks a winner and the loser adopts the winner's cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn get_or_create(
    pool: &PgPool,
    identity: &CartIdentity,
) -> Result<Cart, RepositoryError> {
    if let Some(cart) = find(pool, identity).await? {
        return Ok(cart);
    }

    let id = CartId::generate();
    let insert = match identity {
        CartIdentity::User(user_id) => {
            sqlx::query_as::<_, Cart>(&format!(
                "INSERT INTO cart (id, user_id) VALUES ($1, $2) RETURNING {CART_COLUMNS}"
            ))
            .bind(id)
            .bind(user_id)
            .fetch_one(pool)
            .await
        }
        CartIdentity::Session(session_key) => {
            sqlx::query_as::<_, Cart>(&format!(
                "INSERT INTO cart (id, session_key) VALUES ($1, $2) RETURNING {CART_COLUMNS}"
            ))
            .bind(id)
            .bind(session_key)
            .fetch_one(pool)
            .await
        }
    };

    match insert {
        Ok(cart) => Ok(cart),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => find(pool, identity)
            .await?
            .ok_or(RepositoryError::NotFound),
        Err(e) => Err(e.into()),
    }
}

/// Load a cart's lines joined with their product columns.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lines(
    executor: impl PgExecutor<'_>,
    cart_id: CartId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, CartLine>(
        "SELECT ci.id AS item_id, ci.product_id, p.name AS product_name,
                p.slug AS product_slug, p.unit_price, p.inventory, ci.quantity
         FROM cart_item ci
         JOIN product p ON p.id = ci.product_id
         WHERE ci.cart_id = $1
         ORDER BY ci.quantity DESC",
    )
    .bind(cart_id)
    .fetch_all(executor)
    .await?;

    Ok(lines)
}

/// Insert a line into a cart.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the product already has a line in
/// this cart; duplicates are never merged here.
pub async fn insert_item(
    executor: impl PgExecutor<'_>,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
) -> Result<CartItem, RepositoryError> {
    let item = sqlx::query_as::<_, CartItem>(&format!(
        "INSERT INTO cart_item (cart_id, product_id, quantity)
         VALUES ($1, $2, $3)
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return RepositoryError::Conflict(
                    "this product has already been added to the cart".to_owned(),
                );
            }
            // The cart can vanish between lookup and insert (checkout drained it).
            if db_err.is_foreign_key_violation() {
                return RepositoryError::NotFound;
            }
        }
        RepositoryError::Database(e)
    })?;

    Ok(item)
}

/// Get a cart item together with its owning cart (for ownership checks).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn get_item_with_cart(
    pool: &PgPool,
    item_id: CartItemId,
) -> Result<Option<(CartItem, Cart)>, RepositoryError> {
    let item = sqlx::query_as::<_, CartItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM cart_item WHERE id = $1"
    ))
    .bind(item_id)
    .fetch_optional(pool)
    .await?;

    let Some(item) = item else {
        return Ok(None);
    };

    let cart = sqlx::query_as::<_, Cart>(&format!("SELECT {CART_COLUMNS} FROM cart WHERE id = $1"))
        .bind(item.cart_id)
        .fetch_one(pool)
        .await?;

    Ok(Some((item, cart)))
}

/// Set a cart line's quantity.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the line does not exist.
pub async fn set_item_quantity(
    executor: impl PgExecutor<'_>,
    item_id: CartItemId,
    quantity: i32,
) -> Result<CartItem, RepositoryError> {
    sqlx::query_as::<_, CartItem>(&format!(
        "UPDATE cart_item SET quantity = $2 WHERE id = $1 RETURNING {ITEM_COLUMNS}"
    ))
    .bind(item_id)
    .bind(quantity)
    .fetch_optional(executor)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Remove a cart line; an emptied cart is deleted in the same transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the line does not exist.
pub async fn remove_item(pool: &PgPool, item_id: CartItemId) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await?;

    let cart_id: Option<CartId> =
        sqlx::query_scalar("DELETE FROM cart_item WHERE id = $1 RETURNING cart_id")
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?;

    let Some(cart_id) = cart_id else {
        return Err(RepositoryError::NotFound);
    };

    let remaining: i64 = sqlx::query_scalar("SELECT count(*) FROM cart_item WHERE cart_id = $1")
        .bind(cart_id)
        .fetch_one(&mut *tx)
        .await?;

    if remaining == 0 {
        delete(&mut *tx, cart_id).await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Delete a cart (its items cascade).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn delete(executor: impl PgExecutor<'_>, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart WHERE id = $1")
        .bind(cart_id)
        .execute(executor)
        .await?;

    Ok(())
}

// =============================================================================
// Transaction-scoped operations (reconciliation, checkout)
// =============================================================================

/// Lock a user's cart for the duration of the caller's transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_by_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<Cart>, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
        "SELECT {CART_COLUMNS} FROM cart WHERE user_id = $1 FOR UPDATE"
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(cart)
}

/// Lock a session's cart for the duration of the caller's transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_by_session(
    conn: &mut PgConnection,
    session_key: &str,
) -> Result<Option<Cart>, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
        "SELECT {CART_COLUMNS} FROM cart WHERE session_key = $1 FOR UPDATE"
    ))
    .bind(session_key)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(cart)
}

/// Lock a cart by ID for the duration of the caller's transaction.
///
/// Checkout takes this lock first, so of two requests draining the same cart
/// one blocks here and then observes the cart gone.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_by_id(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Option<Cart>, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
        "SELECT {CART_COLUMNS} FROM cart WHERE id = $1 FOR UPDATE"
    ))
    .bind(cart_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(cart)
}

/// Load a cart's raw items (no product join) inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn items(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<CartItem>, RepositoryError> {
    let items = sqlx::query_as::<_, CartItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM cart_item WHERE cart_id = $1 ORDER BY id"
    ))
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Rewrite an anonymous cart's ownership to an authenticated user.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn assign_to_user(
    conn: &mut PgConnection,
    cart_id: CartId,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE cart SET user_id = $2, session_key = NULL WHERE id = $1")
        .bind(cart_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
