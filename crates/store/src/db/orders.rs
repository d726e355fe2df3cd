//! Database operations for orders and order items.
//!
//! Orders are written only inside the checkout transaction; afterwards the
//! only mutations are the unpaid→paid transition, deletion, and the sweep.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};

use blood_orange_core::{CartId, CustomerId, Email, OrderId, Toman, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem, OrderLine};

const ORDER_COLUMNS: &str = "id, customer_id, status, created_at, expires_at";

/// Insert an unpaid order inside the checkout transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(
    conn: &mut PgConnection,
    customer_id: CustomerId,
    expires_at: DateTime<Utc>,
) -> Result<Order, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "INSERT INTO store_order (customer_id, expires_at)
         VALUES ($1, $2)
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(customer_id)
    .bind(expires_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(order)
}

/// Copy a cart's lines into order items, snapshotting the current unit price.
///
/// Returns the number of lines copied; zero means the cart was empty and the
/// caller must roll back.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn copy_cart_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    cart_id: CartId,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        "INSERT INTO order_item (order_id, product_id, quantity, unit_price)
         SELECT $1, ci.product_id, ci.quantity, p.unit_price
         FROM cart_item ci
         JOIN product p ON p.id = ci.product_id
         WHERE ci.cart_id = $2",
    )
    .bind(order_id)
    .bind(cart_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Get an order by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(
    executor: impl PgExecutor<'_>,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM store_order WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(order)
}

/// Get an order together with the user who owns it (via the customer).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_with_owner(
    executor: impl PgExecutor<'_>,
    id: OrderId,
) -> Result<Option<(Order, UserId)>, RepositoryError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        order: Order,
        owner_id: UserId,
    }

    let row = sqlx::query_as::<_, Row>(
        "SELECT o.id, o.customer_id, o.status, o.created_at, o.expires_at,
                c.user_id AS owner_id
         FROM store_order o
         JOIN customer c ON c.id = o.customer_id
         WHERE o.id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| (r.order, r.owner_id)))
}

/// Load an order's lines with product names, for display.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lines(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
) -> Result<Vec<OrderLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, OrderLine>(
        "SELECT oi.product_id, p.name AS product_name, oi.quantity, oi.unit_price
         FROM order_item oi
         JOIN product p ON p.id = oi.product_id
         WHERE oi.order_id = $1
         ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(lines)
}

/// Load an order's raw items.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn items(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, quantity, unit_price
         FROM order_item
         WHERE order_id = $1
         ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(items)
}

/// List a customer's orders, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_customer(
    executor: impl PgExecutor<'_>,
    customer_id: CustomerId,
) -> Result<Vec<Order>, RepositoryError> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM store_order WHERE customer_id = $1 ORDER BY created_at DESC"
    ))
    .bind(customer_id)
    .fetch_all(executor)
    .await?;

    Ok(orders)
}

/// List every order with the owning user's email (manager view).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_all(
    executor: impl PgExecutor<'_>,
) -> Result<Vec<(Order, Email)>, RepositoryError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        order: Order,
        email: Email,
    }

    let rows = sqlx::query_as::<_, Row>(
        "SELECT o.id, o.customer_id, o.status, o.created_at, o.expires_at, u.email
         FROM store_order o
         JOIN customer c ON c.id = o.customer_id
         JOIN app_user u ON u.id = c.user_id
         ORDER BY o.created_at DESC",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|r| (r.order, r.email)).collect())
}

/// Total of `quantity × captured unit price` over an order, computed in SQL.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn total(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
) -> Result<Toman, RepositoryError> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity::BIGINT * unit_price), 0)::BIGINT
         FROM order_item
         WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_one(executor)
    .await?;

    Ok(Toman::new(total))
}

/// Names of products whose current stock no longer covers the order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insufficient_products(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
) -> Result<Vec<String>, RepositoryError> {
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT p.name
         FROM order_item oi
         JOIN product p ON p.id = oi.product_id
         WHERE oi.order_id = $1 AND oi.quantity > p.inventory
         ORDER BY p.name",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(names)
}

/// Transition an order unpaid→paid.
///
/// Returns `true` only when this call performed the transition; the guard in
/// the WHERE clause makes re-delivered confirmations a no-op.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn mark_paid(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("UPDATE store_order SET status = 'paid' WHERE id = $1 AND status = 'unpaid'")
        .bind(order_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Delete an order, returning it and its items so the caller can decide on
/// inventory compensation.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn delete_returning(
    pool: &PgPool,
    order_id: OrderId,
) -> Result<Option<(Order, Vec<OrderItem>)>, RepositoryError> {
    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM store_order WHERE id = $1 FOR UPDATE"
    ))
    .bind(order_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(order) = order else {
        return Ok(None);
    };

    let order_items = items(&mut *tx, order_id).await?;

    sqlx::query("DELETE FROM store_order WHERE id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some((order, order_items)))
}

/// Delete every unpaid order past its expiration. Paid orders are untouched.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn delete_expired_unpaid(
    executor: impl PgExecutor<'_>,
    now: DateTime<Utc>,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM store_order WHERE status <> 'paid' AND expires_at < $1")
        .bind(now)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
