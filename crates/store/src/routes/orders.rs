//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use blood_orange_core::{CartId, Email, OrderId, OrderStatus, Role, Toman};

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, existing_cart_session_key};
use crate::models::order::{Order, OrderLine, order_total};
use crate::models::product::StockAdjustment;
use crate::services::auth::has_role;
use crate::services::checkout;
use crate::services::tasks::Task;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Order line display data.
#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub product: String,
    pub quantity: i32,
    pub unit_price: Toman,
    pub total_price: String,
}

impl From<&OrderLine> for OrderItemView {
    fn from(line: &OrderLine) -> Self {
        let total = line
            .unit_price
            .checked_mul(i64::from(line.quantity))
            .unwrap_or(Toman::ZERO);

        Self {
            product: line.product_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_price: total.to_string(),
        }
    }
}

/// Order display data.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub total_items_price: String,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    fn from_parts(order: &Order, lines: &[OrderLine]) -> Self {
        Self {
            id: order.id,
            status: order.status,
            created_at: order.created_at,
            expires_at: order.expires_at,
            total_items_price: order_total(lines).unwrap_or(Toman::ZERO).to_string(),
            items: lines.iter().map(OrderItemView::from).collect(),
        }
    }
}

/// Order display data for managers, with the owning customer.
#[derive(Debug, Serialize)]
pub struct ManagerOrderView {
    pub customer_email: Email,
    #[serde(flatten)]
    pub order: OrderView,
}

/// Order creation form data.
#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    pub cart_id: CartId,
}

// =============================================================================
// Handlers
// =============================================================================

/// Convert a cart into an order.
///
/// The cart may be the user's own or still owned by their session (a cart
/// reconciliation may not have run yet); either way it is drained atomically.
#[instrument(skip(state, session, user), fields(user = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(body): Json<CreateOrderBody>,
) -> Result<impl IntoResponse> {
    let customer = db::customers::get_by_user(state.pool(), user.id)
        .await?
        .ok_or_else(|| AppError::BadRequest("no customer profile for this account".to_owned()))?;

    let session_key = existing_cart_session_key(&session).await;

    let (order, lines) = checkout::place_order(
        state.pool(),
        customer.id,
        user.id,
        session_key.as_deref(),
        body.cart_id,
        state.config().order_expiry,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderView::from_parts(&order, &lines)),
    ))
}

/// List orders: managers see every order, customers their own.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    if has_role(&user, Role::OrderManager) {
        let orders = db::orders::list_all(state.pool()).await?;

        let mut views = Vec::with_capacity(orders.len());
        for (order, customer_email) in orders {
            let lines = db::orders::lines(state.pool(), order.id).await?;
            views.push(ManagerOrderView {
                customer_email,
                order: OrderView::from_parts(&order, &lines),
            });
        }
        return Ok(Json(views).into_response());
    }

    let customer = db::customers::get_by_user(state.pool(), user.id)
        .await?
        .ok_or_else(|| AppError::BadRequest("no customer profile for this account".to_owned()))?;

    let orders = db::orders::list_for_customer(state.pool(), customer.id).await?;

    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        let lines = db::orders::lines(state.pool(), order.id).await?;
        views.push(OrderView::from_parts(&order, &lines));
    }
    Ok(Json(views).into_response())
}

/// Delete an order (managers only).
///
/// Stock was consumed only if the order was paid, so only then does deletion
/// hand inventory restores to the task worker.
#[instrument(skip(state, user), fields(user = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<i32>,
) -> Result<StatusCode> {
    if !has_role(&user, Role::OrderManager) {
        return Err(AppError::Forbidden("order managers only".to_owned()));
    }

    let order_id = OrderId::new(order_id);
    let Some((order, items)) = db::orders::delete_returning(state.pool(), order_id).await? else {
        return Err(AppError::NotFound("order not found".to_owned()));
    };

    if order.status == OrderStatus::Paid {
        for item in &items {
            state.tasks().submit(Task::AdjustInventory {
                product_id: item.product_id,
                quantity: item.quantity,
                adjustment: StockAdjustment::Increase,
            });
        }
    }

    tracing::info!(order = %order_id, was_paid = (order.status == OrderStatus::Paid), "order deleted");
    Ok(StatusCode::NO_CONTENT)
}
