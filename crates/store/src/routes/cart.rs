//! Cart route handlers.
//!
//! Cart routes serve both anonymous and authenticated shoppers: the identity
//! is the logged-in user when present, otherwise the session's cart key.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use blood_orange_core::{CartId, CartItemId, Role, Slug, Toman};

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, cart_session_key, existing_cart_session_key};
use crate::models::cart::{Cart, CartLine, cart_total, validate_quantity};
use crate::models::product::Product;
use crate::models::session::CurrentUser;
use crate::services::auth::has_role;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data.
#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub id: CartItemId,
    pub product_name: String,
    pub product_slug: Slug,
    pub quantity: i32,
    pub current_product_stock: i32,
    pub unit_price: Toman,
    pub total_price: String,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        let total = line
            .unit_price
            .checked_mul(i64::from(line.quantity))
            .unwrap_or(Toman::ZERO);

        Self {
            id: line.item_id,
            product_name: line.product_name.clone(),
            product_slug: line.product_slug.clone(),
            quantity: line.quantity,
            current_product_stock: line.inventory,
            unit_price: line.unit_price,
            total_price: total.to_string(),
        }
    }
}

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub items: Vec<CartItemView>,
    pub total_price: String,
}

impl CartView {
    fn from_lines(id: CartId, lines: &[CartLine]) -> Self {
        Self {
            id,
            items: lines.iter().map(CartItemView::from).collect(),
            total_price: cart_total(lines).unwrap_or(Toman::ZERO).to_string(),
        }
    }
}

/// Quantity form data.
#[derive(Debug, Deserialize)]
pub struct QuantityBody {
    pub quantity: i32,
}

// =============================================================================
// Helpers
// =============================================================================

/// Whether the requester may touch this cart.
///
/// Owners always may; order managers may touch any cart.
fn may_access_cart(cart: &Cart, user: Option<&CurrentUser>, session_key: Option<&str>) -> bool {
    if cart.belongs_to(user.map(|u| u.id), session_key) {
        return true;
    }
    user.is_some_and(|u| has_role(u, Role::OrderManager))
}

fn item_view(item_id: CartItemId, product: &Product, quantity: i32) -> CartItemView {
    let total = product
        .unit_price
        .checked_mul(i64::from(quantity))
        .unwrap_or(Toman::ZERO);

    CartItemView {
        id: item_id,
        product_name: product.name.clone(),
        product_slug: product.slug.clone(),
        quantity,
        current_product_stock: product.inventory,
        unit_price: product.unit_price,
        total_price: total.to_string(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// The current identity's cart.
pub async fn get_cart(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<Json<CartView>> {
    use crate::models::cart::CartIdentity;

    let identity = match &user {
        Some(user) => CartIdentity::User(user.id),
        None => {
            let key = existing_cart_session_key(&session)
                .await
                .ok_or_else(|| AppError::NotFound("no cart for this session".to_owned()))?;
            CartIdentity::Session(key)
        }
    };

    let cart = db::carts::find(state.pool(), &identity)
        .await?
        .ok_or_else(|| AppError::NotFound("no cart for this session".to_owned()))?;

    let lines = db::carts::lines(state.pool(), cart.id).await?;
    Ok(Json(CartView::from_lines(cart.id, &lines)))
}

/// Add a product to the identity's cart, creating the cart on first use.
///
/// Re-adding a product that already has a line is a conflict, never a merge.
#[instrument(skip(state, session, user))]
pub async fn add_item(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Path(slug): Path<String>,
    Json(body): Json<QuantityBody>,
) -> Result<impl IntoResponse> {
    use crate::models::cart::CartIdentity;

    let product = state
        .catalog()
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no product: {slug}")))?;

    validate_quantity(&product, body.quantity)?;

    let identity = match &user {
        Some(user) => CartIdentity::User(user.id),
        None => {
            let key = cart_session_key(&session)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            CartIdentity::Session(key)
        }
    };

    let cart = db::carts::get_or_create(state.pool(), &identity).await?;
    let item = db::carts::insert_item(state.pool(), cart.id, product.id, body.quantity).await?;

    Ok((
        StatusCode::CREATED,
        Json(item_view(item.id, &product, item.quantity)),
    ))
}

/// Update a cart line's quantity, with the same bounds as adding.
#[instrument(skip(state, session, user))]
pub async fn update_item(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Path(item_id): Path<i32>,
    Json(body): Json<QuantityBody>,
) -> Result<Json<CartItemView>> {
    let item_id = CartItemId::new(item_id);
    let session_key = existing_cart_session_key(&session).await;

    let (item, cart) = db::carts::get_item_with_cart(state.pool(), item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("cart item not found".to_owned()))?;

    if !may_access_cart(&cart, user.as_ref(), session_key.as_deref()) {
        // Someone else's cart: indistinguishable from absent.
        return Err(AppError::NotFound("cart item not found".to_owned()));
    }

    let product = db::products::get_by_id(state.pool(), item.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product no longer exists".to_owned()))?;

    validate_quantity(&product, body.quantity)?;

    let updated = db::carts::set_item_quantity(state.pool(), item_id, body.quantity).await?;

    Ok(Json(item_view(updated.id, &product, updated.quantity)))
}

/// Remove a cart line; removing the last line removes the cart.
#[instrument(skip(state, session, user))]
pub async fn remove_item(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Path(item_id): Path<i32>,
) -> Result<StatusCode> {
    let item_id = CartItemId::new(item_id);
    let session_key = existing_cart_session_key(&session).await;

    let (_, cart) = db::carts::get_item_with_cart(state.pool(), item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("cart item not found".to_owned()))?;

    if !may_access_cart(&cart, user.as_ref(), session_key.as_deref()) {
        return Err(AppError::NotFound("cart item not found".to_owned()));
    }

    db::carts::remove_item(state.pool(), item_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
