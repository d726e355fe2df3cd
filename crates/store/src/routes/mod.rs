//! HTTP route handlers for the store.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database ping)
//!
//! # Auth
//! POST /auth/register           - Create an account (logs in, reconciles carts)
//! POST /auth/login              - Login (reconciles carts)
//! POST /auth/logout             - Logout
//!
//! # Products
//! GET  /products                - Active product listing
//! GET  /products/{slug}         - Product detail (cached)
//!
//! # Cart
//! GET    /cart                  - Current identity's cart
//! POST   /cart/add/{slug}       - Add a product to the cart
//! PUT    /cart/items/{item_id}  - Update a line's quantity
//! DELETE /cart/items/{item_id}  - Remove a line (empty cart is deleted)
//!
//! # Orders
//! GET    /orders                - Own orders (managers: all orders)
//! POST   /orders                - Convert a cart into an order
//! DELETE /orders/{order_id}     - Delete an order (managers only)
//!
//! # Payment
//! POST /payment                 - Initiate payment for an order
//! GET  /payment/callback        - Gateway return URL
//!
//! # Account (requires auth)
//! GET  /account                 - Customer profile
//! GET  /account/address         - Customer address
//! POST /account/address         - Create the address (at most one)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod payment;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the application router (everything except health checks).
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        // Products
        .route("/products", get(products::list))
        .route("/products/{slug}", get(products::detail))
        // Cart
        .route("/cart", get(cart::get_cart))
        .route("/cart/add/{slug}", post(cart::add_item))
        .route(
            "/cart/items/{item_id}",
            axum::routing::put(cart::update_item).delete(cart::remove_item),
        )
        // Orders
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/{order_id}", axum::routing::delete(orders::delete))
        // Payment
        .route("/payment", post(payment::initiate))
        .route("/payment/callback", get(payment::callback))
        // Account
        .route("/account", get(account::profile))
        .route(
            "/account/address",
            get(account::get_address).post(account::create_address),
        )
}
