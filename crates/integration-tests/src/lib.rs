//! Integration tests for Blood Orange.
//!
//! # Test Categories
//!
//! - `store_reconciliation` - Cart merge/transfer planning
//! - `store_order_rules` - Order status machine, totals, sweep eligibility
//! - `store_inventory_rules` - Inventory ledger arithmetic and activation
//! - `store_payment_protocol` - Gateway response interpretation
//!
//! These exercise the engine's decision logic directly; flows that need a
//! live `PostgreSQL` (the transactional SQL around them) run against a real
//! deployment, not in CI.

use blood_orange_core::{CartId, CartItemId, ProductId};
use blood_orange_store::models::cart::CartItem;

/// Build a cart item fixture.
#[must_use]
pub fn cart_item(id: i32, cart: CartId, product: i32, quantity: i32) -> CartItem {
    CartItem {
        id: CartItemId::new(id),
        cart_id: cart,
        product_id: ProductId::new(product),
        quantity,
    }
}
