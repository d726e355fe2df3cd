//! Integration tests for the inventory ledger rules.

#![allow(clippy::unwrap_used)]

use blood_orange_store::models::cart::validate_quantity;
use blood_orange_store::models::product::{
    Product, StockAdjustment, StockError, next_stock_state,
};

use blood_orange_core::{ProductId, Slug, Toman};
use chrono::Utc;

fn product(inventory: i32) -> Product {
    Product {
        id: ProductId::new(7),
        name: "Rose Water 500ml".to_owned(),
        slug: Slug::from_name("Rose Water 500ml"),
        description: String::new(),
        unit_price: Toman::new(58_000),
        inventory,
        activation: inventory > 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Decreases map `inventory → inventory − q` with the activation flag
/// flipping exactly at zero.
#[test]
fn test_decrease_tracks_activation() {
    let state = next_stock_state(10, 4, StockAdjustment::Decrease).unwrap();
    assert_eq!((state.inventory, state.activation), (6, true));

    let state = next_stock_state(6, 6, StockAdjustment::Decrease).unwrap();
    assert_eq!((state.inventory, state.activation), (0, false));
}

/// Increases restore stock and reactivate a deactivated product.
#[test]
fn test_increase_reactivates() {
    let state = next_stock_state(0, 3, StockAdjustment::Increase).unwrap();
    assert_eq!((state.inventory, state.activation), (3, true));
}

/// Underflow is rejected with the exact shortfall, never clamped to zero.
#[test]
fn test_underflow_is_an_error_not_a_clamp() {
    assert_eq!(
        next_stock_state(2, 5, StockAdjustment::Decrease),
        Err(StockError::Insufficient {
            available: 2,
            requested: 5
        })
    );
}

/// A full consume/restore cycle is the identity on stock state.
#[test]
fn test_consume_then_restore_roundtrip() {
    let consumed = next_stock_state(10, 10, StockAdjustment::Decrease).unwrap();
    assert!(!consumed.activation);

    let restored =
        next_stock_state(consumed.inventory, 10, StockAdjustment::Increase).unwrap();
    assert_eq!((restored.inventory, restored.activation), (10, true));
}

/// With inventory 10: add 4 ok, update to 12 rejected,
/// update to 8 ok.
#[test]
fn test_cart_quantity_bounds_scenario() {
    let p = product(10);

    assert!(validate_quantity(&p, 4).is_ok());
    assert!(validate_quantity(&p, 12).is_err());
    assert!(validate_quantity(&p, 8).is_ok());
}

/// Deactivated products reject any quantity.
#[test]
fn test_inactive_product_rejects_all_quantities() {
    let p = product(0);
    assert!(validate_quantity(&p, 1).is_err());
}
