//! Product domain types and the stock-state rule.

use chrono::{DateTime, Utc};
use thiserror::Error;

use blood_orange_core::{ProductId, Slug, Toman};

/// A catalog product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// URL slug, unique, derived from the name.
    pub slug: Slug,
    /// Long-form description.
    pub description: String,
    /// Current unit price.
    pub unit_price: Toman,
    /// Units in stock. Never negative.
    pub inventory: i32,
    /// Whether the product is purchasable. Tracks `inventory > 0`.
    pub activation: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product (seeding / management).
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub unit_price: Toman,
    pub inventory: i32,
}

/// Direction of an inventory ledger adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    /// Stock returned (order deleted, payment reversed).
    Increase,
    /// Stock consumed (payment confirmed).
    Decrease,
}

/// The `(inventory, activation)` pair a ledger adjustment writes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockState {
    pub inventory: i32,
    pub activation: bool,
}

/// Errors from the stock-state rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StockError {
    /// A decrease would drive inventory negative. Never clamped.
    #[error("insufficient stock: have {available}, need {requested}")]
    Insufficient { available: i32, requested: i32 },
    /// An increase overflowed the counter.
    #[error("stock adjustment overflow")]
    Overflow,
}

/// Compute the stock state after adjusting `inventory` by `quantity`.
///
/// The invariant `activation == (inventory > 0)` is re-established on every
/// call, so a product deactivates exactly when its last unit is consumed and
/// reactivates as soon as stock returns. Callers hold the product row lock
/// while applying the result.
///
/// # Errors
///
/// [`StockError::Insufficient`] when a decrease exceeds the available stock;
/// [`StockError::Overflow`] when an increase overflows.
pub const fn next_stock_state(
    inventory: i32,
    quantity: i32,
    adjustment: StockAdjustment,
) -> Result<StockState, StockError> {
    let next = match adjustment {
        StockAdjustment::Decrease => {
            if quantity > inventory {
                return Err(StockError::Insufficient {
                    available: inventory,
                    requested: quantity,
                });
            }
            inventory - quantity
        }
        StockAdjustment::Increase => match inventory.checked_add(quantity) {
            Some(next) => next,
            None => return Err(StockError::Overflow),
        },
    };

    Ok(StockState {
        inventory: next,
        activation: next > 0,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decrease_reduces_stock() {
        let state = next_stock_state(10, 4, StockAdjustment::Decrease).unwrap();
        assert_eq!(state.inventory, 6);
        assert!(state.activation);
    }

    #[test]
    fn test_decrease_to_zero_deactivates() {
        let state = next_stock_state(4, 4, StockAdjustment::Decrease).unwrap();
        assert_eq!(state.inventory, 0);
        assert!(!state.activation);
    }

    #[test]
    fn test_decrease_below_zero_is_rejected() {
        assert_eq!(
            next_stock_state(3, 4, StockAdjustment::Decrease),
            Err(StockError::Insufficient {
                available: 3,
                requested: 4
            })
        );
    }

    #[test]
    fn test_increase_from_zero_reactivates() {
        let state = next_stock_state(0, 2, StockAdjustment::Increase).unwrap();
        assert_eq!(state.inventory, 2);
        assert!(state.activation);
    }

    #[test]
    fn test_increase_overflow() {
        assert_eq!(
            next_stock_state(i32::MAX, 1, StockAdjustment::Increase),
            Err(StockError::Overflow)
        );
    }
}
