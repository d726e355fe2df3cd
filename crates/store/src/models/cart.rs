//! Cart domain types and quantity validation.

use chrono::{DateTime, Utc};
use thiserror::Error;

use blood_orange_core::{CartId, CartItemId, ProductId, Slug, Toman, UserId};

use super::product::Product;

/// A live shopping cart.
///
/// Exactly one of `user_id` / `session_key` is set; the database CHECK
/// enforces it. The cart disappears when its last item is removed, when the
/// reconciliation merge drains it, or when checkout converts it to an order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Cart {
    /// Opaque cart token.
    pub id: CartId,
    /// Owning user, for authenticated carts.
    pub user_id: Option<UserId>,
    /// Owning session key, for anonymous carts.
    pub session_key: Option<String>,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
}

/// The identity a cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartIdentity {
    /// An authenticated user.
    User(UserId),
    /// An anonymous browsing session.
    Session(String),
}

impl Cart {
    /// Whether this cart belongs to the given identity.
    #[must_use]
    pub fn belongs_to(&self, user_id: Option<UserId>, session_key: Option<&str>) -> bool {
        match (self.user_id, self.session_key.as_deref()) {
            (Some(owner), _) => user_id == Some(owner),
            (None, Some(key)) => session_key == Some(key),
            (None, None) => false,
        }
    }
}

/// One line in a cart.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItem {
    /// Unique line ID.
    pub id: CartItemId,
    /// Owning cart.
    pub cart_id: CartId,
    /// Referenced product.
    pub product_id: ProductId,
    /// Units requested, at least 1.
    pub quantity: i32,
}

/// A cart line joined with the product columns the store displays.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartLine {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: Slug,
    pub unit_price: Toman,
    pub inventory: i32,
    pub quantity: i32,
}

/// Sum of `quantity × current unit price` over the lines.
///
/// A pure read over already-loaded lines; `None` on (absurd) overflow.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Option<Toman> {
    Toman::total(lines.iter().map(|l| (l.unit_price, i64::from(l.quantity))))
}

/// Errors from cart quantity validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    /// Quantity below 1.
    #[error("quantity must be at least 1")]
    TooSmall,
    /// Quantity above the product's current inventory.
    #[error("quantity must be less than {product} inventory | < {inventory}")]
    ExceedsInventory { product: String, inventory: i32 },
    /// Product is deactivated (out of stock).
    #[error("{product} is not available")]
    ProductInactive { product: String },
}

/// Validate a requested quantity against the product's current state.
///
/// Runs before any cart write; the database CHECKs are the backstop, not the
/// validation.
pub fn validate_quantity(product: &Product, quantity: i32) -> Result<(), QuantityError> {
    if !product.activation {
        return Err(QuantityError::ProductInactive {
            product: product.name.clone(),
        });
    }

    if quantity < 1 {
        return Err(QuantityError::TooSmall);
    }

    if quantity > product.inventory {
        return Err(QuantityError::ExceedsInventory {
            product: product.name.clone(),
            inventory: product.inventory,
        });
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use blood_orange_core::Slug;
    use chrono::Utc;

    fn product(inventory: i32) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Saffron".to_owned(),
            slug: Slug::from_name("Saffron"),
            description: String::new(),
            unit_price: Toman::new(90_000),
            inventory,
            activation: inventory > 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(quantity: i32, unit_price: i64) -> CartLine {
        CartLine {
            item_id: CartItemId::new(1),
            product_id: ProductId::new(1),
            product_name: "Saffron".to_owned(),
            product_slug: Slug::from_name("Saffron"),
            unit_price: Toman::new(unit_price),
            inventory: 10,
            quantity,
        }
    }

    #[test]
    fn test_quantity_within_inventory() {
        assert!(validate_quantity(&product(10), 4).is_ok());
        assert!(validate_quantity(&product(10), 10).is_ok());
    }

    #[test]
    fn test_quantity_exceeding_inventory() {
        assert_eq!(
            validate_quantity(&product(10), 12),
            Err(QuantityError::ExceedsInventory {
                product: "Saffron".to_owned(),
                inventory: 10
            })
        );
    }

    #[test]
    fn test_quantity_below_one() {
        assert_eq!(validate_quantity(&product(10), 0), Err(QuantityError::TooSmall));
    }

    #[test]
    fn test_inactive_product_rejected() {
        assert!(matches!(
            validate_quantity(&product(0), 1),
            Err(QuantityError::ProductInactive { .. })
        ));
    }

    #[test]
    fn test_cart_total() {
        let lines = [line(4, 1_000), line(2, 250)];
        assert_eq!(cart_total(&lines), Some(Toman::new(4_500)));
    }

    #[test]
    fn test_belongs_to_user_cart() {
        let cart = Cart {
            id: CartId::generate(),
            user_id: Some(UserId::new(3)),
            session_key: None,
            created_at: Utc::now(),
        };
        assert!(cart.belongs_to(Some(UserId::new(3)), None));
        assert!(!cart.belongs_to(Some(UserId::new(4)), None));
        assert!(!cart.belongs_to(None, Some("abc")));
    }

    #[test]
    fn test_belongs_to_session_cart() {
        let cart = Cart {
            id: CartId::generate(),
            user_id: None,
            session_key: Some("abc".to_owned()),
            created_at: Utc::now(),
        };
        assert!(cart.belongs_to(None, Some("abc")));
        assert!(!cart.belongs_to(None, Some("other")));
    }
}
