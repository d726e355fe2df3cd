//! Order domain types.

use chrono::{DateTime, Utc};

use blood_orange_core::{CustomerId, OrderId, OrderItemId, OrderStatus, ProductId, Toman};

/// A placed order.
///
/// Immutable after creation except for `status` and deletion. `expires_at`
/// is fixed at creation; the sweeper reclaims unpaid orders past it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Payment status.
    pub status: OrderStatus,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// When an unpaid order becomes sweepable.
    pub expires_at: DateTime<Utc>,
}

impl Order {
    /// Whether the sweeper may delete this order at `now`.
    ///
    /// Paid orders are never eligible, regardless of age.
    #[must_use]
    pub fn sweep_eligible(&self, now: DateTime<Utc>) -> bool {
        self.status != OrderStatus::Paid && self.expires_at < now
    }
}

/// One line of an order, with the price snapshot taken at creation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItem {
    /// Unique line ID.
    pub id: OrderItemId,
    /// Owning order.
    pub order_id: OrderId,
    /// Referenced product.
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: i32,
    /// Unit price captured at order creation.
    pub unit_price: Toman,
}

/// An order line joined with the product name for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Toman,
}

/// Sum of `quantity × captured unit price` over the lines.
#[must_use]
pub fn order_total(lines: &[OrderLine]) -> Option<Toman> {
    Toman::total(lines.iter().map(|l| (l.unit_price, i64::from(l.quantity))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn order(status: OrderStatus, expires_at: DateTime<Utc>) -> Order {
        Order {
            id: OrderId::new(1),
            customer_id: CustomerId::new(1),
            status,
            created_at: expires_at - Duration::minutes(30),
            expires_at,
        }
    }

    #[test]
    fn test_unpaid_past_expiry_is_eligible() {
        let now = Utc::now();
        let o = order(OrderStatus::Unpaid, now - Duration::minutes(1));
        assert!(o.sweep_eligible(now));
    }

    #[test]
    fn test_unpaid_before_expiry_is_not_eligible() {
        let now = Utc::now();
        let o = order(OrderStatus::Unpaid, now + Duration::minutes(5));
        assert!(!o.sweep_eligible(now));
    }

    #[test]
    fn test_paid_is_never_eligible() {
        let now = Utc::now();
        let o = order(OrderStatus::Paid, now - Duration::hours(48));
        assert!(!o.sweep_eligible(now));
    }

    #[test]
    fn test_order_total_uses_captured_prices() {
        let lines = [
            OrderLine {
                product_id: ProductId::new(1),
                product_name: "Dates".to_owned(),
                quantity: 3,
                unit_price: Toman::new(40_000),
            },
            OrderLine {
                product_id: ProductId::new(2),
                product_name: "Pistachios".to_owned(),
                quantity: 1,
                unit_price: Toman::new(250_000),
            },
        ];
        assert_eq!(order_total(&lines), Some(Toman::new(370_000)));
    }
}
