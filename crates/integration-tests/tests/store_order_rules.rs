//! Integration tests for order status transitions, totals, and sweep
//! eligibility.

#![allow(clippy::unwrap_used)]

use blood_orange_core::{CustomerId, OrderId, OrderStatus, ProductId, Toman};
use blood_orange_store::models::order::{Order, OrderLine, order_total};
use chrono::{Duration, Utc};

fn order(status: OrderStatus, expires_in_minutes: i64) -> Order {
    let now = Utc::now();
    Order {
        id: OrderId::new(1),
        customer_id: CustomerId::new(1),
        status,
        created_at: now,
        expires_at: now + Duration::minutes(expires_in_minutes),
    }
}

fn line(product: i32, quantity: i32, unit_price: i64) -> OrderLine {
    OrderLine {
        product_id: ProductId::new(product),
        product_name: format!("product-{product}"),
        quantity,
        unit_price: Toman::new(unit_price),
    }
}

// =============================================================================
// Status machine
// =============================================================================

/// The only live transitions are unpaid→paid and unpaid→canceled.
#[test]
fn test_valid_transitions() {
    assert!(OrderStatus::Unpaid.can_transition_to(OrderStatus::Paid));
    assert!(OrderStatus::Unpaid.can_transition_to(OrderStatus::Canceled));
}

/// Paid is terminal: re-applying the paid transition is invalid, which is
/// what makes duplicate payment callbacks harmless.
#[test]
fn test_paid_is_terminal() {
    for target in [OrderStatus::Unpaid, OrderStatus::Paid, OrderStatus::Canceled] {
        assert!(!OrderStatus::Paid.can_transition_to(target));
    }
}

// =============================================================================
// Sweep eligibility
// =============================================================================

/// An unpaid order created at t0 with a 30-minute window is sweepable at
/// t0+31min; the same order paid is not.
#[test]
fn test_sweep_scenario() {
    let now = Utc::now();
    let past_expiry = now + Duration::minutes(31);

    let unpaid = order(OrderStatus::Unpaid, 30);
    assert!(!unpaid.sweep_eligible(now));
    assert!(unpaid.sweep_eligible(past_expiry));

    let paid = order(OrderStatus::Paid, 30);
    assert!(!paid.sweep_eligible(past_expiry));
}

// =============================================================================
// Totals and snapshots
// =============================================================================

/// The order total is the sum over captured prices.
#[test]
fn test_total_over_lines() {
    let lines = [line(1, 4, 1_000), line(2, 1, 250_000)];
    assert_eq!(order_total(&lines), Some(Toman::new(254_000)));
}

/// The total depends only on the captured snapshot: building the same lines
/// again after a notional price change yields the same total.
#[test]
fn test_total_is_snapshot_independent() {
    let snapshot = [line(1, 2, 90_000)];
    let before = order_total(&snapshot);

    // The product's live price moving (90k → 120k) is invisible to the order.
    let still_snapshot = [line(1, 2, 90_000)];
    assert_eq!(before, order_total(&still_snapshot));
}

/// An empty order totals zero (checkout refuses to create one, but the
/// arithmetic should still hold).
#[test]
fn test_empty_total_is_zero() {
    assert_eq!(order_total(&[]), Some(Toman::ZERO));
}
