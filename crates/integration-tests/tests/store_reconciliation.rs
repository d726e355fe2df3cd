//! Integration tests for cart reconciliation planning.
//!
//! The merge plan is the pure heart of the reconciliation engine: these
//! verify the quantity-addition semantics and the idempotence argument
//! (after a merge the source cart is gone, so a re-run has nothing to plan).

#![allow(clippy::unwrap_used)]

use blood_orange_core::{CartId, CartItemId, ProductId};
use blood_orange_integration_tests::cart_item;
use blood_orange_store::services::reconciliation::merge_plan;

/// Merging anon {A:2, B:3} into auth {A:1, C:4} yields
/// {A:3, B:3, C:4}.
#[test]
fn test_merge_overlapping_carts() {
    let auth_cart = CartId::generate();
    let anon_cart = CartId::generate();

    let product_a = 1;
    let product_b = 2;
    let product_c = 3;

    let auth = [
        cart_item(10, auth_cart, product_a, 1),
        cart_item(11, auth_cart, product_c, 4),
    ];
    let anon = [
        cart_item(20, anon_cart, product_a, 2),
        cart_item(21, anon_cart, product_b, 3),
    ];

    let plan = merge_plan(&auth, &anon);

    // A: quantities added on the existing auth line.
    assert_eq!(plan.updates, vec![(CartItemId::new(10), 3)]);
    // B: new line in the auth cart. C is untouched (no update, no insert).
    assert_eq!(plan.inserts, vec![(ProductId::new(product_b), 3)]);
}

/// Re-running reconciliation after a merge is a no-op: the anonymous cart no
/// longer exists, so the plan over its (absent) items is empty.
#[test]
fn test_rerun_after_merge_plans_nothing() {
    let auth_cart = CartId::generate();

    // Post-merge auth cart state: {A:3, B:3, C:4}.
    let auth = [
        cart_item(10, auth_cart, 1, 3),
        cart_item(12, auth_cart, 2, 3),
        cart_item(11, auth_cart, 3, 4),
    ];

    let plan = merge_plan(&auth, &[]);
    assert!(plan.is_empty());
}

/// Disjoint carts merge purely by insertion.
#[test]
fn test_merge_disjoint_carts() {
    let auth_cart = CartId::generate();
    let anon_cart = CartId::generate();

    let auth = [cart_item(1, auth_cart, 1, 2)];
    let anon = [
        cart_item(2, anon_cart, 2, 1),
        cart_item(3, anon_cart, 3, 6),
    ];

    let plan = merge_plan(&auth, &anon);
    assert!(plan.updates.is_empty());
    assert_eq!(
        plan.inserts,
        vec![(ProductId::new(2), 1), (ProductId::new(3), 6)]
    );
}

/// Identical carts double every quantity and insert nothing — the uniqueness
/// invariant on (cart, product) is preserved by construction.
#[test]
fn test_merge_identical_carts_updates_only() {
    let auth_cart = CartId::generate();
    let anon_cart = CartId::generate();

    let auth = [
        cart_item(1, auth_cart, 1, 2),
        cart_item(2, auth_cart, 2, 5),
    ];
    let anon = [
        cart_item(3, anon_cart, 1, 2),
        cart_item(4, anon_cart, 2, 5),
    ];

    let plan = merge_plan(&auth, &anon);
    assert!(plan.inserts.is_empty());
    assert_eq!(
        plan.updates,
        vec![(CartItemId::new(1), 4), (CartItemId::new(2), 10)]
    );
}

/// A plan never mentions a product twice across updates and inserts.
#[test]
fn test_plan_targets_are_disjoint() {
    let auth_cart = CartId::generate();
    let anon_cart = CartId::generate();

    let auth = [
        cart_item(1, auth_cart, 1, 1),
        cart_item(2, auth_cart, 2, 1),
    ];
    let anon = [
        cart_item(3, anon_cart, 2, 1),
        cart_item(4, anon_cart, 3, 1),
    ];

    let plan = merge_plan(&auth, &anon);

    let updated: Vec<CartItemId> = plan.updates.iter().map(|(id, _)| *id).collect();
    let inserted: Vec<ProductId> = plan.inserts.iter().map(|(id, _)| *id).collect();

    assert_eq!(updated, vec![CartItemId::new(2)]);
    assert_eq!(inserted, vec![ProductId::new(3)]);
}
