//! Cart reconciliation: unifying an anonymous cart with a user's cart.
//!
//! Fires when a previously-anonymous session authenticates (login or
//! signup). Both trigger points submit the same task, which lands in
//! [`reconcile_session_cart`] — one routine, no ambient request state, the
//! identity comes in as explicit arguments.

use sqlx::PgPool;
use std::collections::HashMap;
use tracing::instrument;

use blood_orange_core::{CartItemId, ProductId, UserId};

use crate::db::{self, RepositoryError};
use crate::models::cart::CartItem;

/// What a reconciliation run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The session had no anonymous cart; nothing to do.
    NoAnonymousCart,
    /// The anonymous cart's ownership was rewritten to the user.
    Transferred,
    /// The anonymous cart was merged into the user's cart and deleted.
    Merged { updated: usize, created: usize },
}

/// The writes a merge will perform against the destination cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    /// `(existing line, new quantity)` for products present in both carts.
    pub updates: Vec<(CartItemId, i32)>,
    /// `(product, quantity)` lines to create in the destination cart.
    pub inserts: Vec<(ProductId, i32)>,
}

impl MergePlan {
    /// Whether the merge has nothing to write (empty source cart).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty()
    }
}

/// Plan the merge of `anon_items` into the cart holding `auth_items`.
///
/// Products present in both carts get their quantities added together;
/// everything else becomes a new line. Pure: the caller applies the plan and
/// deletes the source cart inside one transaction, so the `(cart, product)`
/// uniqueness invariant never wobbles even transiently.
#[must_use]
pub fn merge_plan(auth_items: &[CartItem], anon_items: &[CartItem]) -> MergePlan {
    let by_product: HashMap<ProductId, &CartItem> =
        auth_items.iter().map(|item| (item.product_id, item)).collect();

    let mut plan = MergePlan {
        updates: Vec::new(),
        inserts: Vec::new(),
    };

    for item in anon_items {
        match by_product.get(&item.product_id) {
            Some(existing) => plan
                .updates
                .push((existing.id, existing.quantity.saturating_add(item.quantity))),
            None => plan.inserts.push((item.product_id, item.quantity)),
        }
    }

    plan
}

/// Reconcile the anonymous cart of `session_key` with `user_id`'s cart.
///
/// State machine over (anonymous cart exists, user cart exists):
/// no anon cart → no-op; anon only → transfer ownership; both → merge and
/// delete the anonymous cart. All of it runs in one transaction with both
/// cart rows locked, so a concurrent run observes either the full result or
/// the untouched pre-state — and a second run is a no-op because the
/// anonymous cart is gone.
///
/// # Errors
///
/// Returns `RepositoryError` if any statement fails; the transaction rolls
/// back and no partial merge survives.
#[instrument(skip(pool))]
pub async fn reconcile_session_cart(
    pool: &PgPool,
    user_id: UserId,
    session_key: &str,
) -> Result<ReconcileOutcome, RepositoryError> {
    let mut tx = pool.begin().await?;

    let Some(anon_cart) = db::carts::lock_by_session(&mut tx, session_key).await? else {
        return Ok(ReconcileOutcome::NoAnonymousCart);
    };

    let Some(auth_cart) = db::carts::lock_by_user(&mut tx, user_id).await? else {
        db::carts::assign_to_user(&mut tx, anon_cart.id, user_id).await?;
        tx.commit().await?;
        tracing::info!(user = %user_id, cart = %anon_cart.id, "anonymous cart transferred");
        return Ok(ReconcileOutcome::Transferred);
    };

    let auth_items = db::carts::items(&mut tx, auth_cart.id).await?;
    let anon_items = db::carts::items(&mut tx, anon_cart.id).await?;
    let plan = merge_plan(&auth_items, &anon_items);

    for (item_id, quantity) in &plan.updates {
        db::carts::set_item_quantity(&mut *tx, *item_id, *quantity).await?;
    }
    for (product_id, quantity) in &plan.inserts {
        db::carts::insert_item(&mut *tx, auth_cart.id, *product_id, *quantity).await?;
    }

    // The destination is fully written; only now does the source go away.
    db::carts::delete(&mut *tx, anon_cart.id).await?;

    tx.commit().await?;
    tracing::info!(
        user = %user_id,
        updated = plan.updates.len(),
        created = plan.inserts.len(),
        "anonymous cart merged"
    );

    Ok(ReconcileOutcome::Merged {
        updated: plan.updates.len(),
        created: plan.inserts.len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use blood_orange_core::CartId;

    fn item(id: i32, cart: CartId, product: i32, quantity: i32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            cart_id: cart,
            product_id: ProductId::new(product),
            quantity,
        }
    }

    #[test]
    fn test_shared_products_add_quantities() {
        let auth_cart = CartId::generate();
        let anon_cart = CartId::generate();
        let auth = [item(1, auth_cart, 10, 1), item(2, auth_cart, 30, 4)];
        let anon = [item(3, anon_cart, 10, 2), item(4, anon_cart, 20, 3)];

        let plan = merge_plan(&auth, &anon);

        assert_eq!(plan.updates, vec![(CartItemId::new(1), 3)]);
        assert_eq!(plan.inserts, vec![(ProductId::new(20), 3)]);
    }

    #[test]
    fn test_empty_anonymous_cart_plans_nothing() {
        let auth_cart = CartId::generate();
        let auth = [item(1, auth_cart, 10, 1)];

        let plan = merge_plan(&auth, &[]);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_empty_auth_cart_inserts_everything() {
        let anon_cart = CartId::generate();
        let anon = [item(1, anon_cart, 10, 2), item(2, anon_cart, 20, 5)];

        let plan = merge_plan(&[], &anon);
        assert!(plan.updates.is_empty());
        assert_eq!(
            plan.inserts,
            vec![(ProductId::new(10), 2), (ProductId::new(20), 5)]
        );
    }

    #[test]
    fn test_quantity_addition_saturates() {
        let auth_cart = CartId::generate();
        let anon_cart = CartId::generate();
        let auth = [item(1, auth_cart, 10, i32::MAX)];
        let anon = [item(2, anon_cart, 10, 1)];

        let plan = merge_plan(&auth, &anon);
        assert_eq!(plan.updates, vec![(CartItemId::new(1), i32::MAX)]);
    }
}
