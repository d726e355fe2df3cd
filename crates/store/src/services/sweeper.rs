//! Expiry sweeper: periodic deletion of expired unpaid orders.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::db;

/// Spawn the sweeper loop.
///
/// Every `every`, deletes orders with a status other than paid whose
/// expiration has passed. Paid orders are never touched regardless of age,
/// and no inventory compensation is needed: stock is only consumed at
/// payment confirmation, which these orders never reached.
#[must_use]
pub fn spawn(pool: PgPool, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = every.as_secs(), "expiry sweeper started");

        loop {
            ticker.tick().await;

            match db::orders::delete_expired_unpaid(&pool, Utc::now()).await {
                Ok(0) => debug!("no expired unpaid orders"),
                Ok(removed) => info!(removed, "expired unpaid orders deleted"),
                Err(e) => error!(error = %e, "expiry sweep failed"),
            }
        }
    })
}
