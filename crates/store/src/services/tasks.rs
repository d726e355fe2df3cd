//! Background task worker.
//!
//! Fire-and-forget jobs submitted from request handlers and drained by a
//! single tokio worker: the order-paid transition, inventory adjustments,
//! and cart reconciliation. Each task is retried a bounded number of times
//! with a fixed delay; permanent failures are logged, never re-raised into a
//! request.

use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use blood_orange_core::{OrderId, ProductId, UserId};

use crate::db::{self, RepositoryError};
use crate::models::product::{StockAdjustment, StockError};
use crate::services::catalog::{InventoryError, ProductCatalog};
use crate::services::reconciliation;

/// Retry policy: attempts per task and the delay between them.
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// A background job.
#[derive(Debug, Clone)]
pub enum Task {
    /// Transition an order unpaid→paid and queue its inventory decrements.
    ApproveOrder { order_id: OrderId },
    /// Apply one inventory ledger adjustment.
    AdjustInventory {
        product_id: ProductId,
        quantity: i32,
        adjustment: StockAdjustment,
    },
    /// Reconcile a session's anonymous cart with a user's cart.
    ReconcileCarts {
        user_id: UserId,
        session_key: String,
    },
}

/// Handle for submitting tasks to the worker.
#[derive(Clone)]
pub struct TaskQueue {
    sender: UnboundedSender<Task>,
}

impl TaskQueue {
    /// Submit a task, fire-and-forget.
    ///
    /// A send can only fail once the worker has shut down; during shutdown
    /// dropped tasks are logged and otherwise ignored.
    pub fn submit(&self, task: Task) {
        if self.sender.send(task).is_err() {
            error!("task worker has shut down; dropping task");
        }
    }
}

/// Spawn the worker and return the queue handle plus its join handle.
#[must_use]
pub fn spawn_worker(pool: PgPool, catalog: ProductCatalog) -> (TaskQueue, JoinHandle<()>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let queue = TaskQueue { sender };

    let worker_queue = queue.clone();
    let handle = tokio::spawn(worker_loop(pool, catalog, worker_queue, receiver));

    (queue, handle)
}

async fn worker_loop(
    pool: PgPool,
    catalog: ProductCatalog,
    queue: TaskQueue,
    mut receiver: UnboundedReceiver<Task>,
) {
    info!("task worker started");

    while let Some(task) = receiver.recv().await {
        run_with_retry(&pool, &catalog, &queue, task).await;
    }

    info!("task worker stopped");
}

async fn run_with_retry(pool: &PgPool, catalog: &ProductCatalog, queue: &TaskQueue, task: Task) {
    for attempt in 1..=MAX_ATTEMPTS {
        match run_task(pool, catalog, queue, &task).await {
            Ok(summary) => {
                info!(%summary, "task finished");
                return;
            }
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                warn!(error = %e, attempt, "task failed, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => {
                error!(error = %e, task = ?task, "task failed permanently");
                return;
            }
        }
    }
}

/// Errors from running a task.
#[derive(Debug, Error)]
enum TaskError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl TaskError {
    /// Transient failures are retried; a stock-invariant violation is not —
    /// retrying cannot make the numbers add up, it can only mask them.
    fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Inventory(InventoryError::Stock(StockError::Insufficient { .. })),
        )
    }
}

async fn run_task(
    pool: &PgPool,
    catalog: &ProductCatalog,
    queue: &TaskQueue,
    task: &Task,
) -> Result<String, TaskError> {
    match task {
        Task::ApproveOrder { order_id } => {
            let items = db::orders::items(pool, *order_id).await?;

            // Only the call that performs the transition queues decrements;
            // a re-run (or a duplicate approval) finds the guard closed.
            if db::orders::mark_paid(pool, *order_id).await? {
                for item in &items {
                    queue.submit(Task::AdjustInventory {
                        product_id: item.product_id,
                        quantity: item.quantity,
                        adjustment: StockAdjustment::Decrease,
                    });
                }
                Ok(format!(
                    "order {order_id} approved, {} inventory adjustments queued",
                    items.len()
                ))
            } else {
                Ok(format!("order {order_id} is not awaiting approval, skipping"))
            }
        }

        Task::AdjustInventory {
            product_id,
            quantity,
            adjustment,
        } => {
            let product = catalog
                .adjust_inventory(*product_id, *quantity, *adjustment)
                .await?;
            let verb = match adjustment {
                StockAdjustment::Increase => "restocked",
                StockAdjustment::Decrease => "consumed",
            };
            Ok(format!(
                "inventory {verb} for {} | current: {} | amount: {quantity}",
                product.name, product.inventory
            ))
        }

        Task::ReconcileCarts {
            user_id,
            session_key,
        } => {
            let outcome =
                reconciliation::reconcile_session_cart(pool, *user_id, session_key).await?;
            Ok(format!("cart reconciliation for user {user_id}: {outcome:?}"))
        }
    }
}
