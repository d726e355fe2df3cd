//! Two-phase payment confirmation against the external gateway.
//!
//! Phase 1 ([`initiate`]) opens a gateway transaction for an unpaid order and
//! parks the amount and order ID in the caller's session. Phase 2
//! ([`confirm`]) runs when the gateway calls back: the transaction is
//! verified server-side with a second round-trip, and only a verified success
//! hands the order to the task worker for the paid transition and the
//! inventory decrements — off the callback's request path.

mod gateway;

pub use gateway::{
    CODE_ALREADY_VERIFIED, CODE_SUCCESS, GatewayClient, GatewayConfig, GatewayError,
    PaymentAuthority, VerifyOutcome, parse_request_response, parse_verify_response,
};

use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use blood_orange_core::{OrderId, OrderStatus};

use crate::db::{self, RepositoryError};
use crate::models::session::{CurrentUser, PaymentData, session_keys};
use crate::services::tasks::Task;
use crate::state::AppState;

/// Errors from the payment flows.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Missing order, or one that belongs to someone else.
    #[error("order not found")]
    OrderNotFound,

    /// The order is already paid; paying twice is a conflict.
    #[error("order is already paid")]
    AlreadyPaid,

    /// Current stock no longer covers the order; it was deleted.
    #[error("not enough stock for: {0:?} | submit your order again")]
    InsufficientStock(Vec<String>),

    /// The callback arrived without an in-flight payment in this session.
    #[error("no payment is awaiting confirmation in this session")]
    NoPendingPayment,

    /// The callback's authority token is not the one this session initiated.
    #[error("authority token does not match the initiated payment")]
    AuthorityMismatch,

    /// The shopper canceled at the gateway (`Status=NOK`).
    #[error("transaction failed or canceled by user")]
    Canceled,

    /// The gateway did not confirm the payment on verify.
    #[error("transaction failed (code {code})")]
    Declined {
        /// Gateway result code.
        code: i64,
    },

    /// Gateway transport or protocol failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Database failure.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Session store failure.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Gateway `Status` query parameter on the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    /// The shopper completed the gateway flow.
    Ok,
    /// The shopper failed or canceled at the gateway.
    Nok,
}

impl std::str::FromStr for CallbackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(Self::Ok),
            "NOK" => Ok(Self::Nok),
            _ => Err(format!("invalid callback status: {s}")),
        }
    }
}

/// Phase 1 result: where to send the shopper.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InitiatedPayment {
    /// Gateway redirect URL.
    pub payment_url: String,
}

/// Phase 2 result.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmedPayment {
    /// Gateway reference ID for the settled transaction.
    pub ref_id: i64,
    /// True when the gateway reported the transaction as verified earlier;
    /// no side effects were applied by this call.
    pub already_verified: bool,
}

/// Phase 1: open a gateway transaction for an unpaid order.
///
/// Ownership is checked before any gateway call; a foreign order is reported
/// as not found. Stock is re-validated against current inventory — the
/// decrement only happens at confirmation, so the window since checkout may
/// have drained it; in that case the order is deleted and the shopper is told
/// to order again.
///
/// # Errors
///
/// See [`PaymentError`].
#[instrument(skip(state, user, session), fields(user = %user.id))]
pub async fn initiate(
    state: &AppState,
    user: &CurrentUser,
    order_id: OrderId,
    session: &Session,
) -> Result<InitiatedPayment, PaymentError> {
    let pool = state.pool();

    let Some((order, owner_id)) = db::orders::get_with_owner(pool, order_id).await? else {
        return Err(PaymentError::OrderNotFound);
    };

    if owner_id != user.id {
        // Existence of other customers' orders is not leaked.
        return Err(PaymentError::OrderNotFound);
    }

    if order.status != OrderStatus::Unpaid {
        return Err(PaymentError::AlreadyPaid);
    }

    let shortfall = db::orders::insufficient_products(pool, order_id).await?;
    if !shortfall.is_empty() {
        // Unpaid, so nothing was ever decremented; just drop the stale order.
        let _ = db::orders::delete_returning(pool, order_id).await?;
        return Err(PaymentError::InsufficientStock(shortfall));
    }

    let amount = db::orders::total(pool, order_id).await?;
    let description = format!("Transaction for {} | OrderID: {}", user.email, order.id);
    let callback_url = state.config().payment_callback_url();

    let authority = state
        .gateway()
        .request_payment(amount, &description, &callback_url)
        .await?;

    // Replace any previous in-flight payment for this session.
    let _: Option<PaymentData> = session.remove(session_keys::PAYMENT_DATA).await?;
    session
        .insert(
            session_keys::PAYMENT_DATA,
            PaymentData {
                order_id,
                amount,
                authority: authority.authority.clone(),
            },
        )
        .await?;

    tracing::info!(order = %order_id, amount = %amount, "payment initiated");

    Ok(InitiatedPayment {
        payment_url: state.gateway().start_pay_url(&authority.authority),
    })
}

/// Phase 2: settle the gateway callback.
///
/// A verified success removes the session entry and submits the approval
/// task; the worker's status-guarded unpaid→paid transition gates the
/// inventory decrements, so a re-delivered callback (which the gateway
/// answers with code 101) never applies them twice. Any other outcome leaves
/// the order unpaid and inventory untouched.
///
/// # Errors
///
/// See [`PaymentError`].
#[instrument(skip(state, session, authority))]
pub async fn confirm(
    state: &AppState,
    session: &Session,
    authority: &str,
    status: CallbackStatus,
) -> Result<ConfirmedPayment, PaymentError> {
    if status == CallbackStatus::Nok {
        return Err(PaymentError::Canceled);
    }

    let payment: Option<PaymentData> = session.get(session_keys::PAYMENT_DATA).await?;
    let Some(payment) = payment else {
        return Err(PaymentError::NoPendingPayment);
    };

    if payment.authority != authority {
        return Err(PaymentError::AuthorityMismatch);
    }

    match state.gateway().verify(payment.amount, authority).await? {
        VerifyOutcome::Verified { ref_id } => {
            let _: Option<PaymentData> = session.remove(session_keys::PAYMENT_DATA).await?;

            state.tasks().submit(Task::ApproveOrder {
                order_id: payment.order_id,
            });

            tracing::info!(order = %payment.order_id, ref_id, "payment verified");
            Ok(ConfirmedPayment {
                ref_id,
                already_verified: false,
            })
        }
        VerifyOutcome::AlreadyVerified { ref_id } => Ok(ConfirmedPayment {
            ref_id,
            already_verified: true,
        }),
        VerifyOutcome::Failed { code } => Err(PaymentError::Declined { code }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_status_parse() {
        assert_eq!("OK".parse::<CallbackStatus>().unwrap(), CallbackStatus::Ok);
        assert_eq!("NOK".parse::<CallbackStatus>().unwrap(), CallbackStatus::Nok);
        assert!("ok".parse::<CallbackStatus>().is_err());
        assert!("".parse::<CallbackStatus>().is_err());
    }
}
