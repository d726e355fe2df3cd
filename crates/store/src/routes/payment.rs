//! Payment route handlers.
//!
//! `POST /payment` starts the gateway flow; `GET /payment/callback` is where
//! the gateway sends the shopper back with `Authority` and `Status`.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use blood_orange_core::OrderId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::payment::{self, CallbackStatus, InitiatedPayment};
use crate::state::AppState;

/// Payment initiation form data.
#[derive(Debug, Deserialize)]
pub struct InitiateBody {
    pub order_id: i32,
}

/// Gateway callback query parameters.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(rename = "Authority")]
    pub authority: Option<String>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
}

/// Phase 1: open a gateway transaction and return the redirect URL.
#[instrument(skip(state, session, user), fields(user = %user.id))]
pub async fn initiate(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(body): Json<InitiateBody>,
) -> Result<Json<InitiatedPayment>> {
    let initiated =
        payment::initiate(&state, &user, OrderId::new(body.order_id), &session).await?;

    Ok(Json(initiated))
}

/// Phase 2: the gateway's return URL.
///
/// Without parameters this is just a hint page; with them the transaction is
/// verified and settled.
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<String> {
    let (Some(authority), Some(status)) = (query.authority, query.status) else {
        return Ok("Initiate a payment with your order id to be redirected here.".to_owned());
    };

    let status: CallbackStatus = status
        .parse()
        .map_err(|e: String| AppError::BadRequest(e))?;

    let confirmed = payment::confirm(&state, &session, &authority, status).await?;

    if confirmed.already_verified {
        Ok(format!(
            "Transaction is submitted before. | ref_id: {}",
            confirmed.ref_id
        ))
    } else {
        Ok(format!(
            "Transaction success. | ref_id: {}.",
            confirmed.ref_id
        ))
    }
}
