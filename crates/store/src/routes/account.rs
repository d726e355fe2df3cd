//! Account route handlers: customer profile and address.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::instrument;

use blood_orange_core::{CustomerId, Email};

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::customer::{Address, Customer, NewAddress};
use crate::state::AppState;

/// Customer profile display data.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub customer_id: CustomerId,
    pub email: Email,
    pub address: Option<Address>,
}

/// Load the requester's customer profile or fail.
async fn require_customer(state: &AppState, user_id: blood_orange_core::UserId) -> Result<Customer> {
    db::customers::get_by_user(state.pool(), user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("no customer profile for this account".to_owned()))
}

/// The requester's customer profile.
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ProfileView>> {
    let customer = require_customer(&state, user.id).await?;
    let address = db::customers::get_address(state.pool(), customer.id).await?;

    Ok(Json(ProfileView {
        customer_id: customer.id,
        email: user.email,
        address,
    }))
}

/// The requester's address.
pub async fn get_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Address>> {
    let customer = require_customer(&state, user.id).await?;

    let address = db::customers::get_address(state.pool(), customer.id)
        .await?
        .ok_or_else(|| AppError::NotFound("no address on file".to_owned()))?;

    Ok(Json(address))
}

/// Create the requester's address. A second one is a conflict.
#[instrument(skip(state, user, body), fields(user = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<NewAddress>,
) -> Result<impl IntoResponse> {
    let customer = require_customer(&state, user.id).await?;

    let address = db::customers::create_address(state.pool(), customer.id, &body).await?;

    Ok((StatusCode::CREATED, Json(address)))
}
