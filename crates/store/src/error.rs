//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::cart::QuantityError;
use crate::services::auth::AuthError;
use crate::services::catalog::InventoryError;
use crate::services::checkout::CheckoutError;
use crate::services::payment::PaymentError;

/// Application-level error type for the store.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart quantity validation failed.
    #[error("Quantity error: {0}")]
    Quantity(#[from] QuantityError),

    /// Order placement failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment flow failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Inventory ledger failure.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflicting request (duplicate cart product, second address, ...).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Quantity(_) => StatusCode::BAD_REQUEST,
            Self::Checkout(err) => match err {
                CheckoutError::CartNotFound => StatusCode::NOT_FOUND,
                CheckoutError::CartEmpty => StatusCode::BAD_REQUEST,
                CheckoutError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Payment(err) => match err {
                PaymentError::OrderNotFound => StatusCode::NOT_FOUND,
                PaymentError::AlreadyPaid => StatusCode::CONFLICT,
                PaymentError::InsufficientStock(_)
                | PaymentError::NoPendingPayment
                | PaymentError::AuthorityMismatch
                | PaymentError::Canceled
                | PaymentError::Declined { .. } => StatusCode::BAD_REQUEST,
                PaymentError::Gateway(_) => StatusCode::BAD_GATEWAY,
                PaymentError::Repository(_) | PaymentError::Session(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Inventory(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// The message shown to the client. Internal details never leak.
    fn client_message(&self) -> String {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => "not found".to_owned(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "internal server error".to_owned(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "invalid credentials".to_owned(),
                AuthError::UserAlreadyExists => {
                    "an account with this email already exists".to_owned()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "invalid email address".to_owned(),
                _ => "authentication error".to_owned(),
            },
            Self::Payment(err) => match err {
                PaymentError::Gateway(_) => "payment gateway error".to_owned(),
                PaymentError::Repository(_) | PaymentError::Session(_) => {
                    "internal server error".to_owned()
                }
                other => other.to_string(),
            },
            Self::Quantity(err) => err.to_string(),
            Self::Checkout(CheckoutError::Repository(_))
            | Self::Inventory(_)
            | Self::Internal(_) => "internal server error".to_owned(),
            Self::Checkout(err) => err.to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let message = self.client_message();
        (status, Json(json!({ "detail": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_not_found_statuses() {
        assert_eq!(
            get_status(AppError::NotFound("cart".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::CartNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::OrderNotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_statuses() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "this product has already been added to the cart".to_owned()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::AlreadyPaid)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_validation_statuses() {
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::CartEmpty)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::InsufficientStock(vec![
                "Saffron".to_owned()
            ]))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_gateway_errors_are_bad_gateway() {
        use crate::services::payment::GatewayError;
        assert_eq!(
            get_status(AppError::Payment(PaymentError::Gateway(
                GatewayError::InvalidResponse("non-JSON body".to_owned())
            ))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_details_do_not_leak() {
        let err = AppError::Internal("connection string with secrets".to_owned());
        assert_eq!(err.client_message(), "internal server error");
    }
}
