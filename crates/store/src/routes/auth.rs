//! Authentication route handlers.
//!
//! Registration and login both end the same way: the identity goes into the
//! session and, when the session was shopping anonymously, a reconciliation
//! task is submitted so the anonymous cart follows the user. One routine,
//! two call sites.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use blood_orange_core::{Email, Role, UserId};

use crate::error::{AppError, Result};
use crate::middleware::{clear_current_user, existing_cart_session_key, set_current_user};
use crate::models::session::CurrentUser;
use crate::models::user::User;
use crate::services::auth::AuthService;
use crate::services::tasks::Task;
use crate::state::AppState;

/// Registration / login form data.
#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

/// Public view of a user account.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Create an account, log it in, and reconcile the session's anonymous cart.
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .register(&body.email, &body.password)
        .await?;

    establish_session(&state, &session, &user).await?;

    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// Login and reconcile the session's anonymous cart.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<UserView>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    establish_session(&state, &session, &user).await?;

    Ok(Json(UserView::from(&user)))
}

/// Logout. The anonymous cart key survives, so the shopper drops back into
/// a plain anonymous session.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Write the identity into the session and hand the anonymous cart (if the
/// session has one) to the reconciliation engine.
async fn establish_session(state: &AppState, session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
        is_staff: user.is_staff,
    };

    set_current_user(session, &current)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if let Some(session_key) = existing_cart_session_key(session).await {
        state.tasks().submit(Task::ReconcileCarts {
            user_id: user.id,
            session_key,
        });
    }

    Ok(())
}
