//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions, and manages the
//! per-session anonymous cart key.

use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::models::session::session_keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bo_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The store's own migration (the sessions table) is run by the caller at
/// startup.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StoreConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Create the `PostgreSQL` session store and its backing table.
///
/// # Errors
///
/// Returns the store's error if the table cannot be created.
pub async fn migrate_session_store(pool: &PgPool) -> Result<(), sqlx::Error> {
    let store = PostgresStore::new(pool.clone());
    store.migrate().await
}

/// The session's anonymous cart key, creating one on first use.
///
/// Anonymous carts are keyed by this value rather than the session ID
/// itself, so the key can survive session ID cycling at login and be handed
/// to the reconciliation task explicitly.
///
/// # Errors
///
/// Returns the session store's error if reading or writing fails.
pub async fn cart_session_key(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(key) = session
        .get::<String>(session_keys::CART_SESSION_KEY)
        .await?
    {
        return Ok(key);
    }

    let key = Uuid::new_v4().to_string();
    session
        .insert(session_keys::CART_SESSION_KEY, key.clone())
        .await?;
    Ok(key)
}

/// The session's anonymous cart key, if one was ever created.
///
/// Login and signup use this to decide whether reconciliation has anything
/// to look at; they never mint a fresh key.
pub async fn existing_cart_session_key(session: &Session) -> Option<String> {
    session
        .get::<String>(session_keys::CART_SESSION_KEY)
        .await
        .ok()
        .flatten()
}
