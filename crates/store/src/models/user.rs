//! User domain types.

use chrono::{DateTime, Utc};

use blood_orange_core::{Email, Role, UserId};

/// A store user account (domain type).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Staff accounts skip customer creation and pass every capability check.
    pub is_staff: bool,
    /// Capability role.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
