//! Customer and address domain types.

use chrono::{DateTime, Utc};

use blood_orange_core::{CustomerId, UserId};

/// A customer profile, one-to-one with a user account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Owning user account.
    pub user_id: UserId,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

/// A customer's address. At most one per customer.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Address {
    #[serde(skip)]
    pub customer_id: CustomerId,
    pub province: String,
    pub city: String,
    pub street: String,
}

/// Input for creating an address.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewAddress {
    pub province: String,
    pub city: String,
    pub street: String,
}
