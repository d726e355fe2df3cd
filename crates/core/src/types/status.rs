//! Status and role enums.

use serde::{Deserialize, Serialize};

/// Payment status of an order.
///
/// Stored as lowercase text in the database. `Canceled` never survives in
/// storage: an order transitioning to it is deleted in the same operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Unpaid,
    Paid,
    Canceled,
}

impl OrderStatus {
    /// The lowercase storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Canceled => "canceled",
        }
    }

    /// Whether the transition `self -> to` is allowed.
    ///
    /// The only live transitions are `unpaid -> paid` (payment verified) and
    /// `unpaid -> canceled` (which deletes the order). A paid order is final.
    #[must_use]
    pub const fn can_transition_to(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Unpaid, Self::Paid) | (Self::Unpaid, Self::Canceled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "canceled" => Ok(Self::Canceled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Capability role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular shopper: sees only their own carts and orders.
    #[default]
    Customer,
    /// Store staff managing orders: sees every cart and order, may delete orders.
    OrderManager,
}

impl Role {
    /// The snake_case storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::OrderManager => "order_manager",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "order_manager" => Ok(Self::OrderManager),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

// SQLx support (with postgres feature): both enums live in TEXT columns.

#[cfg(feature = "postgres")]
macro_rules! impl_text_column {
    ($name:ident) => {
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                s.parse::<Self>().map_err(Into::into)
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

#[cfg(feature = "postgres")]
impl_text_column!(OrderStatus);
#[cfg(feature = "postgres")]
impl_text_column!(Role);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [OrderStatus::Unpaid, OrderStatus::Paid, OrderStatus::Canceled] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_paid_is_terminal() {
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Unpaid));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Canceled));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Paid));
    }

    #[test]
    fn test_unpaid_transitions() {
        assert!(OrderStatus::Unpaid.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Unpaid.can_transition_to(OrderStatus::Canceled));
        assert!(!OrderStatus::Unpaid.can_transition_to(OrderStatus::Unpaid));
    }

    #[test]
    fn test_role_roundtrip() {
        assert_eq!("order_manager".parse::<Role>().unwrap(), Role::OrderManager);
        assert_eq!("customer".parse::<Role>().unwrap(), Role::Customer);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(serde_json::to_string(&OrderStatus::Unpaid).unwrap(), "\"unpaid\"");
    }
}
