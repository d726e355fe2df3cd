//! Session-stored types.
//!
//! Everything the server keeps per browsing session: the logged-in identity,
//! the anonymous cart key, and in-flight payment data.

use serde::{Deserialize, Serialize};

use blood_orange_core::{Email, OrderId, Role, Toman, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Capability role.
    pub role: Role,
    /// Staff flag.
    pub is_staff: bool,
}

/// In-flight payment state, held only for the session that initiated it.
///
/// Written when the gateway accepts a payment request, consumed by the
/// callback. Never persisted beyond the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentData {
    /// The order being paid.
    pub order_id: OrderId,
    /// The amount sent to the gateway; the verify call must repeat it.
    pub amount: Toman,
    /// The authority token the gateway issued; the callback must present it.
    pub authority: String,
}

/// Session keys.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the anonymous cart session key.
    pub const CART_SESSION_KEY: &str = "cart_session_key";

    /// Key for in-flight payment data.
    pub const PAYMENT_DATA: &str = "payment_data";
}
