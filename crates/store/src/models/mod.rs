//! Domain models for the store.
//!
//! These types represent validated domain objects. Database row decoding maps
//! straight onto them via `sqlx::FromRow` where the column shapes line up.

pub mod cart;
pub mod customer;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use session::{CurrentUser, PaymentData, session_keys};
