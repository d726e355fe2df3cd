//! Staff management commands.

use blood_orange_core::{Email, Role};
use blood_orange_store::db;
use blood_orange_store::db::users::StaffPromotion;

use super::connect;

/// Promote a user to staff and assign a capability role.
///
/// The customer profile is removed unless orders still reference it.
///
/// # Errors
///
/// Returns an error for an unknown user, an invalid role, or a database
/// failure.
pub async fn promote(email: &str, role: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    let role: Role = role.parse()?;

    let pool = connect().await?;

    let user = db::users::get_by_email(&pool, &email)
        .await?
        .ok_or_else(|| format!("no user with email {email}"))?;

    db::users::set_role(&pool, user.id, role).await?;
    let promotion = db::users::promote_to_staff(&pool, user.id).await?;

    match promotion {
        StaffPromotion::CustomerRemoved => {
            tracing::info!(%email, %role, "promoted to staff; customer profile removed");
        }
        StaffPromotion::CustomerRetained => {
            tracing::info!(%email, %role, "promoted to staff; customer profile kept (orders exist)");
        }
    }

    Ok(())
}
