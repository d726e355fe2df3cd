//! Database operations for user accounts.
//!
//! Customer creation is an explicit step of [`create`]'s transaction rather
//! than a save hook: the causal chain lives in one place.

use sqlx::{PgExecutor, PgPool};

use blood_orange_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::user::User;

const USER_COLUMNS: &str = "id, email, is_staff, role, created_at";

/// What happened to the customer profile during a staff promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffPromotion {
    /// The customer profile was removed.
    CustomerRemoved,
    /// The profile was kept because orders still reference it.
    CustomerRetained,
}

/// Create a user account, and a customer profile with it unless the account
/// is staff.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email already exists.
pub async fn create(
    pool: &PgPool,
    email: &Email,
    password_hash: &str,
    is_staff: bool,
) -> Result<User, RepositoryError> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO app_user (email, password_hash, is_staff)
         VALUES ($1, $2, $3)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(email)
    .bind(password_hash)
    .bind(is_staff)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict("email already exists".to_owned());
        }
        RepositoryError::Database(e)
    })?;

    if !is_staff {
        sqlx::query("INSERT INTO customer (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(user)
}

/// Get a user by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id(
    executor: impl PgExecutor<'_>,
    id: UserId,
) -> Result<Option<User>, RepositoryError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM app_user WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

/// Get a user by email.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_email(
    executor: impl PgExecutor<'_>,
    email: &Email,
) -> Result<Option<User>, RepositoryError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM app_user WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

/// Get a user and their password hash by email, for login.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_with_password_hash(
    executor: impl PgExecutor<'_>,
    email: &Email,
) -> Result<Option<(User, String)>, RepositoryError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        user: User,
        password_hash: String,
    }

    let row = sqlx::query_as::<_, Row>(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM app_user WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| (r.user, r.password_hash)))
}

/// Set a user's capability role.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user does not exist.
pub async fn set_role(
    executor: impl PgExecutor<'_>,
    id: UserId,
    role: Role,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE app_user SET role = $2 WHERE id = $1")
        .bind(id)
        .bind(role)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Promote a user to staff, removing their customer profile when no orders
/// protect it.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user does not exist.
pub async fn promote_to_staff(
    pool: &PgPool,
    id: UserId,
) -> Result<StaffPromotion, RepositoryError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE app_user SET is_staff = TRUE WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    // Drop the customer profile unless orders still reference it.
    let removed = sqlx::query(
        "DELETE FROM customer c
         WHERE c.user_id = $1
           AND NOT EXISTS (SELECT 1 FROM store_order o WHERE o.customer_id = c.id)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    if removed.rows_affected() > 0 {
        Ok(StaffPromotion::CustomerRemoved)
    } else {
        Ok(StaffPromotion::CustomerRetained)
    }
}
