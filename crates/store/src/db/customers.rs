//! Database operations for customers and addresses.

use sqlx::PgExecutor;

use blood_orange_core::{CustomerId, UserId};

use super::RepositoryError;
use crate::models::customer::{Address, Customer, NewAddress};

/// Get the customer profile for a user account.
///
/// Staff accounts have none.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_user(
    executor: impl PgExecutor<'_>,
    user_id: UserId,
) -> Result<Option<Customer>, RepositoryError> {
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT id, user_id, created_at FROM customer WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(customer)
}

/// Get a customer's address, if one is set.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_address(
    executor: impl PgExecutor<'_>,
    customer_id: CustomerId,
) -> Result<Option<Address>, RepositoryError> {
    let address = sqlx::query_as::<_, Address>(
        "SELECT customer_id, province, city, street FROM customer_address WHERE customer_id = $1",
    )
    .bind(customer_id)
    .fetch_optional(executor)
    .await?;

    Ok(address)
}

/// Create a customer's address.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the customer already has one.
pub async fn create_address(
    executor: impl PgExecutor<'_>,
    customer_id: CustomerId,
    new: &NewAddress,
) -> Result<Address, RepositoryError> {
    let address = sqlx::query_as::<_, Address>(
        "INSERT INTO customer_address (customer_id, province, city, street)
         VALUES ($1, $2, $3, $4)
         RETURNING customer_id, province, city, street",
    )
    .bind(customer_id)
    .bind(&new.province)
    .bind(&new.city)
    .bind(&new.street)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict("address already exists".to_owned());
        }
        RepositoryError::Database(e)
    })?;

    Ok(address)
}
