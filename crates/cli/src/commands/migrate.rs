//! Database migration commands.

use super::connect;

/// Run the store database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn store() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;

    tracing::info!("Running store migrations");
    sqlx::migrate!("../store/migrations").run(&pool).await?;
    tracing::info!("Store migrations complete");

    Ok(())
}
