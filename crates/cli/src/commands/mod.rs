//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod staff;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect to the store database using `STORE_DATABASE_URL`.
///
/// Loads `.env` first so the CLI works from a plain checkout.
pub async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let database_url = std::env::var("STORE_DATABASE_URL")
        .map_err(|_| "STORE_DATABASE_URL environment variable is not set")?;

    let pool = blood_orange_store::db::create_pool(&SecretString::from(database_url)).await?;
    Ok(pool)
}
