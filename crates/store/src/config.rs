//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STORE_DATABASE_URL` - `PostgreSQL` connection string
//! - `STORE_BASE_URL` - Public URL for the store (gateway callbacks land here)
//! - `GATEWAY_MERCHANT_ID` - Payment gateway merchant identity
//!
//! ## Optional
//! - `STORE_HOST` - Bind address (default: 127.0.0.1)
//! - `STORE_PORT` - Listen port (default: 3000)
//! - `GATEWAY_BASE_URL` - Gateway origin (default: the sandbox)
//! - `GATEWAY_TIMEOUT_SECS` - Bound on gateway round-trips (default: 10)
//! - `ORDER_EXPIRY_MINUTES` - Unpaid order lifetime (default: 30)
//! - `SWEEP_INTERVAL_SECS` - Expiry sweeper cadence (default: 600)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Sentry event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry tracing sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::services::payment::GatewayConfig;

/// Default payment gateway origin (sandbox).
const DEFAULT_GATEWAY_BASE_URL: &str = "https://sandbox.zarinpal.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Store application configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the store
    pub base_url: String,
    /// Payment gateway configuration
    pub gateway: GatewayConfig,
    /// How long an unpaid order lives before the sweeper may take it
    pub order_expiry: chrono::Duration,
    /// Expiry sweeper cadence
    pub sweep_interval: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry event sample rate
    pub sentry_sample_rate: f32,
    /// Sentry tracing sample rate
    pub sentry_traces_sample_rate: f32,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(require_env("STORE_DATABASE_URL")?);
        let base_url = require_env("STORE_BASE_URL")?;

        // Validate the base URL early; the payment callback is derived from it.
        Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("STORE_BASE_URL".to_owned(), e.to_string()))?;

        let host: IpAddr = parse_env("STORE_HOST", "127.0.0.1")?;
        let port: u16 = parse_env("STORE_PORT", "3000")?;

        let gateway = GatewayConfig {
            merchant_id: require_env("GATEWAY_MERCHANT_ID")?,
            base_url: parse_env("GATEWAY_BASE_URL", DEFAULT_GATEWAY_BASE_URL)?,
            timeout: Duration::from_secs(parse_env("GATEWAY_TIMEOUT_SECS", "10")?),
        };

        let order_expiry = chrono::Duration::minutes(parse_env("ORDER_EXPIRY_MINUTES", "30")?);
        let sweep_interval = Duration::from_secs(parse_env("SWEEP_INTERVAL_SECS", "600")?);

        Ok(Self {
            database_url,
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_owned(),
            gateway,
            order_expiry,
            sweep_interval,
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            sentry_environment: std::env::var("SENTRY_ENVIRONMENT").ok(),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// The socket address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The URL the payment gateway redirects shoppers back to.
    #[must_use]
    pub fn payment_callback_url(&self) -> String {
        format!("{}/payment/callback", self.base_url)
    }
}

/// Read a required environment variable.
fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

/// Read an optional environment variable and parse it, with a default.
fn parse_env<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_owned());
    raw.parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(name.to_owned(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StoreConfig {
        StoreConfig {
            database_url: SecretString::from("postgres://localhost/test".to_owned()),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://shop.example.com".to_owned(),
            gateway: GatewayConfig {
                merchant_id: "test-merchant".to_owned(),
                base_url: Url::parse(DEFAULT_GATEWAY_BASE_URL).unwrap(),
                timeout: Duration::from_secs(10),
            },
            order_expiry: chrono::Duration::minutes(30),
            sweep_interval: Duration::from_secs(600),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_socket_addr() {
        assert_eq!(config().socket_addr().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_payment_callback_url() {
        assert_eq!(
            config().payment_callback_url(),
            "https://shop.example.com/payment/callback"
        );
    }
}
