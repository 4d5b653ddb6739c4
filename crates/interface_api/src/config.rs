//! API configuration

use rust_decimal::Decimal;
use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Typical monthly total (flat fee + assistance fee) used as the
    /// months-in-arrears divisor
    pub average_monthly_due: Decimal,
    /// Months of net debt before a member counts as in arrears
    pub arrears_months_threshold: u32,
    /// Per-member lock acquisition timeout in milliseconds
    pub lock_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/membership".to_string(),
            log_level: "info".to_string(),
            average_monthly_due: Decimal::new(3000, 2),
            arrears_months_threshold: 3,
            lock_timeout_ms: 5000,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment variables with the `API_` prefix
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
