//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Default first segment of payment references.
pub const DEFAULT_REFERENCE_PREFIX: &str = "VARYLO";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Payment gateway settings.
    pub recharge: RechargeConfig,
    /// Key for company-owned provider keys, as hex or base64.
    pub credentials_key: Option<String>,
}

/// Settings for verifying payment gateway events.
#[derive(Debug, Clone)]
pub struct RechargeConfig {
    /// Checksum secret shared with the gateway.
    pub events_secret: Option<String>,
    /// Required first segment of `prefix-{companyId}-{timestamp}` references.
    pub reference_prefix: String,
}

impl Default for RechargeConfig {
    fn default() -> Self {
        Self {
            events_secret: None,
            reference_prefix: DEFAULT_REFERENCE_PREFIX.to_string(),
        }
    }
}

impl RechargeConfig {
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.events_secret = Some(secret.into());
        self
    }

    pub fn with_reference_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reference_prefix = prefix.into();
        self
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `VARYLO_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:varylo.db?mode=rwc` |
    /// | `RECHARGE_EVENTS_SECRET` | Payment gateway checksum secret | (none) |
    /// | `RECHARGE_REFERENCE_PREFIX` | Payment reference prefix | `VARYLO` |
    /// | `CREDENTIALS_KEY` | Key decrypting company-owned provider keys | (none) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("VARYLO_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:varylo.db?mode=rwc".to_string());

        let events_secret = non_empty_var("RECHARGE_EVENTS_SECRET");

        let reference_prefix = non_empty_var("RECHARGE_REFERENCE_PREFIX")
            .unwrap_or_else(|| DEFAULT_REFERENCE_PREFIX.to_string());

        let credentials_key = non_empty_var("CREDENTIALS_KEY");

        Ok(Self {
            addr,
            database_url,
            recharge: RechargeConfig {
                events_secret,
                reference_prefix,
            },
            credentials_key,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid VARYLO_ADDR format")]
    InvalidAddr,
}
