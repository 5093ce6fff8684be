//! Configuration loading and representation.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::external::TwilioOptions;

const DEV_JWT_SECRET: &str = "dev-secret";

const MAX_ACCESS_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;
const MAX_VERIFICATION_CODE_TTL_SECS: u64 = 24 * 60 * 60;
const MAX_VERIFICATION_CODE_DIGITS: u64 = 12;
const MAX_VERIFICATION_ID_LENGTH: u64 = 256;
const MAX_STORE_TIMEOUT_MS: u64 = 10 * 60 * 1_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer no greater than {max}, got '{value}'")]
    InvalidNumber {
        key: &'static str,
        value: String,
        max: u64,
    },

    #[error("TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_FROM_NUMBER must be set together")]
    PartialTwilio,
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub verification_code_ttl: Duration,
    pub verification_code_digits: usize,
    pub verification_id_length: usize,
    pub store_timeout: Duration,
    /// `None` selects the log sender.
    pub twilio: Option<TwilioOptions>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            verification_code_ttl: Duration::from_secs(10 * 60),
            verification_code_digits: 6,
            verification_id_length: 50,
            store_timeout: Duration::from_millis(5_000),
            twilio: None,
        }
    }
}

impl AppConfig {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let twilio = match (
            get("TWILIO_ACCOUNT_SID"),
            get("TWILIO_AUTH_TOKEN"),
            get("TWILIO_FROM_NUMBER"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(TwilioOptions {
                account_sid,
                auth_token,
                from_number,
            }),
            (None, None, None) => None,
            _ => return Err(ConfigError::PartialTwilio),
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            jwt_secret,
            access_token_ttl: number(&get, "ACCESS_TOKEN_TTL_SECS", MAX_ACCESS_TOKEN_TTL_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.access_token_ttl),
            verification_code_ttl: number(&get, "VERIFICATION_CODE_TTL_SECS", MAX_VERIFICATION_CODE_TTL_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.verification_code_ttl),
            verification_code_digits: number(&get, "VERIFICATION_CODE_DIGITS", MAX_VERIFICATION_CODE_DIGITS)?
                .map(|n| n as usize)
                .unwrap_or(defaults.verification_code_digits),
            verification_id_length: number(&get, "VERIFICATION_ID_LENGTH", MAX_VERIFICATION_ID_LENGTH)?
                .map(|n| n as usize)
                .unwrap_or(defaults.verification_id_length),
            store_timeout: number(&get, "STORE_TIMEOUT_MS", MAX_STORE_TIMEOUT_MS)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            twilio,
        })
    }
}

/// Parse `key` as an integer in `1..=max`.
fn number(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    max: u64,
) -> Result<Option<u64>, ConfigError> {
    let Some(value) = get(key) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(n) if (1..=max).contains(&n) => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { key, value, max }),
    }
}
