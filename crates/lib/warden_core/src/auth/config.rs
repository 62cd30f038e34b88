//! Token and hashing configuration.
//!
//! Everything here is resolved once at startup and handed to
//! `SessionService::new`; nothing reads the environment afterwards.
//! Bad values never stop the process; they fall back to defaults with a
//! warning.

use chrono::Duration;
use thiserror::Error;
use tracing::warn;

use super::password::{DEFAULT_BCRYPT_COST, is_valid_cost};

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Longest accepted token lifetime: 10 years.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Issuer written into every token unless overridden.
pub const DEFAULT_ISSUER: &str = "warden-auth";

/// Development-only signing secret used when none is configured.
pub const INSECURE_DEV_SECRET: &str = "warden-insecure-dev-secret-change-me";

/// Errors from parsing a configured token lifetime.
#[derive(Debug, Error)]
pub enum LifetimeError {
    #[error("invalid duration: {0}")]
    Parse(#[from] humantime::DurationError),

    #[error("duration out of range")]
    OutOfRange,

    #[error("duration must be positive")]
    NotPositive,
}

/// Authentication settings shared by every session operation.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Symmetric signing secret.
    pub secret: String,
    /// Time between `iat` and `exp` for issued and renewed tokens.
    pub token_lifetime: Duration,
    /// Value of the `iss` claim.
    pub issuer: String,
    /// bcrypt cost for newly hashed passwords.
    pub hash_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: INSECURE_DEV_SECRET.to_string(),
            token_lifetime: default_token_lifetime(),
            issuer: DEFAULT_ISSUER.to_string(),
            hash_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl AuthConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                     | Default                          |
    /// |------------------------------|----------------------------------|
    /// | `JWT_SECRET` / `AUTH_SECRET` | insecure dev secret (warns)      |
    /// | `JWT_EXPIRY`                 | `24h`                            |
    /// | `JWT_ISSUER`                 | `warden-auth`                    |
    /// | `BCRYPT_COST`                | `10`                             |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            secret: resolve_jwt_secret(non_empty("JWT_SECRET").or_else(|| non_empty("AUTH_SECRET"))),
            token_lifetime: resolve_token_lifetime(non_empty("JWT_EXPIRY").as_deref()),
            issuer: non_empty("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            hash_cost: resolve_hash_cost(non_empty("BCRYPT_COST").as_deref()),
        }
    }
}

/// The default token lifetime as a `Duration`.
pub fn default_token_lifetime() -> Duration {
    Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS)
}

/// Use the configured secret, or the insecure development secret with a warning.
pub fn resolve_jwt_secret(configured: Option<String>) -> String {
    match configured {
        Some(secret) => secret,
        None => {
            warn!("JWT_SECRET not set; using insecure development secret");
            INSECURE_DEV_SECRET.to_string()
        }
    }
}

/// Parse a token lifetime such as `24h`, `90m`, `1h30m`, or bare seconds (`3600`).
pub fn parse_token_lifetime(raw: &str) -> Result<Duration, LifetimeError> {
    let raw = raw.trim();
    let std_duration = match raw.parse::<u64>() {
        Ok(secs) => std::time::Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(raw)?,
    };
    let lifetime = Duration::from_std(std_duration).map_err(|_| LifetimeError::OutOfRange)?;
    if lifetime < Duration::seconds(1) {
        return Err(LifetimeError::NotPositive);
    }
    if lifetime > Duration::seconds(MAX_TOKEN_LIFETIME_SECS) {
        return Err(LifetimeError::OutOfRange);
    }
    Ok(lifetime)
}

/// Parse the configured lifetime, falling back to the default when it is
/// absent or unusable.
pub fn resolve_token_lifetime(raw: Option<&str>) -> Duration {
    let Some(raw) = raw else {
        return default_token_lifetime();
    };
    match parse_token_lifetime(raw) {
        Ok(lifetime) => lifetime,
        Err(e) => {
            warn!(value = raw, error = %e, "unparseable JWT_EXPIRY; using default 24h lifetime");
            default_token_lifetime()
        }
    }
}

/// Parse the configured bcrypt cost, falling back to the default.
pub fn resolve_hash_cost(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return DEFAULT_BCRYPT_COST;
    };
    match raw.trim().parse::<u32>() {
        Ok(cost) if is_valid_cost(cost) => cost,
        _ => {
            warn!(value = raw, "invalid BCRYPT_COST; using default {DEFAULT_BCRYPT_COST}");
            DEFAULT_BCRYPT_COST
        }
    }
}
