//! Session flows: login, registration, issuance, validation, and renewal.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::{debug, info, warn};

use super::AuthError;
use super::config::AuthConfig;
use super::jwt::TokenCodec;
use super::password::{hash_password, verify_password};
use crate::clock::Clock;
use crate::models::auth::{Claims, Identity, NewIdentity, Role};
use crate::store::IdentityStore;

/// Authorization scheme prefix expected on incoming headers.
pub const BEARER_PREFIX: &str = "Bearer ";

/// A freshly signed token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of login, registration, and renewal.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub identity: Identity,
}

impl AuthSession {
    fn new(issued: IssuedToken, identity: Identity) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            identity,
        }
    }
}

/// Orchestrates credential checks, token issuance, validation, and renewal.
///
/// Holds only immutable configuration plus shared handles, so one instance is
/// shared across all requests behind an `Arc`.
pub struct SessionService {
    codec: TokenCodec,
    store: Arc<dyn IdentityStore>,
    clock: Arc<dyn Clock>,
    token_lifetime: Duration,
    hash_cost: u32,
    /// Verified against when the email is unknown, so both login failure
    /// paths cost one bcrypt verification at the same cost.
    dummy_hash: Option<String>,
}

impl SessionService {
    pub fn new(config: &AuthConfig, store: Arc<dyn IdentityStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec: TokenCodec::new(config.secret.as_bytes(), config.issuer.clone()),
            store,
            clock,
            token_lifetime: config.token_lifetime,
            hash_cost: config.hash_cost,
            dummy_hash: hash_password("warden-unknown-identity", config.hash_cost).ok(),
        }
    }

    pub fn store(&self) -> &Arc<dyn IdentityStore> {
        &self.store
    }

    pub fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    /// Check an email/password pair and return the matching identity.
    ///
    /// Unknown email and wrong password both yield
    /// [`AuthError::CredentialMismatch`].
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let Some(identity) = self.store.find_by_email(email).await? else {
            if let Some(dummy) = self.dummy_hash.as_deref() {
                let _ = verify_password(password, dummy);
            }
            debug!("login rejected");
            return Err(AuthError::CredentialMismatch);
        };

        if !verify_password(password, &identity.password_hash)? {
            debug!("login rejected");
            return Err(AuthError::CredentialMismatch);
        }

        Ok(identity)
    }

    /// Authenticate with email + password and issue a token.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let identity = self.authenticate(email, password).await?;
        let issued = self.issue(&identity)?;
        info!(user_id = identity.id, "login succeeded");
        Ok(AuthSession::new(issued, identity))
    }

    /// Create a new `user`-role identity and issue its first token.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSession, AuthError> {
        if email.trim().is_empty() || password.is_empty() || name.trim().is_empty() {
            return Err(AuthError::Validation(
                "email, password, and name are required".into(),
            ));
        }

        let password_hash = hash_password(password, self.hash_cost)?;
        let identity = self
            .store
            .create(NewIdentity {
                email: email.to_string(),
                password_hash,
                display_name: name.to_string(),
                role: Role::User,
            })
            .await?;

        let issued = self.issue(&identity)?;
        info!(user_id = identity.id, "registered identity");
        Ok(AuthSession::new(issued, identity))
    }

    /// Sign a token for an already-authenticated identity.
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, AuthError> {
        let issued_at = self.clock.now().trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(self.token_lifetime)
            .ok_or_else(|| AuthError::Internal("token expiry out of range".into()))?;
        let claims = Claims {
            subject_id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            issued_at,
            expires_at,
            issuer: self.codec.issuer().to_string(),
        };
        let token = self.codec.encode(&claims)?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Recover the caller's claims from a raw `Authorization` header value.
    pub fn validate(&self, raw_auth_header: Option<&str>) -> Result<Claims, AuthError> {
        let token = bearer_token(raw_auth_header).ok_or(AuthError::MissingOrMalformedHeader)?;
        self.codec
            .decode(token, self.clock.now())
            .map_err(|e| {
                debug!(reason = %e, "token rejected");
                AuthError::TokenInvalidOrExpired
            })
    }

    /// Exchange a still-valid token for a new one built from live identity state.
    pub async fn refresh(&self, raw_auth_header: Option<&str>) -> Result<AuthSession, AuthError> {
        let claims = self.validate(raw_auth_header)?;

        let identity = self
            .store
            .find_by_id(claims.subject_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = claims.subject_id, "refresh for vanished identity");
                AuthError::IdentityNotFound
            })?;

        let issued = self.issue(&identity)?;
        debug!(user_id = identity.id, "token refreshed");
        Ok(AuthSession::new(issued, identity))
    }
}

/// Extract the token from `Bearer <token>`. Empty tokens count as missing.
pub fn bearer_token(raw_auth_header: Option<&str>) -> Option<&str> {
    raw_auth_header?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
