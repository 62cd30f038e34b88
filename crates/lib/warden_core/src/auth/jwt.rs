//! JWT token encoding and verification.
//!
//! Tokens are compact HS256 JWS strings. The algorithm is pinned: the
//! signature is checked with HS256 over the raw `header.payload` body before
//! anything inside the token is parsed, and a header asserting any other
//! algorithm is rejected even when the signature would verify.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use thiserror::Error;

use super::AuthError;
use crate::models::auth::Claims;

/// The only algorithm tokens are signed and accepted with.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Why a token failed to decode.
///
/// Only for logs and internal callers; `SessionService::validate` collapses all of
/// these into `AuthError::TokenInvalidOrExpired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed token")]
    MalformedToken,

    #[error("signature invalid")]
    SignatureInvalid,

    #[error("token expired")]
    Expired,

    #[error("malformed claims")]
    MalformedClaims,
}

/// Signs and verifies tokens with a process-wide symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
}

impl TokenCodec {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();

        // Expiry is checked against the caller's clock, not jsonwebtoken's.
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(&[issuer.as_str()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer,
        }
    }

    /// Issuer string written into and required of every token.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Encode claims into a signed token. Deterministic for identical claims.
    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(TOKEN_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify and decode a token, checking expiry against `now`.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, DecodeError> {
        let (body, signature) = split_token(token).ok_or(DecodeError::MalformedToken)?;

        let signature_ok = jsonwebtoken::crypto::verify(
            signature,
            body.as_bytes(),
            &self.decoding_key,
            TOKEN_ALGORITHM,
        )
        .map_err(|_| DecodeError::SignatureInvalid)?;
        if !signature_ok {
            return Err(DecodeError::SignatureInvalid);
        }

        // Unknown algorithm names fail header parsing; treat them like any other mismatch.
        match decode_header(token) {
            Ok(header) if header.alg == TOKEN_ALGORITHM => {}
            _ => return Err(DecodeError::SignatureInvalid),
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| classify(e.kind()))?
            .claims;

        if claims.expires_at <= claims.issued_at {
            return Err(DecodeError::MalformedClaims);
        }
        if claims.expires_at <= now {
            return Err(DecodeError::Expired);
        }
        Ok(claims)
    }
}

/// Split `header.payload.signature` into (`header.payload`, `signature`).
fn split_token(token: &str) -> Option<(&str, &str)> {
    let (body, signature) = token.rsplit_once('.')?;
    let (header, payload) = body.split_once('.')?;
    if header.is_empty() || payload.is_empty() || signature.is_empty() || payload.contains('.') {
        return None;
    }
    Some((body, signature))
}

/// Map a post-signature jsonwebtoken failure onto the decode taxonomy.
fn classify(kind: &ErrorKind) -> DecodeError {
    match kind {
        ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidSignature => DecodeError::SignatureInvalid,
        ErrorKind::InvalidToken => DecodeError::MalformedToken,
        _ => DecodeError::MalformedClaims,
    }
}
