//! Session token issuance and verification.
//!
//! A session token is an HS256 JWT whose `data` claim carries the user's
//! [`Identity`] by value. Tokens are never looked up in storage: a valid
//! signature and a future `exp` are the only requirements for acceptance.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::Identity;

/// Session lifetime: 5 days. Used for both the `exp` claim and the cookie Max-Age.
pub const SESSION_DURATION_SECS: u64 = 5 * 24 * 60 * 60;

/// JWT claims for a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity snapshot taken at authentication time
    pub data: Identity,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// Result of issuing a session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a fresh session token embedding `identity`, valid for [`SESSION_DURATION_SECS`].
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, JwtError> {
        let now = unix_now()?;
        let exp = now + SESSION_DURATION_SECS;

        let claims = SessionClaims {
            data: identity.clone(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(IssuedToken {
            token,
            expires_at: exp,
        })
    }

    /// Validate a session token and return its full claims.
    ///
    /// A token is accepted only while `exp` is strictly in the future.
    pub fn decode_claims(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                ErrorKind::InvalidSignature => JwtError::BadSignature,
                _ => JwtError::Malformed(e),
            })?;

        // The library still accepts `exp == now`
        if claims.exp <= unix_now()? {
            return Err(JwtError::Expired);
        }
        Ok(claims)
    }

    /// Validate a session token and return the embedded identity unchanged.
    pub fn verify(&self, token: &str) -> Result<Identity, JwtError> {
        self.decode_claims(token).map(|claims| claims.data)
    }
}

fn unix_now() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Token is not a well-formed session JWT
    Malformed(jsonwebtoken::errors::Error),
    /// Signature does not match the configured secret
    BadSignature,
    /// Token expiration is in the past
    Expired,
    /// System time error
    TimeError,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Malformed(e) => write!(f, "Malformed token: {}", e),
            JwtError::BadSignature => write!(f, "Invalid token signature"),
            JwtError::Expired => write!(f, "Token has expired"),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}
