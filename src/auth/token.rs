//! Stateless session token codec.
//!
//! Signs and verifies a compact claim set with a process-wide secret. The
//! algorithm is pinned to HS256 on both encode and decode; the verifier
//! never trusts an algorithm named inside the token, which closes the
//! classic signature-stripping / algorithm-confusion hole.

use crate::auth::Role;
use crate::error::ApiError;
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Signed claim set carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject account id.
    pub sub: i64,
    pub username: String,
    pub role: Role,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Build a codec around a signing secret. The secret lives for the
    /// process lifetime; rotating it invalidates all outstanding tokens.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Default leeway is 60s; expiry here is exact.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for an account, valid for `ttl_secs` from now.
    pub fn issue(&self, sub: i64, username: &str, role: Role, ttl_secs: i64) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub,
            username: username.to_owned(),
            role,
            iat: now,
            exp: now + ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("token encoding failed: {e}")))
    }

    /// Verify a token and return its claims.
    ///
    /// `TokenExpired` when the embedded expiry has passed; `InvalidToken`
    /// for a bad signature or malformed payload.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::TokenExpired,
                _ => ApiError::InvalidToken,
            })
    }
}

/// Generate a random hex signing secret for processes started without one.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
