//! Authentication core.
//!
//! Provides:
//! - PBKDF2-SHA256 password hashing with per-call salts ([`password`])
//! - Stateless HS256 session tokens ([`token`]): validity is reconstructed
//!   from signature and expiry alone, there is no server-side session table
//! - Registration/login orchestration with audit logging ([`service`])
//!
//! ## Design Decisions
//! - One fixed signing algorithm on both ends; the verifier never honors an
//!   algorithm named by the token itself.
//! - Logout is client-side token discard. Rotating the signing secret
//!   invalidates every outstanding token; there is no revocation list.
//! - Login failures are uniform across unknown-identifier and wrong-password
//!   paths, including the hashing work performed, to block enumeration.

pub mod password;
pub mod service;
pub mod token;

pub use service::{AuthService, RequestMeta};
pub use token::{Claims, TokenCodec};

use serde::{Deserialize, Serialize};

/// Account role. Exactly one per account, fixed after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}
