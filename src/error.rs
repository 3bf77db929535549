//! Request-boundary error taxonomy.
//!
//! Every handler converts failures into one of these variants; nothing
//! propagates past the HTTP boundary. Internal errors keep their detail in
//! the server log and surface a generic message to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input. User-correctable.
    #[error("{0}")]
    Validation(String),

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    /// Username or email collides with an existing account.
    #[error("Username or email is already taken")]
    DuplicateIdentity,

    /// Deliberately uninformative about which field was wrong.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No credentials presented on a protected route.
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// Role requirement not met.
    #[error("Access denied")]
    Forbidden,

    /// An admin acting on their own account where that is blocked.
    #[error("Cannot perform this action on your own account")]
    SelfActionForbidden,

    /// Also masks ownership denial: "exists but not yours" and "does not
    /// exist" must be indistinguishable to the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::WeakPassword(_) | Self::DuplicateIdentity => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredentials
            | Self::Unauthorized
            | Self::InvalidToken
            | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::SelfActionForbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            tracing::error!(error = %err, "request failed");
        }
        (
            self.status(),
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::WeakPassword(6).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::DuplicateIdentity.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::SelfActionForbidden.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::NotFound("User").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_found_masks_ownership() {
        // Same message whether the row is missing or owned by someone else.
        assert_eq!(ApiError::NotFound("Data").to_string(), "Data not found");
    }

    #[test]
    fn internal_error_hides_detail() {
        let err = ApiError::Internal(anyhow::anyhow!("connection reset by peer"));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
