//! Error taxonomy for Homefront
//!
//! Every operation validates inputs and ownership locally before touching
//! the store; store failures propagate unchanged to the HTTP boundary,
//! which maps each variant to a status code and the uniform
//! `{success: false, message, error?}` envelope.

use hyper::StatusCode;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, HomefrontError>;

#[derive(Debug, Error)]
pub enum HomefrontError {
    /// Missing or out-of-range required fields (400)
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid bearer token (401)
    #[error("{0}")]
    Authentication(String),

    /// Role or ownership mismatch (403)
    #[error("{0}")]
    Authorization(String),

    /// Entity id does not resolve (404)
    #[error("{0}")]
    NotFound(String),

    /// Underlying store failure (500)
    #[error("{0}")]
    Database(String),

    /// Malformed request body or transport problem (400)
    #[error("{0}")]
    Http(String),
}

impl HomefrontError {
    /// HTTP status code this error maps to at the boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            HomefrontError::Validation(_) | HomefrontError::Http(_) => StatusCode::BAD_REQUEST,
            HomefrontError::Authentication(_) => StatusCode::UNAUTHORIZED,
            HomefrontError::Authorization(_) => StatusCode::FORBIDDEN,
            HomefrontError::NotFound(_) => StatusCode::NOT_FOUND,
            HomefrontError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for HomefrontError {
    fn from(e: std::io::Error) -> Self {
        HomefrontError::Database(format!("I/O error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            HomefrontError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HomefrontError::Authentication("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            HomefrontError::Authorization("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            HomefrontError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HomefrontError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
