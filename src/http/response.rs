//! Mapping handler outcomes to HTTP responses.
//!
//! Every failure is a plain-text body suitable for direct display:
//! - validation problems → 400 with a fixed message
//! - missing records → 404 with an empty body
//! - storage failures → 500 with the underlying error text

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::store::StoreError;

/// A request the service refuses to act on. Nothing is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Malformed Proxy URL")]
    MalformedUrl,

    #[error("Proxy Already Listed")]
    AlreadyListed,

    #[error("Request path doesn't match URL in body")]
    PathMismatch,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] Rejection),

    #[error("proxy not found")]
    NotFound,

    #[error(transparent)]
    Backend(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => self.status().into_response(),
            _ => (self.status(), self.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses() {
        assert_eq!(
            ApiError::from(Rejection::PathMismatch).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(StoreError::Closed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::from(Rejection::MalformedUrl).to_string(),
            "Malformed Proxy URL"
        );
        assert_eq!(
            ApiError::from(Rejection::AlreadyListed).to_string(),
            "Proxy Already Listed"
        );
        assert_eq!(
            ApiError::from(StoreError::Closed).to_string(),
            "proxy store is closed"
        );
    }
}
