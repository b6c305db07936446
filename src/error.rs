//! Request-level error type.
//!
//! Handlers return `Result<T, AppError>`; every variant maps to one status code
//! and a `{"message": ...}` body. Store and hashing failures are logged here and
//! reported to clients without detail.

use axum::{
    extract::{
        multipart::MultipartError,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::domain::{CartError, PriceError, ProductError};
use crate::store::StoreError;
use crate::uploads::UploadError;

#[derive(Debug, Error)]
pub enum AppError {
    /// No credential, or one the gate cannot read at all.
    #[error("{0}")]
    Unauthenticated(String),

    /// Valid caller, insufficient privilege or ownership. Also used for bad tokens.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("User already exists with this email")]
    Conflict,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            // A taken email is reported as a bad registration request.
            Self::Validation(_) | Self::Conflict => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(inner: StoreError) -> Self {
        match inner {
            StoreError::DuplicateEmail => AppError::Conflict,
            other => AppError::Store(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(inner: AuthError) -> Self {
        match inner {
            AuthError::MissingToken => AppError::Unauthenticated(inner.to_string()),
            AuthError::InvalidToken(_) | AuthError::MalformedSubject => AppError::Forbidden("Invalid token".to_string()),
            AuthError::PasswordHash(e) => AppError::Internal(format!("password hashing: {e}")),
        }
    }
}

impl From<CartError> for AppError {
    fn from(inner: CartError) -> Self {
        match inner {
            CartError::ItemNotFound => AppError::NotFound(inner.to_string()),
            CartError::InvalidQuantity | CartError::QuantityOverflow => AppError::Validation(inner.to_string()),
        }
    }
}

impl From<ProductError> for AppError {
    fn from(inner: ProductError) -> Self { AppError::Forbidden(inner.to_string()) }
}

impl From<PriceError> for AppError {
    fn from(inner: PriceError) -> Self { AppError::Validation(inner.to_string()) }
}

impl From<UploadError> for AppError {
    fn from(inner: UploadError) -> Self {
        match inner {
            UploadError::Io(e) => AppError::Internal(format!("writing upload: {e}")),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(inner: JsonRejection) -> Self { AppError::Validation(inner.body_text()) }
}

impl From<QueryRejection> for AppError {
    fn from(inner: QueryRejection) -> Self { AppError::Validation(inner.body_text()) }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self { AppError::Validation(format!("Malformed form data: {}", inner.body_text())) }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(inner: validator::ValidationErrors) -> Self { AppError::Validation(inner.to_string()) }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Store(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode { err.into_response().status() }

        assert_eq!(get_status(AppError::from(AuthError::MissingToken)), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::from(AuthError::MalformedSubject)), StatusCode::FORBIDDEN);
        assert_eq!(get_status(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(get_status(AppError::from(StoreError::DuplicateEmail)), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(AppError::from(CartError::ItemNotFound)), StatusCode::NOT_FOUND);
        assert_eq!(get_status(AppError::from(CartError::InvalidQuantity)), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(AppError::from(ProductError::NotOwner)), StatusCode::FORBIDDEN);
        assert_eq!(get_status(AppError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::Internal("boom".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::from(StoreError::Corrupt("product 1: bad price".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "message": "Internal server error" }));
    }
}
