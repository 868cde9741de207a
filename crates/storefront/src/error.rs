//! Unified error handling.
//!
//! Provides a unified `AppError` type that logs server errors before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::CommerceError;

/// Application-level error type for the storefront.
///
/// Storage failures reach handlers wrapped in
/// [`CommerceError::Repository`]; missing sign-in is rejected earlier by
/// [`RequireAuth`](crate::middleware::RequireAuth).
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart, checkout, order or review operation failed.
    #[error("{0}")]
    Commerce(#[from] CommerceError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Commerce(err) => match err {
                CommerceError::OutOfStock { .. }
                | CommerceError::AlreadyReviewed { .. }
                | CommerceError::InvalidTransition { .. } => StatusCode::CONFLICT,
                CommerceError::ItemNotFound(_) | CommerceError::OrderNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CommerceError::CheckoutEmptyCart | CommerceError::InvalidAddress(_) => {
                    StatusCode::BAD_REQUEST
                }
                CommerceError::Session(_) | CommerceError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable error code for the response body.
    const fn code(&self) -> &'static str {
        match self {
            Self::Commerce(err) => match err {
                CommerceError::OutOfStock { .. } => "out_of_stock",
                CommerceError::ItemNotFound(_) => "item_not_found",
                CommerceError::AlreadyReviewed { .. } => "already_reviewed",
                CommerceError::InvalidTransition { .. } => "invalid_transition",
                CommerceError::CheckoutEmptyCart => "checkout_empty_cart",
                CommerceError::OrderNotFound(_) => "order_not_found",
                CommerceError::InvalidAddress(_) => "invalid_address",
                CommerceError::Session(_) | CommerceError::Repository(_) => "internal",
            },
            Self::BadRequest(_) => "bad_request",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({ "error": self.code(), "message": message });
        if let Self::Commerce(CommerceError::OutOfStock {
            item_id,
            requested,
            available,
        }) = &self
        {
            body["item_id"] = json!(item_id);
            body["requested"] = json!(requested);
            body["available"] = json!(available);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
