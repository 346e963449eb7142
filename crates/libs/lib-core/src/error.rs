//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`]. It follows the
//! `thiserror` pattern and maps every variant onto an HTTP response.
//!
//! ## Error Categories
//!
//! - [`UpgradeRequired`](AppError::UpgradeRequired) → 426, plain text `Expected websocket`.
//!   The socket is never opened.
//! - [`NotFound`](AppError::NotFound) → 404, plain text `Not Found`.
//! - [`Internal`](AppError::Internal) → 500, JSON `{error, message}`.
//! - [`Config`](AppError::Config) → startup only; 500 if it ever reaches a handler.
//!
//! Malformed socket frames are not represented here. They are dropped inside the
//! session that received them and never surface as an HTTP error.
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{AppError, Result};
//!
//! fn require_upgrade(header: Option<&str>) -> Result<()> {
//!     match header {
//!         Some(value) if value.eq_ignore_ascii_case("websocket") => Ok(()),
//!         _ => Err(AppError::UpgradeRequired),
//!     }
//! }
//!
//! assert!(require_upgrade(Some("WebSocket")).is_ok());
//! assert!(require_upgrade(None).is_err());
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error during startup or environment loading.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A request to the socket endpoint without `Upgrade: websocket`.
    #[error("Expected websocket")]
    UpgradeRequired,

    /// No route matched the request.
    #[error("Not Found")]
    NotFound,

    /// Unexpected failure while serving a request.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UpgradeRequired => StatusCode::UPGRADE_REQUIRED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body.
    pub fn user_message(&self) -> String {
        match self {
            AppError::UpgradeRequired | AppError::NotFound => self.to_string(),
            AppError::Internal(msg) => msg.clone(),
            AppError::Config(_) => "Server is misconfigured".to_string(),
        }
    }
}

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match status {
            StatusCode::UPGRADE_REQUIRED | StatusCode::NOT_FOUND => {
                tracing::debug!("Client error: {}", self);
                (status, self.user_message()).into_response()
            }
            _ => {
                tracing::error!("Server error: {}", self);
                let body = Json(json!({
                    "error": status.canonical_reason().unwrap_or("Internal Server Error"),
                    "message": self.user_message(),
                }));
                (status, body).into_response()
            }
        }
    }
}
