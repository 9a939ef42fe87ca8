//! Error kinds surfaced by the login flows
//!
//! Every failure that terminates a flow is expressed as a [`LoginError`]. The
//! rendered payload carries a status code, a short text and an optional
//! user-facing message; the `log` detail of internal errors is written to the
//! operator log only.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        log: Option<String>,
    },

    #[error("Database error")]
    Database(String),
}

impl LoginError {
    /// Internal error with no additional operator detail
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            log: None,
        }
    }

    /// Internal error carrying a detail for the operator log
    #[must_use]
    pub fn internal_with(message: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Internal {
            message: message.into(),
            log: Some(detail.to_string()),
        }
    }

    /// Short text for the error class
    #[must_use]
    pub fn text(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "Bad request",
            Self::Forbidden(_) => "Not allowed",
            Self::NotFound(_) => "Not Found",
            Self::Internal { .. } | Self::Database(_) => "Internal error",
        }
    }

    /// Message safe to show to the client, if the kind carries one
    #[must_use]
    pub fn public_message(&self) -> Option<&str> {
        match self {
            Self::BadRequest(msg) | Self::Forbidden(msg) | Self::NotFound(msg) => Some(msg),
            Self::Internal { message, .. } => Some(message),
            Self::Database(_) => None,
        }
    }

    /// Operator-only detail
    #[must_use]
    pub fn log_detail(&self) -> Option<&str> {
        match self {
            Self::Internal { log, .. } => log.as_deref(),
            Self::Database(detail) => Some(detail),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. } | Self::Database(_))
    }
}

impl ResponseError for LoginError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut body = json!({
            "code": status.as_u16(),
            "error": self.text(),
        });
        if let Some(message) = self.public_message() {
            body["message"] = json!(message);
        }
        HttpResponse::build(status).json(body)
    }
}
