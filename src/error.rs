use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Input Errors
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("An active entry already exists for this lender and borrower.")]
    DuplicateActiveEntry,

    #[error("Category already exists!")]
    DuplicateCategory,

    // Lookup Errors
    //
    // Covers both "no such record" and "record owned by someone else";
    // callers must not be able to distinguish the two.
    #[error("{what} not found.")]
    NotFound { what: &'static str },

    // Notification Errors (internal only, swallowed at dispatch sites)
    #[error("Notification delivery failed: {0}")]
    NotificationDelivery(String),

    // Auth Errors
    #[error("Unauthorized. Token not provided.")]
    Unauthorized,

    #[error("Unauthorized. Invalid token.")]
    AuthenticationError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Metrics encoding error: {0}")]
    MetricsEncoding(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } | Error::DuplicateActiveEntry | Error::DuplicateCategory => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Unauthorized | Error::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Error::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Error::NotificationDelivery(_)
            | Error::ConfigError(_)
            | Error::Storage(_)
            | Error::MetricsEncoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = Error::validation("lender", "\"lender\" is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "\"lender\" is required");
    }

    #[test]
    fn not_found_message_names_the_record_family() {
        let err = Error::NotFound {
            what: "Lent money record",
        };
        assert_eq!(err.to_string(), "Lent money record not found.");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
