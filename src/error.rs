//! Error taxonomy for the booking system.
//!
//! Domain errors carry enough context for the HTTP layer to answer without
//! a second round trip (e.g. the remaining availability on an inventory
//! rejection). A declined payment is deliberately *not* part of this
//! taxonomy: it is a normal terminal booking outcome, reported through the
//! booking's status field.
//!
//! The `IntoResponse` impl bridges domain errors to JSON HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error taxonomy for the booking system.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested resource does not exist.
    #[error("{resource} not found")]
    NotFound {
        /// Resource kind ("Event", "Booking")
        resource: &'static str,
    },

    /// Malformed input: empty fields, bad email/phone, quantity out of
    /// bounds, unsupported payment method.
    #[error("{message}")]
    Validation {
        /// Specific violated constraint
        message: String,
    },

    /// Requested quantity exceeds the event's remaining tickets.
    #[error("not enough tickets available ({available} remaining)")]
    InsufficientInventory {
        /// Current availability, returned to the client
        available: u32,
    },

    /// Ticket artifact requested for a booking whose payment is not
    /// confirmed.
    #[error("ticket not available - payment not confirmed")]
    NotConfirmed,

    /// The ticket document could not be rendered.
    #[error("ticket generation failed: {message}")]
    Generation {
        /// Renderer failure detail
        message: String,
    },

    /// Best-effort downstream send failed.
    #[error("notification failed: {message}")]
    Notification {
        /// Transport failure detail
        message: String,
    },

    /// Missing or invalid credentials.
    #[error("{message}")]
    Unauthorized {
        /// User-facing detail
        message: String,
    },

    /// Authenticated, but not allowed to access the resource.
    #[error("{message}")]
    Forbidden {
        /// User-facing detail
        message: String,
    },

    /// Persistence layer failure.
    #[error("database error: {message}")]
    Database {
        /// Driver failure detail (logged, not exposed)
        message: String,
    },

    /// Catch-all for unexpected faults. Never leaks detail to the caller.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Stable machine-readable error code for client handling.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::InsufficientInventory { .. } => "INSUFFICIENT_INVENTORY",
            Self::NotConfirmed => "NOT_CONFIRMED",
            Self::Generation { .. } => "GENERATION_FAILURE",
            Self::Notification { .. } => "NOTIFICATION_FAILURE",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Database { .. } | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status the error maps to.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation { .. }
            | Self::InsufficientInventory { .. }
            | Self::NotConfirmed => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Generation { .. }
            | Self::Notification { .. }
            | Self::Database { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
    /// Remaining availability, present only on inventory rejections so the
    /// client can adjust the quantity without another round trip.
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<u32>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal faults are logged with full detail and answered with a
        // generic message.
        let message = if status.is_server_error() {
            tracing::error!(code = %self.code(), error = %self, "request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let available = match &self {
            Self::InsufficientInventory { available } => Some(*available),
            _ => None,
        };

        let body = ErrorResponse {
            code: self.code(),
            message,
            available,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource: "Record",
            },
            other => Self::Database {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            Error::NotFound { resource: "Event" }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::InsufficientInventory { available: 3 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::NotConfirmed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::Unauthorized {
                message: "missing token".to_string()
            }
            .status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::Generation {
                message: "font".to_string()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn inventory_error_names_the_count() {
        let err = Error::InsufficientInventory { available: 2 };
        assert_eq!(err.to_string(), "not enough tickets available (2 remaining)");
        assert_eq!(err.code(), "INSUFFICIENT_INVENTORY");
    }

    #[test]
    fn internal_errors_share_a_generic_code() {
        let err = Error::Database {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
