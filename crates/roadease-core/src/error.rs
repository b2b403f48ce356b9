//! Error types for ROAD EASE access control.
//!
//! Variants are split into client-facing errors (4xx) that carry a stable,
//! human-readable message, and server-facing faults (5xx) whose details
//! are logged but never returned to the caller.
//!
//! [`AppError::NotFoundOrForbidden`] deliberately conflates "the row does
//! not exist" with "the row belongs to another organization". Callers must
//! not split it into separate 404 and 403 responses: doing so tells an
//! attacker which identifiers exist in other tenants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Zero rows matched an organization-scoped read or write.
    #[error("{entity} not found or access denied")]
    NotFoundOrForbidden { entity: String },

    /// Malformed input rejected before it reached the store.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The resolver denied the action for the acting user.
    #[error("Permission denied: {permission}")]
    PermissionDenied { permission: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// More than one row matched a filter that must identify at most one.
    #[error("Integrity fault: {matched} {entity} rows matched a single-row filter")]
    IntegrityFault { entity: String, matched: usize },

    /// Underlying store or network failure.
    #[error("Transport fault: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Message returned to callers for every server-side fault.
pub const GENERIC_FAULT_MESSAGE: &str = "An unexpected error occurred";

impl AppError {
    pub fn not_found_or_forbidden(entity: impl Into<String>) -> Self {
        AppError::NotFoundOrForbidden {
            entity: entity.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
        }
    }

    /// HTTP-equivalent status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation { .. } => 400,
            AppError::PermissionDenied { .. } => 403,
            AppError::NotFoundOrForbidden { .. } => 404,
            AppError::AlreadyExists { .. } => 409,
            AppError::Transport(_) => 503,
            AppError::IntegrityFault { .. } | AppError::Internal(_) => 500,
        }
    }

    /// Whether the caller caused the error (4xx) rather than the server.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Message safe to hand back to the caller.
    ///
    /// Server faults collapse to [`GENERIC_FAULT_MESSAGE`]; log the
    /// `Display` form instead.
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            GENERIC_FAULT_MESSAGE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let err = AppError::not_found_or_forbidden("customer");
        assert_eq!(err.status_code(), 404);
        assert!(err.is_client_error());
        assert_eq!(err.public_message(), "customer not found or access denied");

        let err = AppError::validation("reason is required");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.public_message(), "Validation error: reason is required");
    }

    #[test]
    fn server_faults_hide_details() {
        let err = AppError::IntegrityFault {
            entity: "customer".into(),
            matched: 2,
        };
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_client_error());
        assert_eq!(err.public_message(), GENERIC_FAULT_MESSAGE);

        let err = AppError::Transport("connection reset by peer".into());
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.public_message(), GENERIC_FAULT_MESSAGE);
    }
}
