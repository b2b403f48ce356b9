//! Database-specific error types and conversions.

use roadease_core::error::AppError;
use tracing::error;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// A unique index rejected the write.
    #[error("Duplicate {entity}")]
    Duplicate { entity: &'static str },

    /// A stored row could not be mapped onto a domain type.
    #[error("Malformed {entity} row: {message}")]
    Decode { entity: &'static str, message: String },
}

impl DbError {
    pub(crate) fn decode(entity: &'static str, message: impl std::fmt::Display) -> Self {
        DbError::Decode {
            entity,
            message: message.to_string(),
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Surreal(e) => {
                error!(error = %e, "Store request failed");
                AppError::Transport(e.to_string())
            }
            DbError::Migration(msg) => AppError::Transport(msg),
            DbError::Duplicate { entity } => AppError::AlreadyExists {
                entity: entity.to_string(),
            },
            other @ DbError::Decode { .. } => {
                error!(error = %other, "Stored row failed to decode");
                AppError::Internal(other.to_string())
            }
        }
    }
}
