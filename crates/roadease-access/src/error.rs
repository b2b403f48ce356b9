//! Access-control error types.

use roadease_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("missing permission {permission}")]
    PermissionDenied { permission: String },

    #[error("user account is inactive")]
    UserInactive,

    #[error("override reason is required")]
    OverrideReasonRequired,

    #[error("override reason must be at least {min} characters")]
    OverrideReasonTooShort { min: usize },

    #[error("override expiry must be in the future")]
    OverrideExpiryInPast,

    #[error("override lifetime exceeds {max_days} days")]
    OverrideTooLong { max_days: i64 },

    #[error("system role '{role}' cannot be deleted")]
    SystemRoleProtected { role: String },

    #[error("role '{role}' is still assigned to {users} user(s)")]
    RoleInUse { role: String, users: u64 },

    #[error("invalid role key '{0}'")]
    InvalidRoleKey(String),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::PermissionDenied { permission } => {
                AppError::PermissionDenied { permission }
            }
            AccessError::UserInactive => AppError::PermissionDenied {
                permission: err.to_string(),
            },
            AccessError::OverrideReasonRequired
            | AccessError::OverrideReasonTooShort { .. }
            | AccessError::OverrideExpiryInPast
            | AccessError::OverrideTooLong { .. }
            | AccessError::SystemRoleProtected { .. }
            | AccessError::RoleInUse { .. }
            | AccessError::InvalidRoleKey(_) => AppError::Validation {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denials_are_forbidden_and_policy_breaches_are_bad_requests() {
        let denied: AppError = AccessError::PermissionDenied {
            permission: "customers.delete".into(),
        }
        .into();
        assert_eq!(denied.status_code(), 403);

        let inactive: AppError = AccessError::UserInactive.into();
        assert_eq!(inactive.status_code(), 403);

        let protected: AppError = AccessError::SystemRoleProtected {
            role: "admin".into(),
        }
        .into();
        assert_eq!(protected.status_code(), 400);
        assert!(protected.public_message().contains("admin"));

        let in_use: AppError = AccessError::RoleInUse {
            role: "body_shop".into(),
            users: 2,
        }
        .into();
        assert_eq!(in_use.status_code(), 400);
        assert!(in_use.public_message().contains("2 user"));
    }
}
