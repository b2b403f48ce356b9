//! Per-user permission override domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission::PermissionKey;

/// An exception to a user's role-derived permissions.
///
/// `is_granted = true` grants a permission the role lacks; `false`
/// revokes one the role has. Once `expires_at` has passed the override
/// is ignored by the resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionOverride {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub permission: PermissionKey,
    pub is_granted: bool,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    /// The administrator who created the override.
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl PermissionOverride {
    /// Whether the override is in force at `now`. Expiry is exclusive:
    /// an override expiring exactly at `now` no longer applies.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermissionOverride {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub permission: PermissionKey,
    pub is_granted: bool,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
}
