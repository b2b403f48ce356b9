//! Role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved key of the administrator role.
pub const ADMIN_ROLE_KEY: &str = "admin";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoleStatus {
    Active,
    Inactive,
}

/// A named bundle of permissions assigned to users of one organization.
///
/// System roles are seeded per organization and cannot be deleted; their
/// grants may still be edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Stable identifier (e.g. `customer_service`).
    pub key: String,
    /// Display color for badges (e.g. `#2563eb`).
    pub color: String,
    pub status: RoleStatus,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Lookup key for the external translation system.
    pub fn translation_key(&self) -> String {
        format!("roles.{}.name", self.key)
    }

    pub fn is_active(&self) -> bool {
        self.status == RoleStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub organization_id: Uuid,
    pub key: String,
    pub color: String,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub color: Option<String>,
    pub status: Option<RoleStatus>,
}
