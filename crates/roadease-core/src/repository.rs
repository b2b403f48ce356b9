//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async and organization-scoped: every
//! method that touches tenant data takes an `organization_id` and must
//! include it in the store filter.
//!
//! Update and delete methods follow the write-path contract in
//! [`crate::fetch`]: a filter that matches nothing yields
//! [`AppError::NotFoundOrForbidden`](crate::error::AppError), and a
//! filter that matches several rows yields an integrity fault.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    audit::{AuditLogEntry, CreateAuditLogEntry},
    customer::{CreateCustomer, Customer, UpdateCustomer},
    organization::{CreateOrganization, Organization},
    permission::{Permission, PermissionKey},
    permission_override::{CreatePermissionOverride, PermissionOverride},
    role::{CreateRole, Role, UpdateRole},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Organizations (global scope)
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = AppResult<Organization>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AppResult<Organization>> + Send;
}

// ---------------------------------------------------------------------------
// RBAC
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = AppResult<Role>> + Send;
    fn get_by_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = AppResult<Role>> + Send;
    fn get_by_key(
        &self,
        organization_id: Uuid,
        key: &str,
    ) -> impl Future<Output = AppResult<Role>> + Send;
    fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = AppResult<Role>> + Send;
    /// Delete the role and its grants; returns the deleted record.
    fn delete(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = AppResult<Role>> + Send;
    fn list(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = AppResult<PaginatedResult<Role>>> + Send;
}

pub trait PermissionRepository: Send + Sync {
    /// Idempotently write the permission catalog; returns the entry count.
    fn seed_catalog(&self) -> impl Future<Output = AppResult<u64>> + Send;
    fn get(&self, key: &PermissionKey) -> impl Future<Output = AppResult<Permission>> + Send;
    fn list(&self) -> impl Future<Output = AppResult<Vec<Permission>>> + Send;

    /// Grant a catalog permission to a role (creates a `grants` edge).
    /// Granting twice is a no-op.
    fn grant_to_role(
        &self,
        organization_id: Uuid,
        role_id: Uuid,
        key: &PermissionKey,
    ) -> impl Future<Output = AppResult<()>> + Send;

    fn revoke_from_role(
        &self,
        organization_id: Uuid,
        role_id: Uuid,
        key: &PermissionKey,
    ) -> impl Future<Output = AppResult<()>> + Send;

    /// Keys granted to a role. Unknown keys in the store are rejected.
    fn get_role_permissions(
        &self,
        organization_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = AppResult<Vec<PermissionKey>>> + Send;
}

pub trait PermissionOverrideRepository: Send + Sync {
    /// Store an override, replacing any existing one for the same user
    /// and permission. At most one override per pair exists afterwards.
    fn upsert(
        &self,
        input: CreatePermissionOverride,
    ) -> impl Future<Output = AppResult<PermissionOverride>> + Send;
    /// Remove an override; returns the removed record.
    fn revoke(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = AppResult<PermissionOverride>> + Send;
    /// All overrides for a user, including expired ones.
    fn list_for_user(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = AppResult<Vec<PermissionOverride>>> + Send;
    /// Delete overrides whose `expires_at` is at or before `now`.
    fn purge_expired(
        &self,
        organization_id: Uuid,
        now: DateTime<Utc>,
    ) -> impl Future<Output = AppResult<u64>> + Send;
}

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = AppResult<User>> + Send;
    fn get_by_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = AppResult<User>> + Send;
    fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = AppResult<User>> + Send;
    /// Number of users in the organization currently holding `role_id`.
    fn count_with_role(
        &self,
        organization_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = AppResult<u64>> + Send;
    fn list(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = AppResult<PaginatedResult<User>>> + Send;
}

// ---------------------------------------------------------------------------
// Workshop records
// ---------------------------------------------------------------------------

pub trait CustomerRepository: Send + Sync {
    fn create(&self, input: CreateCustomer) -> impl Future<Output = AppResult<Customer>> + Send;
    fn get_by_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = AppResult<Customer>> + Send;
    fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateCustomer,
    ) -> impl Future<Output = AppResult<Customer>> + Send;
    /// Returns the deleted record.
    fn delete(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = AppResult<Customer>> + Send;
    fn list(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = AppResult<PaginatedResult<Customer>>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only, organization-scoped)
// ---------------------------------------------------------------------------

/// Query filters for audit log entries.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit log entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = AppResult<AuditLogEntry>> + Send;
    /// Newest entries first.
    fn list(
        &self,
        organization_id: Uuid,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = AppResult<PaginatedResult<AuditLogEntry>>> + Send;
}
