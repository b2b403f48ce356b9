//! Access service: context loading and RBAC administration.
//!
//! Operations that act on behalf of a user take the caller's
//! [`UserContext`] explicitly. The organization an operation touches is
//! always the actor's own; callers cannot name another one.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use roadease_core::authz::{Decision, UserContext};
use roadease_core::catalog::{SYSTEM_ROLES, default_grants};
use roadease_core::error::{AppError, AppResult};
use roadease_core::models::audit::{AuditLogEntry, AuditOutcome};
use roadease_core::models::permission::PermissionKey;
use roadease_core::models::permission_override::{CreatePermissionOverride, PermissionOverride};
use roadease_core::models::role::{CreateRole, Role, UpdateRole};
use roadease_core::models::user::{UpdateUser, User, UserStatus};
use roadease_core::repository::{
    AuditLogFilter, AuditLogRepository, PaginatedResult, Pagination, PermissionOverrideRepository,
    PermissionRepository, RoleRepository, UserRepository,
};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::{self, AuditEvent, snapshot};
use crate::config::AccessConfig;
use crate::error::AccessError;

/// Actor recorded for operations the system performs on its own behalf.
pub const SYSTEM_ACTOR: Uuid = Uuid::nil();

/// Input for creating or replacing a permission override.
#[derive(Debug, Clone)]
pub struct SetOverride {
    pub user_id: Uuid,
    pub permission: String,
    pub is_granted: bool,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Access-control service.
///
/// Generic over repository implementations so that the access layer
/// has no dependency on the database crate.
pub struct AccessService<U, R, P, O, A>
where
    U: UserRepository,
    R: RoleRepository,
    P: PermissionRepository,
    O: PermissionOverrideRepository,
    A: AuditLogRepository,
{
    user_repo: U,
    role_repo: R,
    permission_repo: P,
    override_repo: O,
    audit_repo: A,
    config: AccessConfig,
}

impl<U, R, P, O, A> AccessService<U, R, P, O, A>
where
    U: UserRepository,
    R: RoleRepository,
    P: PermissionRepository,
    O: PermissionOverrideRepository,
    A: AuditLogRepository,
{
    pub fn new(
        user_repo: U,
        role_repo: R,
        permission_repo: P,
        override_repo: O,
        audit_repo: A,
        config: AccessConfig,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            permission_repo,
            override_repo,
            audit_repo,
            config,
        }
    }

    // -------------------------------------------------------------------
    // Context
    // -------------------------------------------------------------------

    /// Build the immutable authorization snapshot for one user.
    ///
    /// Inactive users are rejected outright. An inactive role still
    /// yields a context; it simply grants nothing.
    pub async fn load_context(&self, organization_id: Uuid, user_id: Uuid) -> AppResult<UserContext> {
        let user = self.user_repo.get_by_id(organization_id, user_id).await?;
        if user.status != UserStatus::Active {
            return Err(AccessError::UserInactive.into());
        }

        let role = self.role_repo.get_by_id(organization_id, user.role_id).await?;
        let grants = self
            .permission_repo
            .get_role_permissions(organization_id, role.id)
            .await?;
        let overrides = self
            .override_repo
            .list_for_user(organization_id, user_id)
            .await?;

        debug!(
            %user_id,
            role = %role.key,
            grants = grants.len(),
            overrides = overrides.len(),
            "User context loaded"
        );

        Ok(UserContext::new(
            user_id,
            organization_id,
            role.key.clone(),
            role.is_active(),
            grants,
            overrides,
        ))
    }

    /// Resolve a raw permission identifier for `actor` right now.
    pub fn check(&self, actor: &UserContext, permission: &str) -> AppResult<Decision> {
        let key = PermissionKey::catalogued(permission)?;
        Ok(actor.decide(&key, Utc::now()))
    }

    /// Fail with a permission error unless `actor` holds `permission`.
    /// Read paths use this; writes go through the audited guard.
    pub fn require(&self, actor: &UserContext, permission: &str) -> AppResult<()> {
        if actor.is_allowed_str(permission, Utc::now()) {
            Ok(())
        } else {
            Err(AccessError::PermissionDenied {
                permission: permission.to_string(),
            }
            .into())
        }
    }

    /// Resolved permission set of another user in the actor's organization.
    pub async fn effective_permissions(
        &self,
        actor: &UserContext,
        user_id: Uuid,
    ) -> AppResult<BTreeSet<PermissionKey>> {
        self.require(actor, "permissions.view")?;
        let ctx = self.load_context(actor.organization_id, user_id).await?;
        Ok(ctx.effective_permissions(Utc::now()))
    }

    // -------------------------------------------------------------------
    // Organization bootstrap
    // -------------------------------------------------------------------

    /// Create the system roles with their default grants. Roles that
    /// already exist are left as they are, so this can be re-run.
    pub async fn bootstrap_organization(&self, organization_id: Uuid) -> AppResult<Vec<Role>> {
        let mut roles = Vec::with_capacity(SYSTEM_ROLES.len());
        let mut created = Vec::new();

        for &(key, color) in SYSTEM_ROLES {
            match self.role_repo.get_by_key(organization_id, key).await {
                Ok(existing) => {
                    debug!(%organization_id, role = key, "System role already present");
                    roles.push(existing);
                    continue;
                }
                Err(AppError::NotFoundOrForbidden { .. }) => {}
                Err(e) => return Err(e),
            }

            let role = self
                .role_repo
                .create(CreateRole {
                    organization_id,
                    key: key.to_string(),
                    color: color.to_string(),
                    is_system: true,
                })
                .await?;

            for raw in default_grants(key) {
                let permission = PermissionKey::catalogued(raw)?;
                self.permission_repo
                    .grant_to_role(organization_id, role.id, &permission)
                    .await?;
            }
            created.push(role.key.clone());
            roles.push(role);
        }

        if !created.is_empty() {
            let system = UserContext::new(SYSTEM_ACTOR, organization_id, "system", true, [], []);
            let event = AuditEvent::new("organization.bootstrap", "organization").on(organization_id);
            audit::record(
                &self.audit_repo,
                &system,
                &event,
                AuditOutcome::Success,
                json!({ "created_roles": created }),
            )
            .await?;
        }

        info!(
            %organization_id,
            roles = roles.len(),
            created = created.len(),
            "Organization bootstrapped"
        );
        Ok(roles)
    }

    // -------------------------------------------------------------------
    // Roles
    // -------------------------------------------------------------------

    pub async fn list_roles(
        &self,
        actor: &UserContext,
        pagination: Pagination,
    ) -> AppResult<PaginatedResult<Role>> {
        self.require(actor, "roles.view")?;
        self.role_repo
            .list(actor.organization_id, self.clamp(pagination))
            .await
    }

    pub async fn create_role(&self, actor: &UserContext, key: &str, color: &str) -> AppResult<Role> {
        let event = AuditEvent::new("role.create", "role");
        audit::authorize(&self.audit_repo, actor, "roles.create", &event, Utc::now()).await?;

        let result = if is_valid_role_key(key) {
            self.role_repo
                .create(CreateRole {
                    organization_id: actor.organization_id,
                    key: key.to_string(),
                    color: color.to_string(),
                    is_system: false,
                })
                .await
        } else {
            Err(AccessError::InvalidRoleKey(key.to_string()).into())
        };

        let role = audit::settle(&self.audit_repo, actor, &event, result, |role| {
            json!({ "after": snapshot(role) })
        })
        .await?;
        info!(role_id = %role.id, role = %role.key, "Role created");
        Ok(role)
    }

    pub async fn update_role(
        &self,
        actor: &UserContext,
        role_id: Uuid,
        input: UpdateRole,
    ) -> AppResult<Role> {
        let event = AuditEvent::new("role.update", "role").on(role_id);
        audit::authorize(&self.audit_repo, actor, "roles.update", &event, Utc::now()).await?;

        let result = self
            .update_scoped_role(actor.organization_id, role_id, input)
            .await;

        let (_, after) = audit::settle(
            &self.audit_repo,
            actor,
            &event,
            result,
            |(before, after)| json!({ "before": snapshot(before), "after": snapshot(after) }),
        )
        .await?;
        Ok(after)
    }

    /// Delete a custom role. System roles and roles still held by a user
    /// are refused.
    pub async fn delete_role(&self, actor: &UserContext, role_id: Uuid) -> AppResult<Role> {
        let event = AuditEvent::new("role.delete", "role").on(role_id);
        audit::authorize(&self.audit_repo, actor, "roles.delete", &event, Utc::now()).await?;

        let result = self.delete_custom_role(actor.organization_id, role_id).await;
        audit::settle(&self.audit_repo, actor, &event, result, |role| {
            json!({ "before": snapshot(role) })
        })
        .await
    }

    pub async fn role_permissions(
        &self,
        actor: &UserContext,
        role_id: Uuid,
    ) -> AppResult<Vec<PermissionKey>> {
        self.require(actor, "roles.view")?;
        self.permission_repo
            .get_role_permissions(actor.organization_id, role_id)
            .await
    }

    pub async fn grant_permission(
        &self,
        actor: &UserContext,
        role_id: Uuid,
        permission: &str,
    ) -> AppResult<()> {
        let event = AuditEvent::new("role.grant", "role").on(role_id);
        audit::authorize(&self.audit_repo, actor, "permissions.manage", &event, Utc::now())
            .await?;

        let result = match PermissionKey::catalogued(permission) {
            Ok(key) => self
                .permission_repo
                .grant_to_role(actor.organization_id, role_id, &key)
                .await,
            Err(e) => Err(e),
        };
        audit::settle(&self.audit_repo, actor, &event, result, |_| {
            json!({ "permission": permission })
        })
        .await
    }

    pub async fn revoke_permission(
        &self,
        actor: &UserContext,
        role_id: Uuid,
        permission: &str,
    ) -> AppResult<()> {
        let event = AuditEvent::new("role.revoke", "role").on(role_id);
        audit::authorize(&self.audit_repo, actor, "permissions.manage", &event, Utc::now())
            .await?;

        let result = match PermissionKey::catalogued(permission) {
            Ok(key) => self
                .permission_repo
                .revoke_from_role(actor.organization_id, role_id, &key)
                .await,
            Err(e) => Err(e),
        };
        audit::settle(&self.audit_repo, actor, &event, result, |_| {
            json!({ "permission": permission })
        })
        .await
    }

    // -------------------------------------------------------------------
    // Overrides
    // -------------------------------------------------------------------

    /// Create an override, replacing any existing one for the same user
    /// and permission.
    pub async fn set_override(
        &self,
        actor: &UserContext,
        input: SetOverride,
    ) -> AppResult<PermissionOverride> {
        let now = Utc::now();
        let event = AuditEvent::new("override.set", "user").on(input.user_id);
        audit::authorize(&self.audit_repo, actor, "permissions.manage", &event, now).await?;

        let result = self.store_override(actor, input, now).await;

        let stored = audit::settle(&self.audit_repo, actor, &event, result, |o| {
            json!({ "after": snapshot(o) })
        })
        .await?;
        info!(
            override_id = %stored.id,
            user_id = %stored.user_id,
            permission = %stored.permission,
            is_granted = stored.is_granted,
            "Permission override set"
        );
        Ok(stored)
    }

    pub async fn revoke_override(
        &self,
        actor: &UserContext,
        override_id: Uuid,
    ) -> AppResult<PermissionOverride> {
        let event = AuditEvent::new("override.revoke", "permission_override").on(override_id);
        audit::authorize(&self.audit_repo, actor, "permissions.manage", &event, Utc::now())
            .await?;

        let result = self
            .override_repo
            .revoke(actor.organization_id, override_id)
            .await;
        audit::settle(&self.audit_repo, actor, &event, result, |o| {
            json!({ "before": snapshot(o) })
        })
        .await
    }

    pub async fn list_overrides(
        &self,
        actor: &UserContext,
        user_id: Uuid,
    ) -> AppResult<Vec<PermissionOverride>> {
        self.require(actor, "permissions.view")?;
        self.override_repo
            .list_for_user(actor.organization_id, user_id)
            .await
    }

    /// Remove overrides that can no longer take effect.
    pub async fn purge_expired_overrides(&self, actor: &UserContext) -> AppResult<u64> {
        let now = Utc::now();
        let event = AuditEvent::new("override.purge", "permission_override");
        audit::authorize(&self.audit_repo, actor, "permissions.manage", &event, now).await?;

        let result = self
            .override_repo
            .purge_expired(actor.organization_id, now)
            .await;
        audit::settle(&self.audit_repo, actor, &event, result, |purged| {
            json!({ "purged": purged })
        })
        .await
    }

    // -------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------

    /// Move a user to another role of the same organization.
    pub async fn assign_role(
        &self,
        actor: &UserContext,
        user_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<User> {
        let event = AuditEvent::new("user.assign_role", "user").on(user_id);
        audit::authorize(&self.audit_repo, actor, "users.update", &event, Utc::now()).await?;

        let result = self
            .move_user(actor.organization_id, user_id, role_id)
            .await;

        let (_, _, user) = audit::settle(
            &self.audit_repo,
            actor,
            &event,
            result,
            |(previous_role_id, role, _)| {
                json!({
                    "before": { "role_id": previous_role_id },
                    "after": { "role_id": role.id, "role": role.key },
                })
            },
        )
        .await?;
        Ok(user)
    }

    // -------------------------------------------------------------------
    // Audit log
    // -------------------------------------------------------------------

    pub async fn list_audit_log(
        &self,
        actor: &UserContext,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResult<AuditLogEntry>> {
        self.require(actor, "audit_logs.view")?;
        self.audit_repo
            .list(actor.organization_id, filter, self.clamp(pagination))
            .await
    }

    // -------------------------------------------------------------------
    // Write steps
    //
    // Run after the permission check. Their client errors are recorded as
    // failures by `audit::settle`.
    // -------------------------------------------------------------------

    async fn update_scoped_role(
        &self,
        organization_id: Uuid,
        role_id: Uuid,
        input: UpdateRole,
    ) -> AppResult<(Role, Role)> {
        let before = self.role_repo.get_by_id(organization_id, role_id).await?;
        let after = self.role_repo.update(organization_id, role_id, input).await?;
        Ok((before, after))
    }

    async fn delete_custom_role(&self, organization_id: Uuid, role_id: Uuid) -> AppResult<Role> {
        let role = self.role_repo.get_by_id(organization_id, role_id).await?;
        if role.is_system {
            return Err(AccessError::SystemRoleProtected { role: role.key }.into());
        }

        let users = self
            .user_repo
            .count_with_role(organization_id, role_id)
            .await?;
        if users > 0 {
            return Err(AccessError::RoleInUse {
                role: role.key,
                users,
            }
            .into());
        }

        self.role_repo.delete(organization_id, role_id).await
    }

    async fn store_override(
        &self,
        actor: &UserContext,
        input: SetOverride,
        now: DateTime<Utc>,
    ) -> AppResult<PermissionOverride> {
        let permission = PermissionKey::catalogued(&input.permission)?;
        let reason = self.validate_reason(&input.reason)?;
        self.validate_expiry(input.expires_at, now)?;

        // Target must live in the actor's organization.
        self.user_repo
            .get_by_id(actor.organization_id, input.user_id)
            .await?;

        self.override_repo
            .upsert(CreatePermissionOverride {
                organization_id: actor.organization_id,
                user_id: input.user_id,
                permission,
                is_granted: input.is_granted,
                reason,
                expires_at: input.expires_at,
                created_by: Some(actor.user_id),
            })
            .await
    }

    /// Returns the previous role id, the new role and the updated user.
    async fn move_user(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<(Uuid, Role, User)> {
        let role = self.role_repo.get_by_id(organization_id, role_id).await?;
        let before = self.user_repo.get_by_id(organization_id, user_id).await?;

        let user = self
            .user_repo
            .update(
                organization_id,
                user_id,
                UpdateUser {
                    role_id: Some(role.id),
                    ..Default::default()
                },
            )
            .await?;
        Ok((before.role_id, role, user))
    }

    // -------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------

    fn clamp(&self, pagination: Pagination) -> Pagination {
        Pagination {
            offset: pagination.offset,
            limit: pagination.limit.min(self.config.max_page_limit),
        }
    }

    fn validate_reason(&self, reason: &str) -> AppResult<String> {
        let reason = reason.trim();
        if !self.config.require_override_reason {
            return Ok(reason.to_string());
        }
        if reason.is_empty() {
            return Err(AccessError::OverrideReasonRequired.into());
        }
        let min = self.config.min_override_reason_length;
        if reason.chars().count() < min {
            return Err(AccessError::OverrideReasonTooShort { min }.into());
        }
        Ok(reason.to_string())
    }

    fn validate_expiry(&self, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> AppResult<()> {
        let Some(expires_at) = expires_at else {
            return Ok(());
        };
        if expires_at <= now {
            return Err(AccessError::OverrideExpiryInPast.into());
        }
        let Some(max_days) = self.config.max_override_lifetime_days else {
            return Ok(());
        };
        // A limit too large to represent cannot be exceeded.
        let latest = Duration::try_days(max_days).and_then(|d| now.checked_add_signed(d));
        match latest {
            Some(latest) if expires_at > latest => {
                Err(AccessError::OverrideTooLong { max_days }.into())
            }
            _ => Ok(()),
        }
    }
}

/// Role keys follow the permission segment rules: lowercase ASCII and
/// underscores, starting with a letter.
fn is_valid_role_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_key_rules() {
        assert!(is_valid_role_key("body_shop"));
        assert!(!is_valid_role_key(""));
        assert!(!is_valid_role_key("_lead"));
        assert!(!is_valid_role_key("Body Shop"));
        assert!(!is_valid_role_key("tech2"));
    }
}
