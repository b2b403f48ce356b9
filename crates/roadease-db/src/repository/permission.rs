//! SurrealDB implementation of [`PermissionRepository`].
//!
//! Catalog records use the permission key as their record id, so
//! `permission:⟨customers.delete⟩` is the row for `customers.delete`.
//! Role grants are `role -> grants -> permission` edges.

use chrono::{DateTime, Utc};
use roadease_core::catalog::CATALOG;
use roadease_core::error::{AppError, AppResult};
use roadease_core::fetch::maybe_single;
use roadease_core::models::permission::{Permission, PermissionCategory, PermissionKey};
use roadease_core::repository::PermissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PermissionRow {
    category: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PermissionRowWithId {
    record_id: String,
    category: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct IdRow {
    #[allow(dead_code)]
    record_id: String,
}

impl PermissionRow {
    fn into_permission(self, key: PermissionKey) -> AppResult<Permission> {
        Ok(Permission {
            key,
            category: PermissionCategory::parse(&self.category)?,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

impl PermissionRowWithId {
    fn try_into_permission(self) -> AppResult<Permission> {
        let key = PermissionKey::catalogued(&self.record_id)?;
        PermissionRow {
            category: self.category,
            description: self.description,
            created_at: self.created_at,
        }
        .into_permission(key)
    }
}

/// SurrealDB implementation of the Permission repository.
#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Zero rows here means the role is absent or owned by another
    /// organization; grants are never touched in either case.
    async fn ensure_role(&self, organization_id: Uuid, role_id: Uuid) -> AppResult<()> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM type::record('role', $role_id) \
                 WHERE organization_id = $organization_id",
            )
            .bind(("role_id", role_id.to_string()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        maybe_single(rows, "role")?.ok_or_else(|| AppError::not_found_or_forbidden("role"))?;
        Ok(())
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn seed_catalog(&self) -> AppResult<u64> {
        for entry in CATALOG {
            self.db
                .query(
                    "UPSERT type::record('permission', $key) SET \
                     category = $category, description = $description",
                )
                .bind(("key", entry.key))
                .bind(("category", entry.category.as_str()))
                .bind(("description", entry.description))
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(DbError::from)?;
        }

        info!(entries = CATALOG.len(), "Permission catalog seeded");
        Ok(CATALOG.len() as u64)
    }

    async fn get(&self, key: &PermissionKey) -> AppResult<Permission> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('permission', $key)")
            .bind(("key", key.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = maybe_single(rows, "permission")?
            .ok_or_else(|| AppError::not_found_or_forbidden("permission"))?;

        row.into_permission(key.clone())
    }

    async fn list(&self) -> AppResult<Vec<Permission>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM permission")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let mut permissions = rows
            .into_iter()
            .map(|row| row.try_into_permission())
            .collect::<AppResult<Vec<_>>>()?;
        permissions.sort_by(|a, b| (a.category, &a.key).cmp(&(b.category, &b.key)));

        Ok(permissions)
    }

    async fn grant_to_role(
        &self,
        organization_id: Uuid,
        role_id: Uuid,
        key: &PermissionKey,
    ) -> AppResult<()> {
        let key = PermissionKey::catalogued(key.as_str())?;
        self.ensure_role(organization_id, role_id).await?;

        self.db
            .query(
                "LET $role = type::record('role', $role_id); \
                 LET $permission = type::record('permission', $key); \
                 DELETE grants WHERE in = $role AND out = $permission; \
                 RELATE $role->grants->$permission;",
            )
            .bind(("role_id", role_id.to_string()))
            .bind(("key", key.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn revoke_from_role(
        &self,
        organization_id: Uuid,
        role_id: Uuid,
        key: &PermissionKey,
    ) -> AppResult<()> {
        self.ensure_role(organization_id, role_id).await?;

        self.db
            .query(
                "DELETE grants WHERE \
                 in = type::record('role', $role_id) AND \
                 out = type::record('permission', $key)",
            )
            .bind(("role_id", role_id.to_string()))
            .bind(("key", key.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn get_role_permissions(
        &self,
        organization_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<Vec<PermissionKey>> {
        self.ensure_role(organization_id, role_id).await?;

        let mut result = self
            .db
            .query(
                "SELECT VALUE meta::id(out) FROM grants \
                 WHERE in = type::record('role', $role_id)",
            )
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let raw: Vec<String> = result.take(0).map_err(DbError::from)?;
        let mut keys = raw
            .iter()
            .map(|k| PermissionKey::catalogued(k))
            .collect::<AppResult<Vec<_>>>()?;
        keys.sort();

        Ok(keys)
    }
}
