//! SurrealDB implementation of [`RoleRepository`].

use chrono::{DateTime, Utc};
use roadease_core::error::{AppError, AppResult};
use roadease_core::fetch::{expect_created, expect_scoped_write, maybe_single};
use roadease_core::models::role::{CreateRole, Role, RoleStatus, UpdateRole};
use roadease_core::repository::{PaginatedResult, Pagination, RoleRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{parse_uuid, statement_error};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RoleRow {
    organization_id: String,
    role_key: String,
    color: String,
    status: String,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    organization_id: String,
    role_key: String,
    color: String,
    status: String,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<RoleStatus, DbError> {
    match s {
        "Active" => Ok(RoleStatus::Active),
        "Inactive" => Ok(RoleStatus::Inactive),
        other => Err(DbError::decode("role", format!("unknown status: {other}"))),
    }
}

fn status_to_string(s: RoleStatus) -> &'static str {
    match s {
        RoleStatus::Active => "Active",
        RoleStatus::Inactive => "Inactive",
    }
}

impl RoleRow {
    fn into_role(self, id: Uuid) -> Result<Role, DbError> {
        Ok(Role {
            id,
            organization_id: parse_uuid("role", "organization_id", &self.organization_id)?,
            key: self.role_key,
            color: self.color,
            status: parse_status(&self.status)?,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        let id = parse_uuid("role", "id", &self.record_id)?;
        RoleRow {
            organization_id: self.organization_id,
            role_key: self.role_key,
            color: self.color,
            status: self.status,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_role(id)
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> AppResult<Role> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 organization_id = $organization_id, \
                 role_key = $role_key, color = $color, \
                 status = 'Active', is_system = $is_system",
            )
            .bind(("id", id.to_string()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("role_key", input.key))
            .bind(("color", input.color))
            .bind(("is_system", input.is_system))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| statement_error("role", e))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(expect_created(rows, "role")?.into_role(id)?)
    }

    async fn get_by_id(&self, organization_id: Uuid, id: Uuid) -> AppResult<Role> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('role', $id) \
                 WHERE organization_id = $organization_id",
            )
            .bind(("id", id.to_string()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = maybe_single(rows, "role")?
            .ok_or_else(|| AppError::not_found_or_forbidden("role"))?;

        Ok(row.into_role(id)?)
    }

    async fn get_by_key(&self, organization_id: Uuid, key: &str) -> AppResult<Role> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE organization_id = $organization_id AND role_key = $role_key",
            )
            .bind(("organization_id", organization_id.to_string()))
            .bind(("role_key", key.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = maybe_single(rows, "role")?
            .ok_or_else(|| AppError::not_found_or_forbidden("role"))?;

        Ok(row.try_into_role()?)
    }

    async fn update(&self, organization_id: Uuid, id: Uuid, input: UpdateRole) -> AppResult<Role> {
        let mut sets = Vec::new();
        if input.color.is_some() {
            sets.push("color = $color");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $id) SET {} \
             WHERE organization_id = $organization_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("organization_id", organization_id.to_string()));

        if let Some(color) = input.color {
            builder = builder.bind(("color", color));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| statement_error("role", e))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(expect_scoped_write(rows, "role")?.into_role(id)?)
    }

    async fn delete(&self, organization_id: Uuid, id: Uuid) -> AppResult<Role> {
        // Grants go first, while the edge's `in` still resolves to a role
        // whose organization can be checked.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE grants WHERE in = type::record('role', $id) \
                 AND in.organization_id = $organization_id; \
                 DELETE type::record('role', $id) \
                 WHERE organization_id = $organization_id RETURN BEFORE; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| statement_error("role", e))?;

        let rows: Vec<RoleRow> = result.take(1).map_err(DbError::from)?;
        let role = expect_scoped_write(rows, "role")?.into_role(id)?;

        debug!(role_id = %id, key = %role.key, "Role deleted");
        Ok(role)
    }

    async fn list(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResult<Role>> {
        let organization_id_str = organization_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM role \
                 WHERE organization_id = $organization_id GROUP ALL",
            )
            .bind(("organization_id", organization_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE organization_id = $organization_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("organization_id", organization_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
