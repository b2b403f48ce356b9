//! SurrealDB implementation of [`PermissionOverrideRepository`].

use chrono::{DateTime, Utc};
use roadease_core::error::AppResult;
use roadease_core::fetch::{expect_created, expect_scoped_write};
use roadease_core::models::permission::PermissionKey;
use roadease_core::models::permission_override::{CreatePermissionOverride, PermissionOverride};
use roadease_core::repository::PermissionOverrideRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::{parse_uuid, statement_error};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct OverrideRow {
    organization_id: String,
    user_id: String,
    permission_key: String,
    is_granted: bool,
    reason: String,
    expires_at: Option<DateTime<Utc>>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct OverrideRowWithId {
    record_id: String,
    organization_id: String,
    user_id: String,
    permission_key: String,
    is_granted: bool,
    reason: String,
    expires_at: Option<DateTime<Utc>>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl OverrideRow {
    fn into_override(self, id: Uuid) -> AppResult<PermissionOverride> {
        let created_by = self
            .created_by
            .as_deref()
            .map(|raw| parse_uuid("permission_override", "created_by", raw))
            .transpose()?;

        Ok(PermissionOverride {
            id,
            organization_id: parse_uuid(
                "permission_override",
                "organization_id",
                &self.organization_id,
            )?,
            user_id: parse_uuid("permission_override", "user_id", &self.user_id)?,
            permission: PermissionKey::catalogued(&self.permission_key)?,
            is_granted: self.is_granted,
            reason: self.reason,
            expires_at: self.expires_at,
            created_by,
            created_at: self.created_at,
        })
    }
}

impl OverrideRowWithId {
    fn try_into_override(self) -> AppResult<PermissionOverride> {
        let id = parse_uuid("permission_override", "id", &self.record_id)?;
        OverrideRow {
            organization_id: self.organization_id,
            user_id: self.user_id,
            permission_key: self.permission_key,
            is_granted: self.is_granted,
            reason: self.reason,
            expires_at: self.expires_at,
            created_by: self.created_by,
            created_at: self.created_at,
        }
        .into_override(id)
    }
}

/// SurrealDB implementation of the PermissionOverride repository.
#[derive(Clone)]
pub struct SurrealPermissionOverrideRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionOverrideRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermissionOverrideRepository for SurrealPermissionOverrideRepository<C> {
    async fn upsert(&self, input: CreatePermissionOverride) -> AppResult<PermissionOverride> {
        let key = PermissionKey::catalogued(input.permission.as_str())?;
        let id = Uuid::new_v4();

        // Statement 0 clears the previous override for the pair so the
        // unique index never sees two rows. Both run in one transaction:
        // if the CREATE fails the previous override must survive.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE permission_override WHERE \
                 organization_id = $organization_id AND \
                 user_id = $user_id AND permission_key = $permission_key; \
                 CREATE type::record('permission_override', $id) SET \
                 organization_id = $organization_id, \
                 user_id = $user_id, \
                 permission_key = $permission_key, \
                 is_granted = $is_granted, \
                 reason = $reason, \
                 expires_at = $expires_at, \
                 created_by = $created_by; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("permission_key", key.to_string()))
            .bind(("is_granted", input.is_granted))
            .bind(("reason", input.reason))
            .bind(("expires_at", input.expires_at))
            .bind(("created_by", input.created_by.map(|u| u.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| statement_error("permission_override", e))?;

        let rows: Vec<OverrideRow> = result.take(1).map_err(DbError::from)?;
        expect_created(rows, "permission_override")?.into_override(id)
    }

    async fn revoke(&self, organization_id: Uuid, id: Uuid) -> AppResult<PermissionOverride> {
        let mut result = self
            .db
            .query(
                "DELETE type::record('permission_override', $id) \
                 WHERE organization_id = $organization_id RETURN BEFORE",
            )
            .bind(("id", id.to_string()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OverrideRow> = result.take(0).map_err(DbError::from)?;
        expect_scoped_write(rows, "permission_override")?.into_override(id)
    }

    async fn list_for_user(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<PermissionOverride>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission_override \
                 WHERE organization_id = $organization_id AND user_id = $user_id \
                 ORDER BY created_at ASC",
            )
            .bind(("organization_id", organization_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OverrideRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_override())
            .collect()
    }

    async fn purge_expired(&self, organization_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let mut result = self
            .db
            .query(
                "DELETE permission_override WHERE \
                 organization_id = $organization_id AND \
                 expires_at != NONE AND expires_at <= $now \
                 RETURN BEFORE",
            )
            .bind(("organization_id", organization_id.to_string()))
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OverrideRow> = result.take(0).map_err(DbError::from)?;
        let purged = rows.len() as u64;
        if purged > 0 {
            info!(%organization_id, purged, "Expired permission overrides purged");
        }

        Ok(purged)
    }
}
