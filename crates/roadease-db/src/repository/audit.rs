//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! The `audit_log` table denies UPDATE and DELETE at the schema level;
//! this repository only ever issues CREATE and SELECT.

use chrono::{DateTime, Utc};
use roadease_core::error::AppResult;
use roadease_core::fetch::expect_created;
use roadease_core::models::audit::{AuditLogEntry, AuditOutcome, CreateAuditLogEntry};
use roadease_core::repository::{
    AuditLogFilter, AuditLogRepository, PaginatedResult, Pagination,
};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_uuid, statement_error};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AuditRow {
    organization_id: String,
    actor_id: String,
    action: String,
    resource_type: String,
    resource_id: Option<String>,
    outcome: String,
    changes: serde_json::Value,
    ip_address: Option<String>,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    organization_id: String,
    actor_id: String,
    action: String,
    resource_type: String,
    resource_id: Option<String>,
    outcome: String,
    changes: serde_json::Value,
    ip_address: Option<String>,
    timestamp: DateTime<Utc>,
}

fn parse_outcome(s: &str) -> Result<AuditOutcome, DbError> {
    match s {
        "Success" => Ok(AuditOutcome::Success),
        "Failure" => Ok(AuditOutcome::Failure),
        "Denied" => Ok(AuditOutcome::Denied),
        other => Err(DbError::decode("audit_log", format!("unknown outcome: {other}"))),
    }
}

fn outcome_to_string(o: AuditOutcome) -> &'static str {
    match o {
        AuditOutcome::Success => "Success",
        AuditOutcome::Failure => "Failure",
        AuditOutcome::Denied => "Denied",
    }
}

impl AuditRow {
    fn into_entry(self, id: Uuid) -> Result<AuditLogEntry, DbError> {
        Ok(AuditLogEntry {
            id,
            organization_id: parse_uuid("audit_log", "organization_id", &self.organization_id)?,
            actor_id: parse_uuid("audit_log", "actor_id", &self.actor_id)?,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            outcome: parse_outcome(&self.outcome)?,
            changes: self.changes,
            ip_address: self.ip_address,
            timestamp: self.timestamp,
        })
    }
}

impl AuditRowWithId {
    fn try_into_entry(self) -> Result<AuditLogEntry, DbError> {
        let id = parse_uuid("audit_log", "id", &self.record_id)?;
        AuditRow {
            organization_id: self.organization_id,
            actor_id: self.actor_id,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            outcome: self.outcome,
            changes: self.changes,
            ip_address: self.ip_address,
            timestamp: self.timestamp,
        }
        .into_entry(id)
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the AuditLog repository.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        let id = Uuid::new_v4();
        let changes = match input.changes {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            changes @ serde_json::Value::Object(_) => changes,
            other => serde_json::json!({ "value": other }),
        };

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 organization_id = $organization_id, \
                 actor_id = $actor_id, action = $action, \
                 resource_type = $resource_type, \
                 resource_id = $resource_id, outcome = $outcome, \
                 changes = $changes, ip_address = $ip_address",
            )
            .bind(("id", id.to_string()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("actor_id", input.actor_id.to_string()))
            .bind(("action", input.action))
            .bind(("resource_type", input.resource_type))
            .bind(("resource_id", input.resource_id))
            .bind(("outcome", outcome_to_string(input.outcome)))
            .bind(("changes", changes))
            .bind(("ip_address", input.ip_address))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| statement_error("audit_log", e))?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        Ok(expect_created(rows, "audit_log")?.into_entry(id)?)
    }

    async fn list(
        &self,
        organization_id: Uuid,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResult<AuditLogEntry>> {
        let mut conditions = vec!["organization_id = $organization_id"];
        if filter.actor_id.is_some() {
            conditions.push("actor_id = $actor_id");
        }
        if filter.action.is_some() {
            conditions.push("action = $action");
        }
        if filter.resource_type.is_some() {
            conditions.push("resource_type = $resource_type");
        }
        if filter.from.is_some() {
            conditions.push("timestamp >= $from");
        }
        if filter.to.is_some() {
            conditions.push("timestamp < $to");
        }
        let where_clause = conditions.join(" AND ");

        let query = format!(
            "SELECT count() AS total FROM audit_log WHERE {where_clause} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM audit_log \
             WHERE {where_clause} \
             ORDER BY timestamp DESC \
             LIMIT $limit START $offset;"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("organization_id", organization_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        if let Some(actor_id) = filter.actor_id {
            builder = builder.bind(("actor_id", actor_id.to_string()));
        }
        if let Some(action) = filter.action {
            builder = builder.bind(("action", action));
        }
        if let Some(resource_type) = filter.resource_type {
            builder = builder.bind(("resource_type", resource_type));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let rows: Vec<AuditRowWithId> = result.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
