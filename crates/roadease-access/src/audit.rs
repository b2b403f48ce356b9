//! Audit helpers shared by the services.

use chrono::{DateTime, Utc};
use roadease_core::authz::UserContext;
use roadease_core::error::AppResult;
use roadease_core::models::audit::{AuditOutcome, CreateAuditLogEntry};
use roadease_core::repository::AuditLogRepository;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::AccessError;

/// What a state-changing operation did, before the outcome is known.
pub(crate) struct AuditEvent {
    pub action: &'static str,
    pub resource_type: &'static str,
    pub resource_id: Option<String>,
}

impl AuditEvent {
    pub fn new(action: &'static str, resource_type: &'static str) -> Self {
        Self {
            action,
            resource_type,
            resource_id: None,
        }
    }

    pub fn on(mut self, resource_id: impl ToString) -> Self {
        self.resource_id = Some(resource_id.to_string());
        self
    }
}

pub(crate) async fn record<A: AuditLogRepository>(
    repo: &A,
    actor: &UserContext,
    event: &AuditEvent,
    outcome: AuditOutcome,
    changes: Value,
) -> AppResult<()> {
    repo.append(CreateAuditLogEntry {
        organization_id: actor.organization_id,
        actor_id: actor.user_id,
        action: event.action.to_string(),
        resource_type: event.resource_type.to_string(),
        resource_id: event.resource_id.clone(),
        outcome,
        changes,
        ip_address: None,
    })
    .await
    .inspect_err(|e| error!(action = event.action, error = %e, "Failed to append audit entry"))?;
    Ok(())
}

/// Resolve `permission` for `actor`; a denial is audited and returned
/// as [`AccessError::PermissionDenied`].
pub(crate) async fn authorize<A: AuditLogRepository>(
    repo: &A,
    actor: &UserContext,
    permission: &str,
    event: &AuditEvent,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if actor.is_allowed_str(permission, now) {
        debug!(user_id = %actor.user_id, permission, "Permission granted");
        return Ok(());
    }

    warn!(
        user_id = %actor.user_id,
        organization_id = %actor.organization_id,
        permission,
        action = event.action,
        "Permission denied"
    );
    record(
        repo,
        actor,
        event,
        AuditOutcome::Denied,
        serde_json::json!({ "permission": permission }),
    )
    .await?;

    Err(AccessError::PermissionDenied {
        permission: permission.to_string(),
    }
    .into())
}

/// Audit the result of a guarded write. Client errors are recorded as
/// failures; server faults are logged by the layer that raised them.
pub(crate) async fn settle<T, A: AuditLogRepository>(
    repo: &A,
    actor: &UserContext,
    event: &AuditEvent,
    result: AppResult<T>,
    changes: impl FnOnce(&T) -> Value,
) -> AppResult<T> {
    match result {
        Ok(value) => {
            record(repo, actor, event, AuditOutcome::Success, changes(&value)).await?;
            Ok(value)
        }
        Err(err) if err.is_client_error() => {
            record(
                repo,
                actor,
                event,
                AuditOutcome::Failure,
                serde_json::json!({ "error": err.public_message() }),
            )
            .await?;
            Err(err)
        }
        Err(err) => Err(err),
    }
}

/// JSON form of `value` for the audit trail; `null` if it cannot be
/// serialized.
pub(crate) fn snapshot<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!(
            error = %e,
            value_type = std::any::type_name::<T>(),
            "Audit snapshot failed to serialize"
        );
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(<S::Error as serde::ser::Error>::custom("opaque"))
        }
    }

    #[test]
    fn snapshot_falls_back_to_null() {
        assert_eq!(snapshot(&Unserializable), Value::Null);
        assert_eq!(snapshot(&"body_shop"), Value::from("body_shop"));
    }
}
