//! SurrealDB repository implementations.

mod audit;
mod customer;
mod organization;
mod permission;
mod permission_override;
mod role;
mod user;

pub use audit::SurrealAuditLogRepository;
pub use customer::SurrealCustomerRepository;
pub use organization::SurrealOrganizationRepository;
pub use permission::SurrealPermissionRepository;
pub use permission_override::SurrealPermissionOverrideRepository;
pub use role::SurrealRoleRepository;
pub use user::SurrealUserRepository;

use uuid::Uuid;

use crate::error::DbError;

fn parse_uuid(entity: &'static str, field: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::decode(entity, format!("invalid {field}: {e}")))
}

/// Classify a failed statement: unique-index violations become
/// [`DbError::Duplicate`], everything else stays a store error.
fn statement_error(entity: &'static str, err: surrealdb::Error) -> DbError {
    if err.to_string().contains("already contains") {
        DbError::Duplicate { entity }
    } else {
        DbError::Surreal(err)
    }
}
