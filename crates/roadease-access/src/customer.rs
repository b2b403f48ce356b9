//! Customer records behind the permission guard.
//!
//! The organization is taken from the actor's context, never from the
//! request, so every read and write is scoped to the caller's tenant.
//! Writes go through the scoped-write contract of the repository: a
//! record in another organization is reported exactly like a missing one.

use chrono::Utc;
use roadease_core::authz::UserContext;
use roadease_core::error::AppResult;
use roadease_core::models::customer::{CreateCustomer, Customer, UpdateCustomer};
use roadease_core::repository::{AuditLogRepository, CustomerRepository, PaginatedResult, Pagination};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::audit::{self, AuditEvent, snapshot};
use crate::error::AccessError;

/// Input for creating a customer in the actor's organization.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

pub struct CustomerService<C: CustomerRepository, A: AuditLogRepository> {
    customer_repo: C,
    audit_repo: A,
}

impl<C: CustomerRepository, A: AuditLogRepository> CustomerService<C, A> {
    pub fn new(customer_repo: C, audit_repo: A) -> Self {
        Self {
            customer_repo,
            audit_repo,
        }
    }

    fn require_view(&self, actor: &UserContext) -> AppResult<()> {
        if actor.can_view("customers", Utc::now()) {
            Ok(())
        } else {
            Err(AccessError::PermissionDenied {
                permission: "customers.view".into(),
            }
            .into())
        }
    }

    pub async fn get(&self, actor: &UserContext, id: Uuid) -> AppResult<Customer> {
        self.require_view(actor)?;
        self.customer_repo.get_by_id(actor.organization_id, id).await
    }

    pub async fn list(
        &self,
        actor: &UserContext,
        pagination: Pagination,
    ) -> AppResult<PaginatedResult<Customer>> {
        self.require_view(actor)?;
        self.customer_repo
            .list(actor.organization_id, pagination)
            .await
    }

    pub async fn create(&self, actor: &UserContext, input: NewCustomer) -> AppResult<Customer> {
        let event = AuditEvent::new("customer.create", "customer");
        audit::authorize(&self.audit_repo, actor, "customers.create", &event, Utc::now()).await?;

        let result = self
            .customer_repo
            .create(CreateCustomer {
                organization_id: actor.organization_id,
                name: input.name,
                phone: input.phone,
                email: input.email,
                notes: input.notes,
            })
            .await;

        let customer = audit::settle(&self.audit_repo, actor, &event, result, |c| {
            json!({ "after": snapshot(c) })
        })
        .await?;
        info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Apply `input` and return the record's new state.
    pub async fn update(
        &self,
        actor: &UserContext,
        id: Uuid,
        input: UpdateCustomer,
    ) -> AppResult<Customer> {
        let event = AuditEvent::new("customer.update", "customer").on(id);
        audit::authorize(&self.audit_repo, actor, "customers.update", &event, Utc::now()).await?;

        let changes = snapshot(&input);
        let result = self
            .customer_repo
            .update(actor.organization_id, id, input)
            .await;

        audit::settle(&self.audit_repo, actor, &event, result, |after| {
            json!({ "requested": changes, "after": snapshot(after) })
        })
        .await
    }

    /// Delete and return the removed record.
    pub async fn delete(&self, actor: &UserContext, id: Uuid) -> AppResult<Customer> {
        let event = AuditEvent::new("customer.delete", "customer").on(id);
        audit::authorize(&self.audit_repo, actor, "customers.delete", &event, Utc::now()).await?;

        let result = self.customer_repo.delete(actor.organization_id, id).await;
        let removed = audit::settle(&self.audit_repo, actor, &event, result, |before| {
            json!({ "before": snapshot(before) })
        })
        .await?;
        info!(customer_id = %removed.id, "Customer deleted");
        Ok(removed)
    }
}
