//! Integration tests for the guarded customer write path.

use chrono::{Duration, Utc};
use roadease_access::config::AccessConfig;
use roadease_access::customer::{CustomerService, NewCustomer};
use roadease_access::service::{AccessService, SetOverride};
use roadease_core::authz::UserContext;
use roadease_core::error::AppError;
use roadease_core::models::audit::AuditOutcome;
use roadease_core::models::customer::UpdateCustomer;
use roadease_core::models::organization::CreateOrganization;
use roadease_core::models::user::CreateUser;
use roadease_core::repository::{
    AuditLogFilter, AuditLogRepository, OrganizationRepository, Pagination, PermissionRepository,
    RoleRepository, UserRepository,
};
use roadease_db::repository::{
    SurrealAuditLogRepository, SurrealCustomerRepository, SurrealOrganizationRepository,
    SurrealPermissionOverrideRepository, SurrealPermissionRepository, SurrealRoleRepository,
    SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Access = AccessService<
    SurrealUserRepository<Db>,
    SurrealRoleRepository<Db>,
    SurrealPermissionRepository<Db>,
    SurrealPermissionOverrideRepository<Db>,
    SurrealAuditLogRepository<Db>,
>;
type Customers = CustomerService<SurrealCustomerRepository<Db>, SurrealAuditLogRepository<Db>>;

struct Fixture {
    db: Surreal<Db>,
    access: Access,
    customers: Customers,
}

impl Fixture {
    /// Bootstrap an organization and return contexts for its admin and
    /// receptionist.
    async fn organization(&self, slug: &str) -> (UserContext, UserContext) {
        let org = SurrealOrganizationRepository::new(self.db.clone())
            .create(CreateOrganization {
                name: slug.into(),
                slug: slug.into(),
            })
            .await
            .unwrap();
        self.access.bootstrap_organization(org.id).await.unwrap();

        let admin = self.user(org.id, "admin", &format!("owner@{slug}.example")).await;
        let desk = self
            .user(org.id, "receptionist", &format!("desk@{slug}.example"))
            .await;

        (
            self.access.load_context(org.id, admin).await.unwrap(),
            self.access.load_context(org.id, desk).await.unwrap(),
        )
    }

    async fn user(&self, org_id: Uuid, role_key: &str, email: &str) -> Uuid {
        let role = SurrealRoleRepository::new(self.db.clone())
            .get_by_key(org_id, role_key)
            .await
            .unwrap();
        SurrealUserRepository::new(self.db.clone())
            .create(CreateUser {
                organization_id: org_id,
                email: email.into(),
                full_name: role_key.into(),
                role_id: role.id,
            })
            .await
            .unwrap()
            .id
    }

    async fn audit_for(&self, actor: &UserContext, action: &str) -> Vec<AuditOutcome> {
        SurrealAuditLogRepository::new(self.db.clone())
            .list(
                actor.organization_id,
                AuditLogFilter {
                    actor_id: Some(actor.user_id),
                    action: Some(action.into()),
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await
            .unwrap()
            .items
            .into_iter()
            .map(|e| e.outcome)
            .collect()
    }
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    roadease_db::run_migrations(&db).await.unwrap();
    SurrealPermissionRepository::new(db.clone())
        .seed_catalog()
        .await
        .unwrap();

    let access = AccessService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealRoleRepository::new(db.clone()),
        SurrealPermissionRepository::new(db.clone()),
        SurrealPermissionOverrideRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
        AccessConfig::default(),
    );
    let customers = CustomerService::new(
        SurrealCustomerRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
    );

    Fixture {
        db,
        access,
        customers,
    }
}

fn ada() -> NewCustomer {
    NewCustomer {
        name: "Ada Motors".into(),
        phone: Some("+44 20 7946 0000".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn receptionist_creates_and_updates_but_cannot_delete() {
    let f = setup().await;
    let (_, desk) = f.organization("north").await;

    let customer = f.customers.create(&desk, ada()).await.unwrap();
    assert_eq!(customer.organization_id, desk.organization_id);

    let updated = f
        .customers
        .update(
            &desk,
            customer.id,
            UpdateCustomer {
                email: Some(Some("service@ada.example".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.email.as_deref(), Some("service@ada.example"));
    assert_eq!(updated.name, "Ada Motors");

    let err = f.customers.delete(&desk, customer.id).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied { .. }));
    assert_eq!(
        f.audit_for(&desk, "customer.delete").await,
        vec![AuditOutcome::Denied]
    );

    // Still there.
    f.customers.get(&desk, customer.id).await.unwrap();
}

#[tokio::test]
async fn temporary_override_allows_delete() {
    let f = setup().await;
    let (admin, desk) = f.organization("north").await;
    let customer = f.customers.create(&desk, ada()).await.unwrap();

    f.access
        .set_override(
            &admin,
            SetOverride {
                user_id: desk.user_id,
                permission: "customers.delete".into(),
                is_granted: true,
                reason: "Duplicate cleanup before audit".into(),
                expires_at: Some(Utc::now() + Duration::days(1)),
            },
        )
        .await
        .unwrap();

    // Contexts are snapshots; pick up the new override.
    let desk = f
        .access
        .load_context(desk.organization_id, desk.user_id)
        .await
        .unwrap();
    let removed = f.customers.delete(&desk, customer.id).await.unwrap();
    assert_eq!(removed.id, customer.id);
    assert_eq!(
        f.audit_for(&desk, "customer.delete").await,
        vec![AuditOutcome::Success]
    );
}

#[tokio::test]
async fn cross_organization_write_is_not_found_or_forbidden() {
    let f = setup().await;
    let (north_admin, _) = f.organization("north").await;
    let (south_admin, _) = f.organization("south").await;

    let customer = f.customers.create(&north_admin, ada()).await.unwrap();

    let err = f
        .customers
        .update(
            &south_admin,
            customer.id,
            UpdateCustomer {
                name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));
    assert_eq!(err.status_code(), 404);

    let missing = f
        .customers
        .delete(&south_admin, Uuid::new_v4())
        .await
        .unwrap_err();
    let foreign = f
        .customers
        .delete(&south_admin, customer.id)
        .await
        .unwrap_err();
    assert_eq!(missing.public_message(), foreign.public_message());

    assert_eq!(
        f.audit_for(&south_admin, "customer.update").await,
        vec![AuditOutcome::Failure]
    );
    assert_eq!(
        f.customers.get(&north_admin, customer.id).await.unwrap().name,
        "Ada Motors"
    );
}

#[tokio::test]
async fn listing_is_scoped_to_the_actor_organization() {
    let f = setup().await;
    let (north_admin, north_desk) = f.organization("north").await;
    let (south_admin, _) = f.organization("south").await;

    f.customers.create(&north_desk, ada()).await.unwrap();
    f.customers
        .create(
            &north_admin,
            NewCustomer {
                name: "Babbage Haulage".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let north = f
        .customers
        .list(&north_desk, Pagination::default())
        .await
        .unwrap();
    assert_eq!(north.total, 2);

    let south = f
        .customers
        .list(&south_admin, Pagination::default())
        .await
        .unwrap();
    assert_eq!(south.total, 0);

    let err = f
        .customers
        .get(&south_admin, north.items[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));
}
