//! Integration tests for Role and Permission repositories using in-memory SurrealDB.

use roadease_core::AppError;
use roadease_core::catalog::CATALOG;
use roadease_core::models::organization::CreateOrganization;
use roadease_core::models::permission::{PermissionCategory, PermissionKey};
use roadease_core::models::role::{CreateRole, RoleStatus, UpdateRole};
use roadease_core::models::user::CreateUser;
use roadease_core::repository::{
    OrganizationRepository, Pagination, PermissionRepository, RoleRepository, UserRepository,
};
use roadease_db::repository::{
    SurrealOrganizationRepository, SurrealPermissionRepository, SurrealRoleRepository,
    SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: in-memory DB with migrations, the seeded catalog and two
/// organizations.
async fn setup() -> (Surreal<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    roadease_db::run_migrations(&db).await.unwrap();

    SurrealPermissionRepository::new(db.clone())
        .seed_catalog()
        .await
        .unwrap();

    let org_repo = SurrealOrganizationRepository::new(db.clone());
    let org_a = org_repo
        .create(CreateOrganization {
            name: "North Garage".into(),
            slug: "north-garage".into(),
        })
        .await
        .unwrap();
    let org_b = org_repo
        .create(CreateOrganization {
            name: "South Garage".into(),
            slug: "south-garage".into(),
        })
        .await
        .unwrap();

    (db, org_a.id, org_b.id)
}

fn key(raw: &str) -> PermissionKey {
    PermissionKey::parse(raw).unwrap()
}

fn receptionist(organization_id: Uuid) -> CreateRole {
    CreateRole {
        organization_id,
        key: "receptionist".into(),
        color: "#0891b2".into(),
        is_system: true,
    }
}

#[tokio::test]
async fn seed_catalog_is_idempotent() {
    let (db, _, _) = setup().await;
    let repo = SurrealPermissionRepository::new(db);

    assert_eq!(repo.seed_catalog().await.unwrap(), CATALOG.len() as u64);
    let all = repo.list().await.unwrap();
    assert_eq!(all.len(), CATALOG.len());

    // Sorted by category first.
    assert_eq!(all[0].category, PermissionCategory::General);

    let delete = repo.get(&key("customers.delete")).await.unwrap();
    assert_eq!(delete.category, PermissionCategory::Operations);
}

#[tokio::test]
async fn role_crud_is_scoped_to_organization() {
    let (db, org_a, org_b) = setup().await;
    let repo = SurrealRoleRepository::new(db);

    let role = repo.create(receptionist(org_a)).await.unwrap();
    assert_eq!(role.status, RoleStatus::Active);
    assert_eq!(role.translation_key(), "roles.receptionist.name");

    let fetched = repo.get_by_key(org_a, "receptionist").await.unwrap();
    assert_eq!(fetched.id, role.id);

    let err = repo.get_by_id(org_b, role.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));

    let err = repo
        .update(
            org_b,
            role.id,
            UpdateRole {
                color: Some("#000000".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));

    let updated = repo
        .update(
            org_a,
            role.id,
            UpdateRole {
                status: Some(RoleStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, RoleStatus::Inactive);
    assert_eq!(updated.color, "#0891b2");

    let page = repo.list(org_a, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert!(repo.list(org_b, Pagination::default()).await.unwrap().items.is_empty());

    let err = repo.delete(org_b, role.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));
    let deleted = repo.delete(org_a, role.id).await.unwrap();
    assert_eq!(deleted.id, role.id);
}

#[tokio::test]
async fn duplicate_role_key_is_rejected() {
    let (db, org_a, org_b) = setup().await;
    let repo = SurrealRoleRepository::new(db);

    repo.create(receptionist(org_a)).await.unwrap();
    let err = repo.create(receptionist(org_a)).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists { .. }));

    // Same key in another organization is fine.
    repo.create(receptionist(org_b)).await.unwrap();
}

#[tokio::test]
async fn grant_and_revoke_role_permissions() {
    let (db, org_a, _) = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let perms = SurrealPermissionRepository::new(db);

    let role = roles.create(receptionist(org_a)).await.unwrap();

    perms
        .grant_to_role(org_a, role.id, &key("customers.view"))
        .await
        .unwrap();
    perms
        .grant_to_role(org_a, role.id, &key("customers.create"))
        .await
        .unwrap();
    // Granting twice is a no-op.
    perms
        .grant_to_role(org_a, role.id, &key("customers.view"))
        .await
        .unwrap();

    let granted = perms.get_role_permissions(org_a, role.id).await.unwrap();
    assert_eq!(granted, vec![key("customers.create"), key("customers.view")]);

    perms
        .revoke_from_role(org_a, role.id, &key("customers.create"))
        .await
        .unwrap();
    let granted = perms.get_role_permissions(org_a, role.id).await.unwrap();
    assert_eq!(granted, vec![key("customers.view")]);
}

#[tokio::test]
async fn grants_reject_foreign_roles_and_unknown_keys() {
    let (db, org_a, org_b) = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let perms = SurrealPermissionRepository::new(db);

    let role = roles.create(receptionist(org_a)).await.unwrap();

    let err = perms
        .grant_to_role(org_b, role.id, &key("customers.delete"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));

    let err = perms
        .grant_to_role(org_a, role.id, &key("spaceships.launch"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    assert!(
        perms
            .get_role_permissions(org_a, role.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn deleting_a_role_removes_its_grants() {
    let (db, org_a, _) = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let perms = SurrealPermissionRepository::new(db.clone());

    let role = roles.create(receptionist(org_a)).await.unwrap();
    perms
        .grant_to_role(org_a, role.id, &key("customers.view"))
        .await
        .unwrap();
    roles.delete(org_a, role.id).await.unwrap();

    let mut result = db.query("SELECT * FROM grants").await.unwrap();
    let edges: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert!(edges.is_empty());
}

#[tokio::test]
async fn foreign_role_delete_leaves_role_and_grants_in_place() {
    let (db, org_a, org_b) = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let perms = SurrealPermissionRepository::new(db.clone());

    let role = roles.create(receptionist(org_a)).await.unwrap();
    perms
        .grant_to_role(org_a, role.id, &key("customers.view"))
        .await
        .unwrap();

    let err = roles.delete(org_b, role.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));

    assert_eq!(roles.get_by_id(org_a, role.id).await.unwrap().id, role.id);
    assert_eq!(
        perms.get_role_permissions(org_a, role.id).await.unwrap(),
        vec![key("customers.view")]
    );
}

fn front_desk(organization_id: Uuid, role_id: Uuid, email: &str) -> CreateUser {
    CreateUser {
        organization_id,
        email: email.into(),
        full_name: "Front Desk".into(),
        role_id,
    }
}

#[tokio::test]
async fn users_need_a_role_of_their_own_organization() {
    let (db, org_a, org_b) = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let users = SurrealUserRepository::new(db.clone());

    let foreign_role = roles.create(receptionist(org_b)).await.unwrap();
    let err = users
        .create(front_desk(org_a, foreign_role.id, "desk@north.example"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));

    let err = users
        .create(front_desk(org_a, Uuid::new_v4(), "desk@north.example"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));

    assert_eq!(
        users.list(org_a, Pagination::default()).await.unwrap().total,
        0
    );
}

#[tokio::test]
async fn role_holders_are_counted_per_organization() {
    let (db, org_a, org_b) = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let users = SurrealUserRepository::new(db.clone());

    let role = roles.create(receptionist(org_a)).await.unwrap();
    assert_eq!(users.count_with_role(org_a, role.id).await.unwrap(), 0);

    users
        .create(front_desk(org_a, role.id, "desk@north.example"))
        .await
        .unwrap();
    users
        .create(front_desk(org_a, role.id, "cover@north.example"))
        .await
        .unwrap();

    assert_eq!(users.count_with_role(org_a, role.id).await.unwrap(), 2);
    assert_eq!(users.count_with_role(org_b, role.id).await.unwrap(), 0);
}
