//! Integration tests for the organization-scoped write path, exercised
//! through the Customer repository.

use roadease_core::AppError;
use roadease_core::models::customer::{CreateCustomer, UpdateCustomer};
use roadease_core::models::organization::CreateOrganization;
use roadease_core::repository::{CustomerRepository, OrganizationRepository, Pagination};
use roadease_db::repository::{SurrealCustomerRepository, SurrealOrganizationRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> (Surreal<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    roadease_db::run_migrations(&db).await.unwrap();

    let orgs = SurrealOrganizationRepository::new(db.clone());
    let a = orgs
        .create(CreateOrganization {
            name: "North Garage".into(),
            slug: "north-garage".into(),
        })
        .await
        .unwrap();
    let b = orgs
        .create(CreateOrganization {
            name: "South Garage".into(),
            slug: "south-garage".into(),
        })
        .await
        .unwrap();

    (db, a.id, b.id)
}

fn new_customer(organization_id: Uuid, name: &str) -> CreateCustomer {
    CreateCustomer {
        organization_id,
        name: name.into(),
        phone: Some("+44 20 7946 0000".into()),
        email: None,
        notes: None,
    }
}

#[tokio::test]
async fn create_and_get() {
    let (db, org_a, _) = setup().await;
    let repo = SurrealCustomerRepository::new(db);

    let c = repo.create(new_customer(org_a, "Ada Motors")).await.unwrap();
    assert_eq!(c.notes, "");

    let fetched = repo.get_by_id(org_a, c.id).await.unwrap();
    assert_eq!(fetched, c);
}

#[tokio::test]
async fn update_in_own_organization_returns_new_state() {
    let (db, org_a, _) = setup().await;
    let repo = SurrealCustomerRepository::new(db);
    let c = repo.create(new_customer(org_a, "Ada Motors")).await.unwrap();

    let updated = repo
        .update(
            org_a,
            c.id,
            UpdateCustomer {
                name: Some("Ada Motors Ltd".into()),
                phone: Some(None),
                notes: Some("Prefers morning slots".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, c.id);
    assert_eq!(updated.name, "Ada Motors Ltd");
    assert_eq!(updated.phone, None);
    assert_eq!(updated.notes, "Prefers morning slots");
}

#[tokio::test]
async fn cross_organization_update_is_not_found_or_forbidden() {
    let (db, org_a, org_b) = setup().await;
    let repo = SurrealCustomerRepository::new(db);
    let c = repo.create(new_customer(org_a, "Ada Motors")).await.unwrap();

    let err = repo
        .update(
            org_b,
            c.id,
            UpdateCustomer {
                name: Some("Hijacked".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));
    assert_eq!(err.status_code(), 404);

    // The record is untouched.
    assert_eq!(repo.get_by_id(org_a, c.id).await.unwrap().name, "Ada Motors");
}

#[tokio::test]
async fn missing_and_foreign_records_are_indistinguishable() {
    let (db, org_a, org_b) = setup().await;
    let repo = SurrealCustomerRepository::new(db);
    let c = repo.create(new_customer(org_a, "Ada Motors")).await.unwrap();

    let foreign = repo.delete(org_b, c.id).await.unwrap_err();
    let missing = repo.delete(org_b, Uuid::new_v4()).await.unwrap_err();

    assert_eq!(foreign.status_code(), missing.status_code());
    assert_eq!(foreign.public_message(), missing.public_message());
}

#[tokio::test]
async fn delete_returns_removed_record() {
    let (db, org_a, _) = setup().await;
    let repo = SurrealCustomerRepository::new(db);
    let c = repo.create(new_customer(org_a, "Ada Motors")).await.unwrap();

    let deleted = repo.delete(org_a, c.id).await.unwrap();
    assert_eq!(deleted.id, c.id);

    let err = repo.get_by_id(org_a, c.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));
}

#[tokio::test]
async fn list_is_scoped_and_paginated() {
    let (db, org_a, org_b) = setup().await;
    let repo = SurrealCustomerRepository::new(db);

    for name in ["Ada Motors", "Babbage Haulage", "Curie Cabs"] {
        repo.create(new_customer(org_a, name)).await.unwrap();
    }
    repo.create(new_customer(org_b, "Other Tenant")).await.unwrap();

    let page = repo
        .list(org_a, Pagination { offset: 0, limit: 2 })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert!(page.items.iter().all(|c| c.organization_id == org_a));
}

#[tokio::test]
async fn organizations_are_fetched_by_id_and_slugs_are_unique() {
    let (db, org_a, _) = setup().await;
    let orgs = SurrealOrganizationRepository::new(db);

    assert_eq!(orgs.get_by_id(org_a).await.unwrap().slug, "north-garage");

    let err = orgs
        .create(CreateOrganization {
            name: "Impostor".into(),
            slug: "north-garage".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists { .. }));

    let err = orgs.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrForbidden { .. }));
}
