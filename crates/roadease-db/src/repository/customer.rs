//! SurrealDB implementation of [`CustomerRepository`].

use chrono::{DateTime, Utc};
use roadease_core::error::{AppError, AppResult};
use roadease_core::fetch::{expect_created, expect_scoped_write, maybe_single};
use roadease_core::models::customer::{CreateCustomer, Customer, UpdateCustomer};
use roadease_core::repository::{CustomerRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_uuid, statement_error};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CustomerRow {
    organization_id: String,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CustomerRowWithId {
    record_id: String,
    organization_id: String,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_customer(self, id: Uuid) -> Result<Customer, DbError> {
        Ok(Customer {
            id,
            organization_id: parse_uuid("customer", "organization_id", &self.organization_id)?,
            name: self.name,
            phone: self.phone,
            email: self.email,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl CustomerRowWithId {
    fn try_into_customer(self) -> Result<Customer, DbError> {
        let id = parse_uuid("customer", "id", &self.record_id)?;
        CustomerRow {
            organization_id: self.organization_id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_customer(id)
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Customer repository.
#[derive(Clone)]
pub struct SurrealCustomerRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCustomerRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CustomerRepository for SurrealCustomerRepository<C> {
    async fn create(&self, input: CreateCustomer) -> AppResult<Customer> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('customer', $id) SET \
                 organization_id = $organization_id, \
                 name = $name, phone = $phone, email = $email, \
                 notes = $notes",
            )
            .bind(("id", id.to_string()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("name", input.name))
            .bind(("phone", input.phone))
            .bind(("email", input.email))
            .bind(("notes", input.notes.unwrap_or_default()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| statement_error("customer", e))?;

        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        Ok(expect_created(rows, "customer")?.into_customer(id)?)
    }

    async fn get_by_id(&self, organization_id: Uuid, id: Uuid) -> AppResult<Customer> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('customer', $id) \
                 WHERE organization_id = $organization_id",
            )
            .bind(("id", id.to_string()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        let row = maybe_single(rows, "customer")?
            .ok_or_else(|| AppError::not_found_or_forbidden("customer"))?;

        Ok(row.into_customer(id)?)
    }

    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateCustomer,
    ) -> AppResult<Customer> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('customer', $id) SET {} \
             WHERE organization_id = $organization_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("organization_id", organization_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| statement_error("customer", e))?;

        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        Ok(expect_scoped_write(rows, "customer")?.into_customer(id)?)
    }

    async fn delete(&self, organization_id: Uuid, id: Uuid) -> AppResult<Customer> {
        let mut result = self
            .db
            .query(
                "DELETE type::record('customer', $id) \
                 WHERE organization_id = $organization_id RETURN BEFORE",
            )
            .bind(("id", id.to_string()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        Ok(expect_scoped_write(rows, "customer")?.into_customer(id)?)
    }

    async fn list(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResult<Customer>> {
        let organization_id_str = organization_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM customer \
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
                "SELECT meta::id(id) AS record_id, * FROM customer \
                 WHERE organization_id = $organization_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("organization_id", organization_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CustomerRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_customer())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
