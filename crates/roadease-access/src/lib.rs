//! ROAD EASE Access: builds per-request [`UserContext`]s, guards
//! tenant-scoped writes with the permission resolver, and runs the RBAC
//! administration flows (roles, grants, overrides, role assignment).
//!
//! Every state-changing operation appends an audit entry before it
//! returns success.
//!
//! [`UserContext`]: roadease_core::authz::UserContext

mod audit;
pub mod config;
pub mod customer;
pub mod error;
pub mod service;

pub use config::AccessConfig;
pub use customer::{CustomerService, NewCustomer};
pub use error::AccessError;
pub use service::{AccessService, SetOverride};
