//! ROAD EASE Core: domain models, the permission catalog, the permission
//! resolver, the write-path row-count contract and repository traits
//! shared by every other crate.

pub mod authz;
pub mod catalog;
pub mod error;
pub mod fetch;
pub mod models;
pub mod repository;

pub use authz::{Decision, DecisionSource, UserContext};
pub use error::{AppError, AppResult};
