//! Domain models for ROAD EASE access control.

pub mod audit;
pub mod customer;
pub mod organization;
pub mod permission;
pub mod permission_override;
pub mod role;
pub mod user;
