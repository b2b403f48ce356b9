//! The closed permission catalog and default role grants.
//!
//! Identifiers here are the only ones the store accepts. Adding a
//! permission means adding an entry below and re-running the catalog
//! seed; existing entries are never renamed.

use crate::models::permission::PermissionCategory;
use crate::models::role::ADMIN_ROLE_KEY;

use PermissionCategory::{Financial, General, Management, Operations, System};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: &'static str,
    pub category: PermissionCategory,
    pub description: &'static str,
}

const fn entry(
    key: &'static str,
    category: PermissionCategory,
    description: &'static str,
) -> CatalogEntry {
    CatalogEntry {
        key,
        category,
        description,
    }
}

pub static CATALOG: &[CatalogEntry] = &[
    // General
    entry("dashboard.view", General, "View the dashboard"),
    entry("notifications.view", General, "View notifications"),
    entry("profile.view", General, "View own profile"),
    entry("profile.update", General, "Edit own profile"),
    entry("search.use", General, "Use global search"),
    // Operations
    entry("customers.view", Operations, "View customers"),
    entry("customers.create", Operations, "Create customers"),
    entry("customers.update", Operations, "Edit customers"),
    entry("customers.delete", Operations, "Delete customers"),
    entry("customers.export", Operations, "Export customer lists"),
    entry("vehicles.view", Operations, "View vehicles"),
    entry("vehicles.create", Operations, "Register vehicles"),
    entry("vehicles.update", Operations, "Edit vehicles"),
    entry("vehicles.delete", Operations, "Delete vehicles"),
    entry("work_orders.view", Operations, "View work orders"),
    entry("work_orders.create", Operations, "Open work orders"),
    entry("work_orders.update", Operations, "Edit work orders"),
    entry("work_orders.delete", Operations, "Delete work orders"),
    entry("work_orders.assign", Operations, "Assign technicians to work orders"),
    entry("work_orders.close", Operations, "Close work orders"),
    entry("appointments.view", Operations, "View appointments"),
    entry("appointments.create", Operations, "Book appointments"),
    entry("appointments.update", Operations, "Reschedule appointments"),
    entry("appointments.delete", Operations, "Cancel appointments"),
    entry("inventory.view", Operations, "View inventory"),
    entry("inventory.create", Operations, "Add inventory items"),
    entry("inventory.update", Operations, "Edit inventory items"),
    entry("inventory.delete", Operations, "Delete inventory items"),
    entry("inventory.adjust", Operations, "Adjust stock levels"),
    entry("suppliers.view", Operations, "View suppliers"),
    entry("suppliers.create", Operations, "Add suppliers"),
    entry("suppliers.update", Operations, "Edit suppliers"),
    entry("suppliers.delete", Operations, "Delete suppliers"),
    // Financial
    entry("invoices.view", Financial, "View invoices"),
    entry("invoices.create", Financial, "Create invoices"),
    entry("invoices.update", Financial, "Edit invoices"),
    entry("invoices.delete", Financial, "Delete invoices"),
    entry("invoices.void", Financial, "Void issued invoices"),
    entry("payments.view", Financial, "View payments"),
    entry("payments.create", Financial, "Record payments"),
    entry("payments.refund", Financial, "Refund payments"),
    entry("expenses.view", Financial, "View expenses"),
    entry("expenses.create", Financial, "Record expenses"),
    entry("expenses.update", Financial, "Edit expenses"),
    entry("expenses.delete", Financial, "Delete expenses"),
    entry("purchase_orders.view", Financial, "View purchase orders"),
    entry("purchase_orders.create", Financial, "Create purchase orders"),
    entry("purchase_orders.update", Financial, "Edit purchase orders"),
    entry("purchase_orders.approve", Financial, "Approve purchase orders"),
    // Management
    entry("technicians.view", Management, "View technicians"),
    entry("technicians.create", Management, "Add technicians"),
    entry("technicians.update", Management, "Edit technicians"),
    entry("technicians.delete", Management, "Remove technicians"),
    entry("reports.view", Management, "View reports"),
    entry("reports.export", Management, "Export reports"),
    entry("users.view", Management, "View staff accounts"),
    entry("users.create", Management, "Invite staff"),
    entry("users.update", Management, "Edit staff accounts and role assignments"),
    entry("users.delete", Management, "Deactivate staff accounts"),
    // System
    entry("roles.view", System, "View roles"),
    entry("roles.create", System, "Create roles"),
    entry("roles.update", System, "Edit roles and their grants"),
    entry("roles.delete", System, "Delete non-system roles"),
    entry("permissions.view", System, "View the permission catalog"),
    entry("permissions.manage", System, "Manage per-user permission overrides"),
    entry("audit_logs.view", System, "View the audit log"),
    entry("audit_logs.export", System, "Export the audit log"),
    entry("settings.view", System, "View organization settings"),
    entry("settings.update", System, "Edit organization settings"),
];

pub fn lookup(key: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.key == key)
}

/// Keys of system roles seeded for every new organization, with their
/// badge colors.
pub static SYSTEM_ROLES: &[(&str, &str)] = &[
    (ADMIN_ROLE_KEY, "#dc2626"),
    ("manager", "#7c3aed"),
    ("customer_service", "#2563eb"),
    ("receptionist", "#0891b2"),
    ("technician", "#16a34a"),
    ("accountant", "#ca8a04"),
];

const RECEPTIONIST: &[&str] = &[
    "customers.view",
    "customers.create",
    "customers.update",
    "vehicles.view",
    "vehicles.create",
    "appointments.view",
    "appointments.create",
    "appointments.update",
    "appointments.delete",
    "work_orders.view",
    "work_orders.create",
];

const CUSTOMER_SERVICE: &[&str] = &[
    "customers.view",
    "customers.create",
    "customers.update",
    "customers.export",
    "vehicles.view",
    "vehicles.create",
    "vehicles.update",
    "appointments.view",
    "appointments.create",
    "appointments.update",
    "work_orders.view",
    "work_orders.create",
    "work_orders.update",
    "invoices.view",
];

const TECHNICIAN: &[&str] = &[
    "vehicles.view",
    "work_orders.view",
    "work_orders.update",
    "work_orders.close",
    "inventory.view",
    "appointments.view",
];

const ACCOUNTANT: &[&str] = &[
    "customers.view",
    "invoices.view",
    "invoices.create",
    "invoices.update",
    "invoices.void",
    "payments.view",
    "payments.create",
    "payments.refund",
    "expenses.view",
    "expenses.create",
    "expenses.update",
    "expenses.delete",
    "purchase_orders.view",
    "reports.view",
    "reports.export",
];

/// Default grants for a system role key. Every role gets the General
/// category; `admin` gets the whole catalog and `manager` everything
/// outside System except `permissions.view`.
pub fn default_grants(role_key: &str) -> Vec<&'static str> {
    let specific: &[&str] = match role_key {
        ADMIN_ROLE_KEY => return CATALOG.iter().map(|e| e.key).collect(),
        "manager" => {
            return CATALOG
                .iter()
                .filter(|e| e.category != System || e.key == "permissions.view")
                .map(|e| e.key)
                .collect();
        }
        "customer_service" => CUSTOMER_SERVICE,
        "receptionist" => RECEPTIONIST,
        "technician" => TECHNICIAN,
        "accountant" => ACCOUNTANT,
        _ => &[],
    };

    CATALOG
        .iter()
        .filter(|e| e.category == General)
        .map(|e| e.key)
        .chain(specific.iter().copied())
        .collect()
}
