//! Permission domain model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::error::{AppError, AppResult};

/// A `resource.action` capability identifier (e.g. `customers.delete`).
///
/// Both segments are lowercase ASCII letters and underscores. Use
/// [`PermissionKey::parse`] for shape-only validation and
/// [`PermissionKey::catalogued`] when the key must also exist in the
/// permission catalog (the store boundary).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(String);

fn valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c == '_')
}

impl PermissionKey {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.split_once('.') {
            Some((resource, action)) if valid_segment(resource) && valid_segment(action) => {
                Ok(Self(raw.to_string()))
            }
            _ => Err(AppError::validation(format!(
                "invalid permission identifier '{raw}': expected resource.action"
            ))),
        }
    }

    /// Parse and require membership in the permission catalog.
    pub fn catalogued(raw: &str) -> AppResult<Self> {
        let key = Self::parse(raw)?;
        if catalog::lookup(key.as_str()).is_none() {
            return Err(AppError::validation(format!(
                "unknown permission identifier '{raw}'"
            )));
        }
        Ok(key)
    }

    /// Build `resource.action` from its parts.
    pub fn of(resource: &str, action: &str) -> AppResult<Self> {
        Self::parse(&format!("{resource}.{action}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resource(&self) -> &str {
        self.0.split_once('.').map(|(r, _)| r).unwrap_or(&self.0)
    }

    pub fn action(&self) -> &str {
        self.0.split_once('.').map(|(_, a)| a).unwrap_or("")
    }

    /// Lookup key for the external translation system.
    pub fn translation_key(&self) -> String {
        format!("permissions.details.{}.name", self.0)
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PermissionKey> for String {
    fn from(key: PermissionKey) -> Self {
        key.0
    }
}

/// Grouping used by the permissions administration screen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PermissionCategory {
    General,
    Operations,
    Financial,
    Management,
    System,
}

impl PermissionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionCategory::General => "General",
            PermissionCategory::Operations => "Operations",
            PermissionCategory::Financial => "Financial",
            PermissionCategory::Management => "Management",
            PermissionCategory::System => "System",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "General" => Ok(PermissionCategory::General),
            "Operations" => Ok(PermissionCategory::Operations),
            "Financial" => Ok(PermissionCategory::Financial),
            "Management" => Ok(PermissionCategory::Management),
            "System" => Ok(PermissionCategory::System),
            other => Err(AppError::validation(format!(
                "unknown permission category '{other}'"
            ))),
        }
    }
}

/// A catalog entry as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub key: PermissionKey,
    pub category: PermissionCategory,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
