//! Permission resolution.
//!
//! Everything in this module is a pure function of a [`UserContext`] and
//! an evaluation time. A context is built once per request by the access
//! layer and passed explicitly to whoever needs to gate an action.
//!
//! Resolution for a permission `p` at time `now`:
//!
//! 1. start from whether the user's role grants `p` (an inactive role
//!    grants nothing);
//! 2. apply every override on `p` that is active at `now`, in ascending
//!    `(created_at, id)` order, each one replacing the running value;
//! 3. the final value is the answer.
//!
//! Step 2 means the most recently created active override wins. The store
//! keeps at most one override per user and permission, so the ordering
//! only matters for contexts assembled from other sources.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::permission::PermissionKey;
use crate::models::permission_override::PermissionOverride;
use crate::models::role::ADMIN_ROLE_KEY;

/// Immutable snapshot of everything needed to authorize one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role_key: String,
    pub role_active: bool,
    pub role_grants: HashSet<PermissionKey>,
    /// Sorted by `(created_at, id)` on construction.
    overrides: Vec<PermissionOverride>,
}

/// Where a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionSource {
    /// No grant and no active override.
    Default,
    Role,
    Override { override_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub source: DecisionSource,
}

impl UserContext {
    pub fn new(
        user_id: Uuid,
        organization_id: Uuid,
        role_key: impl Into<String>,
        role_active: bool,
        role_grants: impl IntoIterator<Item = PermissionKey>,
        overrides: impl IntoIterator<Item = PermissionOverride>,
    ) -> Self {
        let mut overrides: Vec<PermissionOverride> = overrides
            .into_iter()
            .filter(|o| o.user_id == user_id && o.organization_id == organization_id)
            .collect();
        overrides.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        Self {
            user_id,
            organization_id,
            role_key: role_key.into(),
            role_active,
            role_grants: role_grants.into_iter().collect(),
            overrides,
        }
    }

    pub fn overrides(&self) -> &[PermissionOverride] {
        &self.overrides
    }

    /// Resolve `permission` at `now`, reporting which input decided it.
    pub fn decide(&self, permission: &PermissionKey, now: DateTime<Utc>) -> Decision {
        let mut decision = if self.role_active && self.role_grants.contains(permission) {
            Decision {
                allowed: true,
                source: DecisionSource::Role,
            }
        } else {
            Decision {
                allowed: false,
                source: DecisionSource::Default,
            }
        };

        for o in self
            .overrides
            .iter()
            .filter(|o| &o.permission == permission && o.is_active_at(now))
        {
            decision = Decision {
                allowed: o.is_granted,
                source: DecisionSource::Override { override_id: o.id },
            };
        }

        decision
    }

    pub fn is_allowed(&self, permission: &PermissionKey, now: DateTime<Utc>) -> bool {
        self.decide(permission, now).allowed
    }

    /// [`is_allowed`](Self::is_allowed) for a raw identifier. Malformed
    /// identifiers are never allowed.
    pub fn is_allowed_str(&self, permission: &str, now: DateTime<Utc>) -> bool {
        PermissionKey::parse(permission).is_ok_and(|key| self.is_allowed(&key, now))
    }

    fn allows(&self, resource: &str, action: &str, now: DateTime<Utc>) -> bool {
        PermissionKey::of(resource, action).is_ok_and(|key| self.is_allowed(&key, now))
    }

    /// `resource.view`.
    pub fn can_view(&self, resource: &str, now: DateTime<Utc>) -> bool {
        self.allows(resource, "view", now)
    }

    /// Any of `resource.create`, `resource.update`, `resource.delete`.
    pub fn can_edit(&self, resource: &str, now: DateTime<Utc>) -> bool {
        ["create", "update", "delete"]
            .iter()
            .any(|action| self.allows(resource, action, now))
    }

    pub fn has_any(&self, permissions: &[PermissionKey], now: DateTime<Utc>) -> bool {
        permissions.iter().any(|p| self.is_allowed(p, now))
    }

    /// Vacuously true for an empty list.
    pub fn has_all(&self, permissions: &[PermissionKey], now: DateTime<Utc>) -> bool {
        permissions.iter().all(|p| self.is_allowed(p, now))
    }

    pub fn is_admin(&self) -> bool {
        self.role_key == ADMIN_ROLE_KEY
    }

    /// The full resolved permission set at `now`.
    pub fn effective_permissions(&self, now: DateTime<Utc>) -> BTreeSet<PermissionKey> {
        let candidates: BTreeSet<&PermissionKey> = self
            .role_grants
            .iter()
            .chain(self.overrides.iter().map(|o| &o.permission))
            .collect();

        candidates
            .into_iter()
            .filter(|p| self.is_allowed(p, now))
            .cloned()
            .collect()
    }
}
