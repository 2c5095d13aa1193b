//! Shared identifiers and small value types used across the engine.
//!
//! Group and user identifiers are owned by the group/user management collaborators;
//! the engine only ever carries them around. Both are UUID newtypes that serialize as
//! the bare UUID string.

use std::fmt;
use uuid::Uuid;

/// Name of a catalog capability (e.g. `"Mail"`).
pub type CapabilityName = String;

/// Name of a product module toggled on a user account (e.g. `"MailDomains"`).
pub type ModuleName = String;

/// Identifier of a user group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub Uuid);

/// Identifier of a user account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl GroupId {
    /// Builds a deterministic identifier, mostly useful for fixtures.
    pub const fn from_u128(value: u128) -> Self {
        GroupId(Uuid::from_u128(value))
    }
}

impl UserId {
    /// Builds a deterministic identifier, mostly useful for fixtures.
    pub const fn from_u128(value: u128) -> Self {
        UserId(Uuid::from_u128(value))
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group:{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Account role ladder, ordered from least to most privileged.
///
/// The derived `Ord` follows declaration order, so `role >= UserRole::TenantAdmin`
/// reads as "tenant admin or higher".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum UserRole {
    Anonymous,
    Customer,
    NormalUser,
    TenantAdmin,
    SuperAdmin,
}

impl UserRole {
    /// `true` when this role is `required` or more privileged.
    #[inline]
    pub fn is_at_least(self, required: UserRole) -> bool {
        self >= required
    }

    /// Privileged accounts are not regular tenant members; their module state is not
    /// derived from group membership unless explicitly configured.
    #[inline]
    pub fn is_privileged(self) -> bool {
        self == UserRole::SuperAdmin
    }
}

/// The identity on whose behalf a service operation runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Caller {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Caller { user_id, role }
    }
}
