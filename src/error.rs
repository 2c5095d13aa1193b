//!
//! Defines error types for the capability engine.

use crate::types::{GroupId, UserId, UserRole};

/// Represents errors that can occur while loading the catalog, resolving capabilities
/// or talking to the external stores.
///
/// Malformed capability data stored on a group is deliberately absent: it is decoded
/// as an empty capability set and never surfaces as an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapaError {
    /// The caller's role is below the one required by the operation.
    #[error("Role {actual:?} is not allowed, at least {required:?} is required")]
    Authorization { required: UserRole, actual: UserRole },
    /// The referenced group does not exist.
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),
    /// The referenced user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    /// Two catalog entries share the same capability name.
    #[error("Duplicate capability in catalog: {0}")]
    DuplicateCapability(String),
    /// The catalog source could not be read or parsed.
    #[error("Invalid catalog configuration: {0}")]
    CatalogConfig(String),
    /// A write or query against an external store failed.
    #[error("Persistence failure: {0}")]
    Persistence(String),
    /// Capability names could not be encoded for storage.
    #[error("Encoding failure: {0}")]
    Encoding(String),
}
