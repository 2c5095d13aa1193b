//!
//! Interfaces to the external collaborators the engine reads from and writes to.
//!
//! The engine owns the *meaning* of the capability attribute stored on a group, but
//! not its physical storage: everything goes through these traits. Implementations
//! decide how to persist; they take `&self` and manage their own interior mutability.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CapaError;
use crate::types::{CapabilityName, GroupId, ModuleName, UserId, UserRole};

/// A single `(user, group)` membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub group_id: GroupId,
}

/// User record as far as the engine is concerned.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: UserId,
    pub role: UserRole,
    /// Module name → enabled flag. Modules absent from this map are in the
    /// collaborator's default state.
    pub module_enablement: BTreeMap<ModuleName, bool>,
}

impl User {
    pub fn new(id: UserId, role: UserRole) -> Self {
        User { id, role, module_enablement: BTreeMap::new() }
    }

    /// Explicit flag for `module`, `None` if it was never set.
    pub fn module_flag(&self, module: &str) -> Option<bool> {
        self.module_enablement.get(module).copied()
    }

    pub fn is_module_enabled(&self, module: &str) -> bool {
        self.module_flag(module).unwrap_or(false)
    }

    /// Sets the flag for `module`, returning `true` if the stored value changed.
    pub fn set_module(&mut self, module: &str, enabled: bool) -> bool {
        match self.module_enablement.get_mut(module) {
            Some(flag) if *flag == enabled => false,
            Some(flag) => {
                *flag = enabled;
                true
            }
            None => {
                self.module_enablement.insert(module.to_string(), enabled);
                true
            }
        }
    }
}

/// Accessor for the serialized capability-name list stored on a group.
pub trait GroupCapabilityStore {
    /// Raw capability blob of `group`; `Ok(None)` when the attribute was never written.
    ///
    /// # Errors
    /// [`CapaError::GroupNotFound`] if the group does not exist.
    fn load_capabilities(&self, group: GroupId) -> Result<Option<String>, CapaError>;

    /// Replaces the raw capability blob of `group`.
    fn save_capabilities(&self, group: GroupId, blob: &str) -> Result<(), CapaError>;
}

/// Read-only view over group memberships.
pub trait MembershipStore {
    /// Groups of a single user, one round trip.
    fn groups_of_user(&self, user: UserId) -> Result<Vec<GroupId>, CapaError>;

    /// Every membership whose user is in `users`, as one bulk filtered query.
    fn memberships_of_users(&self, users: &BTreeSet<UserId>) -> Result<Vec<Membership>, CapaError>;

    /// Current members of `group`.
    fn users_of_group(&self, group: GroupId) -> Result<Vec<UserId>, CapaError>;
}

/// User persistence.
pub trait UserStore {
    /// # Errors
    /// [`CapaError::UserNotFound`] if the user does not exist.
    fn load_user(&self, id: UserId) -> Result<User, CapaError>;

    /// Bulk load; ids that do not exist are simply absent from the result.
    fn load_users(&self, ids: &BTreeSet<UserId>) -> Result<Vec<User>, CapaError>;

    fn all_user_ids(&self) -> Result<Vec<UserId>, CapaError>;

    /// Persists the full user record.
    fn save_user(&self, user: &User) -> Result<(), CapaError>;
}

/// Everything the engine needs from the outside world.
pub trait Directory: GroupCapabilityStore + MembershipStore + UserStore {}

impl<T: GroupCapabilityStore + MembershipStore + UserStore> Directory for T {}

/// Encodes capability names into the stored text representation (a JSON array).
pub fn encode_capability_blob(names: &[CapabilityName]) -> Result<String, CapaError> {
    serde_json::to_string(names).map_err(|e| CapaError::Encoding(e.to_string()))
}

/// Decodes a stored capability blob.
///
/// A missing, blank or `null` blob is an empty list. Anything that is not a JSON
/// array of strings is reported as an error; callers on the resolution path turn that
/// into an empty set.
pub fn decode_capability_blob(raw: Option<&str>) -> Result<Vec<CapabilityName>, serde_json::Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => {
            let names: Option<Vec<CapabilityName>> = serde_json::from_str(text)?;
            Ok(names.unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_missing_and_blank_blobs() {
        assert!(decode_capability_blob(None).unwrap().is_empty());
        assert!(decode_capability_blob(Some("")).unwrap().is_empty());
        assert!(decode_capability_blob(Some("   ")).unwrap().is_empty());
        assert!(decode_capability_blob(Some("null")).unwrap().is_empty());
    }

    #[test]
    fn test_decode_keeps_order_and_duplicates() {
        let names = decode_capability_blob(Some(r#"["Files","Mail","Files"]"#)).unwrap();
        assert_eq!(names, vec!["Files", "Mail", "Files"]);
    }

    #[test]
    fn test_decode_rejects_non_string_arrays() {
        assert!(decode_capability_blob(Some("[1,2]")).is_err());
        assert!(decode_capability_blob(Some(r#"{"Mail":true}"#)).is_err());
        assert!(decode_capability_blob(Some("[\"Mail\"")).is_err());
    }

    #[test]
    fn test_encode_is_a_json_array() {
        let blob = encode_capability_blob(&["Mail".to_string(), "Files".to_string()]).unwrap();
        assert_eq!(blob, r#"["Mail","Files"]"#);
        assert_eq!(encode_capability_blob(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_set_module_reports_changes() {
        let mut user = User::new(UserId::from_u128(1), UserRole::NormalUser);
        assert!(user.set_module("Mail", true));
        assert!(!user.set_module("Mail", true));
        assert!(user.set_module("Mail", false));
        assert_eq!(user.module_flag("Mail"), Some(false));
        assert_eq!(user.module_flag("Files"), None);
        assert!(!user.is_module_enabled("Files"));
    }
}
