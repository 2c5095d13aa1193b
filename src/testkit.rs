//! In-memory collaborators for tests, benches and fuzzing.
//!
//! [`InMemoryDirectory`] implements every store trait over plain maps, counts the
//! round trips the engine makes and can be told to fail specific writes.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{CapabilityConfig, Catalog, KeyLocalizer};
use crate::error::CapaError;
use crate::store::{encode_capability_blob, GroupCapabilityStore, Membership, MembershipStore, User, UserStore};
use crate::types::{GroupId, UserId, UserRole};

/// The two-capability catalog used throughout the examples:
/// `Mail → [Mail, MailDomains]`, `Files → [Files]`.
pub fn example_catalog() -> Result<Catalog, CapaError> {
    Catalog::load(
        vec![
            CapabilityConfig::new("Mail", "LABEL_MAIL", "LABEL_MAIL_DESC", &["Mail", "MailDomains"]),
            CapabilityConfig::new("Files", "LABEL_FILES", "LABEL_FILES_DESC", &["Files"]),
        ],
        &KeyLocalizer,
    )
}

/// Installs a test-friendly `tracing` subscriber once per process.
#[cfg(feature = "test-utils")]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    groups: RefCell<BTreeMap<GroupId, Option<String>>>,
    memberships: RefCell<BTreeSet<Membership>>,
    users: RefCell<BTreeMap<UserId, User>>,

    failing_user_writes: RefCell<BTreeSet<UserId>>,
    fail_group_writes: Cell<bool>,
    fail_membership_queries: Cell<bool>,

    capability_reads: Cell<usize>,
    single_membership_queries: Cell<usize>,
    bulk_membership_queries: Cell<usize>,
    user_writes: Cell<usize>,
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group holding `names`, stored in the regular encoded form.
    pub fn add_group(&self, group: GroupId, names: &[&str]) -> &Self {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let blob = encode_capability_blob(&names).unwrap_or_default();
        self.groups.borrow_mut().insert(group, Some(blob));
        self
    }

    /// Adds a group with an arbitrary raw blob (or none at all).
    pub fn add_group_raw(&self, group: GroupId, raw: Option<&str>) -> &Self {
        self.groups.borrow_mut().insert(group, raw.map(str::to_string));
        self
    }

    pub fn add_user(&self, user: UserId, role: UserRole) -> &Self {
        self.users.borrow_mut().insert(user, User::new(user, role));
        self
    }

    pub fn put_user(&self, user: User) -> &Self {
        self.users.borrow_mut().insert(user.id, user);
        self
    }

    pub fn add_member(&self, user: UserId, group: GroupId) -> &Self {
        self.memberships.borrow_mut().insert(Membership { user_id: user, group_id: group });
        self
    }

    pub fn remove_member(&self, user: UserId, group: GroupId) -> &Self {
        self.memberships.borrow_mut().remove(&Membership { user_id: user, group_id: group });
        self
    }

    /// Deletes groups and their memberships, returning the users that were members.
    pub fn delete_groups(&self, groups: &[GroupId]) -> Vec<UserId> {
        let mut affected = BTreeSet::new();
        self.memberships.borrow_mut().retain(|m| {
            let doomed = groups.contains(&m.group_id);
            if doomed {
                affected.insert(m.user_id);
            }
            !doomed
        });
        let mut stored = self.groups.borrow_mut();
        for group in groups {
            stored.remove(group);
        }
        affected.into_iter().collect()
    }

    pub fn user(&self, id: UserId) -> Option<User> {
        self.users.borrow().get(&id).cloned()
    }

    pub fn raw_capabilities(&self, group: GroupId) -> Option<String> {
        self.groups.borrow().get(&group).cloned().flatten()
    }

    pub fn fail_writes_for(&self, user: UserId) -> &Self {
        self.failing_user_writes.borrow_mut().insert(user);
        self
    }

    pub fn set_fail_group_writes(&self, fail: bool) -> &Self {
        self.fail_group_writes.set(fail);
        self
    }

    pub fn set_fail_membership_queries(&self, fail: bool) -> &Self {
        self.fail_membership_queries.set(fail);
        self
    }

    pub fn capability_reads(&self) -> usize {
        self.capability_reads.get()
    }

    pub fn single_membership_queries(&self) -> usize {
        self.single_membership_queries.get()
    }

    pub fn bulk_membership_queries(&self) -> usize {
        self.bulk_membership_queries.get()
    }

    pub fn user_writes(&self) -> usize {
        self.user_writes.get()
    }

    pub fn reset_counters(&self) {
        self.capability_reads.set(0);
        self.single_membership_queries.set(0);
        self.bulk_membership_queries.set(0);
        self.user_writes.set(0);
    }

    fn check_membership_queries(&self) -> Result<(), CapaError> {
        if self.fail_membership_queries.get() {
            return Err(CapaError::Persistence("membership store unavailable".into()));
        }
        Ok(())
    }
}

impl GroupCapabilityStore for InMemoryDirectory {
    fn load_capabilities(&self, group: GroupId) -> Result<Option<String>, CapaError> {
        bump(&self.capability_reads);
        self.groups.borrow().get(&group).cloned().ok_or(CapaError::GroupNotFound(group))
    }

    fn save_capabilities(&self, group: GroupId, blob: &str) -> Result<(), CapaError> {
        if self.fail_group_writes.get() {
            return Err(CapaError::Persistence(format!("write rejected for {}", group)));
        }
        match self.groups.borrow_mut().get_mut(&group) {
            Some(slot) => {
                *slot = Some(blob.to_string());
                Ok(())
            }
            None => Err(CapaError::GroupNotFound(group)),
        }
    }
}

impl MembershipStore for InMemoryDirectory {
    fn groups_of_user(&self, user: UserId) -> Result<Vec<GroupId>, CapaError> {
        self.check_membership_queries()?;
        bump(&self.single_membership_queries);
        Ok(self.memberships.borrow().iter().filter(|m| m.user_id == user).map(|m| m.group_id).collect())
    }

    fn memberships_of_users(&self, users: &BTreeSet<UserId>) -> Result<Vec<Membership>, CapaError> {
        self.check_membership_queries()?;
        bump(&self.bulk_membership_queries);
        Ok(self.memberships.borrow().iter().filter(|m| users.contains(&m.user_id)).copied().collect())
    }

    fn users_of_group(&self, group: GroupId) -> Result<Vec<UserId>, CapaError> {
        self.check_membership_queries()?;
        if !self.groups.borrow().contains_key(&group) {
            return Err(CapaError::GroupNotFound(group));
        }
        Ok(self.memberships.borrow().iter().filter(|m| m.group_id == group).map(|m| m.user_id).collect())
    }
}

impl UserStore for InMemoryDirectory {
    fn load_user(&self, id: UserId) -> Result<User, CapaError> {
        self.user(id).ok_or(CapaError::UserNotFound(id))
    }

    fn load_users(&self, ids: &BTreeSet<UserId>) -> Result<Vec<User>, CapaError> {
        let users = self.users.borrow();
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    fn all_user_ids(&self) -> Result<Vec<UserId>, CapaError> {
        Ok(self.users.borrow().keys().copied().collect())
    }

    fn save_user(&self, user: &User) -> Result<(), CapaError> {
        if self.failing_user_writes.borrow().contains(&user.id) {
            return Err(CapaError::Persistence(format!("write rejected for {}", user.id)));
        }
        bump(&self.user_writes);
        self.users.borrow_mut().insert(user.id, user.clone());
        Ok(())
    }
}
