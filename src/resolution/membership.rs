//! Group membership lookups, single-user and batched.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CapaError;
use crate::store::MembershipStore;
use crate::types::{GroupId, UserId};

/// Resolves the groups users belong to.
///
/// The batched path issues one bulk query for the whole user set and partitions the
/// rows in memory, instead of one query per user.
#[derive(Debug, Clone, Copy)]
pub struct MembershipResolver<'a, M: MembershipStore + ?Sized> {
    store: &'a M,
}

impl<'a, M: MembershipStore + ?Sized> MembershipResolver<'a, M> {
    pub fn new(store: &'a M) -> Self {
        MembershipResolver { store }
    }

    /// Groups of a single user.
    pub fn resolve_one(&self, user: UserId) -> Result<Vec<GroupId>, CapaError> {
        let mut groups = self.store.groups_of_user(user)?;
        dedup_in_order(&mut groups);
        Ok(groups)
    }

    /// Groups of every user in `users`.
    ///
    /// Every requested user gets an entry, empty when they belong to no group. Rows the
    /// store returns for users outside the request are dropped. An empty request never
    /// touches the store.
    pub fn resolve_batch(&self, users: &BTreeSet<UserId>) -> Result<BTreeMap<UserId, Vec<GroupId>>, CapaError> {
        if users.is_empty() {
            return Ok(BTreeMap::new());
        }

        let rows = self.store.memberships_of_users(users)?;
        let mut by_user: BTreeMap<UserId, Vec<GroupId>> =
            users.iter().map(|u| (*u, Vec::new())).collect();

        for row in rows {
            if let Some(groups) = by_user.get_mut(&row.user_id) {
                groups.push(row.group_id);
            }
        }
        for groups in by_user.values_mut() {
            dedup_in_order(groups);
        }

        tracing::debug!(users = users.len(), "memberships resolved in one bulk query");
        Ok(by_user)
    }
}

fn dedup_in_order(groups: &mut Vec<GroupId>) {
    let mut seen = BTreeSet::new();
    groups.retain(|g| seen.insert(*g));
}
