//! Resolution batch context.
//!
//! A batch bundles the group capability cache with memberships prefetched for the
//! users it covers. It is created by one trigger, used for the users of that trigger
//! and then dropped; nothing in it outlives the call.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CapaError;
use crate::resolution::{GroupCapabilityCache, MembershipResolver};
use crate::store::MembershipStore;
use crate::types::{CapabilityName, GroupId, UserId};

#[derive(Debug, Default, Clone)]
pub struct ResolutionBatch {
    cache: GroupCapabilityCache,
    memberships: BTreeMap<UserId, Vec<GroupId>>,
}

impl ResolutionBatch {
    /// A batch with a cold cache and no prefetched memberships.
    pub fn cold() -> Self {
        Self::default()
    }

    /// A batch whose memberships for `users` were fetched in one bulk query.
    pub fn prefetch<M>(store: &M, users: &BTreeSet<UserId>) -> Result<Self, CapaError>
    where
        M: MembershipStore + ?Sized,
    {
        let memberships = MembershipResolver::new(store).resolve_batch(users)?;
        Ok(ResolutionBatch { cache: GroupCapabilityCache::new(), memberships })
    }

    /// Prefetched groups of `user`, `None` if the user was not part of the prefetch.
    pub fn groups_of(&self, user: UserId) -> Option<&[GroupId]> {
        self.memberships.get(&user).map(Vec::as_slice)
    }

    /// Seeds the cache with a value just written to the store, so the batch never
    /// reads it back.
    pub fn seed_group(&mut self, group: GroupId, names: impl IntoIterator<Item = CapabilityName>) {
        self.cache.insert(group, names);
    }

    pub fn cache(&self) -> &GroupCapabilityCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut GroupCapabilityCache {
        &mut self.cache
    }
}
