//! Batch-scoped memoization of `GroupId → capability names`.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use crate::error::CapaError;
use crate::store::decode_capability_blob;
use crate::types::{CapabilityName, GroupId};

/// Group capability cache for one resolution batch.
///
/// An instance lives exactly as long as the batch that created it, so a group's
/// capabilities are read at most once per batch and every user in the batch sees the
/// same value. Writes made by concurrent operations show up in the next batch.
#[derive(Debug, Default, Clone)]
pub struct GroupCapabilityCache {
    entries: HashMap<GroupId, BTreeSet<CapabilityName>>,
    store_reads: usize,
}

impl GroupCapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the capability names of `group`, calling `loader` on the first lookup.
    ///
    /// Stored data is decoded defensively: missing, empty or malformed blobs give an
    /// empty set, and a group the store no longer knows about is treated the same way.
    /// Any other loader error is returned and nothing is cached for the group.
    pub fn get<F>(&mut self, group: GroupId, loader: F) -> Result<&BTreeSet<CapabilityName>, CapaError>
    where
        F: FnOnce(GroupId) -> Result<Option<String>, CapaError>,
    {
        match self.entries.entry(group) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                self.store_reads += 1;
                let raw = match loader(group) {
                    Ok(raw) => raw,
                    Err(CapaError::GroupNotFound(_)) => {
                        tracing::debug!(%group, "membership references a missing group, no capabilities");
                        None
                    }
                    Err(e) => return Err(e),
                };
                let names = match decode_capability_blob(raw.as_deref()) {
                    Ok(names) => names.into_iter().collect(),
                    Err(e) => {
                        tracing::warn!(%group, error = %e, "malformed capability data on group, treating as empty");
                        BTreeSet::new()
                    }
                };
                Ok(slot.insert(names))
            }
        }
    }

    /// Replaces the cached entry for `group` with a known-fresh value.
    pub fn insert<I>(&mut self, group: GroupId, names: I)
    where
        I: IntoIterator<Item = CapabilityName>,
    {
        self.entries.insert(group, names.into_iter().collect());
    }

    /// Drops the cached entry for `group`; the next lookup goes to the store again.
    pub fn invalidate(&mut self, group: GroupId) -> bool {
        self.entries.remove(&group).is_some()
    }

    pub fn contains(&self, group: GroupId) -> bool {
        self.entries.contains_key(&group)
    }

    /// Number of times a loader was invoked by this cache.
    pub fn store_reads(&self) -> usize {
        self.store_reads
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn names(list: &[&str]) -> BTreeSet<CapabilityName> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_second_lookup_is_served_from_cache() {
        let calls = Cell::new(0);
        let loader = |_g: GroupId| {
            calls.set(calls.get() + 1);
            Ok(Some(r#"["Mail"]"#.to_string()))
        };
        let mut cache = GroupCapabilityCache::new();
        let g = GroupId::from_u128(1);

        let first = cache.get(g, loader).unwrap().clone();
        let second = cache.get(g, loader).unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(first, names(&["Mail"]));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.store_reads(), 1);
    }

    #[test]
    fn test_malformed_blob_resolves_to_empty() {
        let mut cache = GroupCapabilityCache::new();
        let got = cache.get(GroupId::from_u128(2), |_| Ok(Some("{oops".into()))).unwrap();
        assert!(got.is_empty());
        assert!(cache.contains(GroupId::from_u128(2)));
    }

    #[test]
    fn test_missing_group_resolves_to_empty() {
        let mut cache = GroupCapabilityCache::new();
        let g = GroupId::from_u128(3);
        let got = cache.get(g, |g| Err(CapaError::GroupNotFound(g))).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_store_failure_is_not_cached() {
        let mut cache = GroupCapabilityCache::new();
        let g = GroupId::from_u128(4);
        let err = cache.get(g, |_| Err(CapaError::Persistence("down".into()))).unwrap_err();
        assert_eq!(err, CapaError::Persistence("down".into()));
        assert!(!cache.contains(g));

        let got = cache.get(g, |_| Ok(Some(r#"["Files"]"#.into()))).unwrap();
        assert_eq!(got, &names(&["Files"]));
    }

    #[test]
    fn test_insert_and_invalidate() {
        let mut cache = GroupCapabilityCache::new();
        let g = GroupId::from_u128(5);
        cache.insert(g, vec!["Contacts".to_string()]);
        let got = cache.get(g, |_| panic!("seeded entry must not hit the store")).unwrap();
        assert_eq!(got, &names(&["Contacts"]));
        assert_eq!(cache.store_reads(), 0);

        assert!(cache.invalidate(g));
        assert!(!cache.invalidate(g));
        assert!(cache.is_empty());
    }
}
