use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

use capa_core::resolution::GroupCapabilityCache;
use capa_core::store::decode_capability_blob;
use capa_core::testkit::{example_catalog, InMemoryDirectory};
use capa_core::{CapabilityEngine, EngineConfig, GroupId, UserId, UserRole};

/// Per user, the indices of the groups (out of 6) they belong to.
fn arb_memberships() -> impl Strategy<Value = Vec<BTreeSet<u8>>> {
    prop::collection::vec(prop::collection::btree_set(0u8..6, 0..4), 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Within one batch every distinct group is read exactly once, however many users
    /// share it.
    #[test]
    fn prop_batch_reads_each_group_once(memberships in arb_memberships()) {
        let dir = InMemoryDirectory::new();
        for g in 0u8..6 {
            let names: &[&str] = if g % 2 == 0 { &["Mail"] } else { &["Files"] };
            dir.add_group(GroupId::from_u128(g as u128), names);
        }
        let mut users = BTreeSet::new();
        let mut referenced = BTreeSet::new();
        for (i, groups) in memberships.iter().enumerate() {
            let user = UserId::from_u128(i as u128 + 1);
            dir.add_user(user, UserRole::NormalUser);
            users.insert(user);
            for g in groups {
                dir.add_member(user, GroupId::from_u128(*g as u128));
                referenced.insert(*g);
            }
        }
        let engine = CapabilityEngine::new(Arc::new(example_catalog().unwrap()), dir, EngineConfig::default());

        let report = engine.recompute_users(&users).unwrap();

        prop_assert!(report.is_clean());
        prop_assert_eq!(report.processed(), users.len());
        prop_assert_eq!(engine.directory().capability_reads(), referenced.len());
        prop_assert_eq!(engine.directory().bulk_membership_queries(), 1);
    }

    /// Arbitrary stored text never fails resolution; what does not decode is empty.
    #[test]
    fn prop_any_blob_resolves(raw in ".*") {
        let mut cache = GroupCapabilityCache::new();
        let expected: BTreeSet<String> = decode_capability_blob(Some(&raw))
            .map(|names| names.into_iter().collect())
            .unwrap_or_default();

        let got = cache.get(GroupId::from_u128(1), |_| Ok(Some(raw.clone()))).unwrap();
        prop_assert_eq!(got, &expected);
    }

    /// Repeated lookups of one group in a batch return identical sets.
    #[test]
    fn prop_cached_value_is_stable(names in prop::collection::vec("[A-Za-z]{1,8}", 0..6), lookups in 2usize..6) {
        let blob = serde_json::to_string(&names).unwrap();
        let mut cache = GroupCapabilityCache::new();
        let group = GroupId::from_u128(9);
        let first = cache.get(group, |_| Ok(Some(blob.clone()))).unwrap().clone();
        for _ in 1..lookups {
            let again = cache.get(group, |_| Ok(Some("[\"Changed\"]".to_string()))).unwrap();
            prop_assert_eq!(again, &first);
        }
        prop_assert_eq!(cache.store_reads(), 1);
    }
}
