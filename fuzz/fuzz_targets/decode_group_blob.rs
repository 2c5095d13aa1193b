#![no_main]

// Harness: decode_group_blob – stored capability text never breaks resolution.
// Strategy: feed arbitrary text as a group's stored blob and resolve it through the
// cache. Must never error; a blob that decodes must yield exactly its names.

use libfuzzer_sys::fuzz_target;
use std::collections::BTreeSet;

use capa_core::resolution::GroupCapabilityCache;
use capa_core::store::decode_capability_blob;
use capa_core::GroupId;

fuzz_target!(|raw: String| {
    let mut cache = GroupCapabilityCache::new();
    let got = cache
        .get(GroupId::from_u128(1), |_| Ok(Some(raw.clone())))
        .expect("defensive decode never fails")
        .clone();

    match decode_capability_blob(Some(&raw)) {
        Ok(names) => assert_eq!(got, names.into_iter().collect::<BTreeSet<_>>()),
        Err(_) => assert!(got.is_empty()),
    }
});
