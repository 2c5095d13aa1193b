#![no_main]

// Harness: resolve_patch – arbitrary groups and memberships.
// Invariants: the patch always covers exactly the catalog modules, and reversing the
// group order never changes it.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use capa_core::resolution::{resolve_patch, GroupCapabilityCache};
use capa_core::store::encode_capability_blob;
use capa_core::{CapaError, Catalog, GroupId, KeyLocalizer};

#[derive(Arbitrary, Debug)]
struct Input {
    /// Capability names per group; group id is the index.
    groups: Vec<Vec<String>>,
    /// Group indices the user belongs to.
    member_of: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let catalog = match Catalog::standard(&KeyLocalizer) {
        Ok(catalog) => catalog,
        Err(_) => return,
    };
    let load = |g: GroupId| -> Result<Option<String>, CapaError> {
        match input.groups.get(g.0.as_u128() as usize) {
            Some(names) => encode_capability_blob(names).map(Some),
            None => Err(CapaError::GroupNotFound(g)),
        }
    };

    let forward: Vec<GroupId> = input.member_of.iter().map(|i| GroupId::from_u128(*i as u128)).collect();
    let mut backward = forward.clone();
    backward.reverse();

    let a = resolve_patch(&catalog, &forward, &mut GroupCapabilityCache::new(), load).expect("resolves");
    let b = resolve_patch(&catalog, &backward, &mut GroupCapabilityCache::new(), load).expect("resolves");

    assert_eq!(a, b);
    assert_eq!(a.len(), catalog.all_modules().len());
});
