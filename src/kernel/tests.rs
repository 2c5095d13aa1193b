#![cfg(test)]

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::CapaError;
use crate::kernel::{CapabilityEngine, ResolutionBatch};
use crate::resolution::ApplyOutcome;
use crate::testkit::{example_catalog, InMemoryDirectory};
use crate::types::{GroupId, UserId, UserRole};

// --- Test Utilities ---

const G1: GroupId = GroupId::from_u128(0x100);
const G2: GroupId = GroupId::from_u128(0x200);
const U: UserId = UserId::from_u128(1);
const V: UserId = UserId::from_u128(2);
const W: UserId = UserId::from_u128(3);

fn engine_with(directory: InMemoryDirectory) -> CapabilityEngine<InMemoryDirectory> {
    CapabilityEngine::new(Arc::new(example_catalog().unwrap()), directory, EngineConfig::default())
}

/// G1 = [Mail], G2 = [Files]; U in {G1, G2}, V in {G1}, W in nothing.
fn example_directory() -> InMemoryDirectory {
    let dir = InMemoryDirectory::new();
    dir.add_group(G1, &["Mail"])
        .add_group(G2, &["Files"])
        .add_user(U, UserRole::NormalUser)
        .add_user(V, UserRole::NormalUser)
        .add_user(W, UserRole::NormalUser)
        .add_member(U, G1)
        .add_member(U, G2)
        .add_member(V, G1);
    dir
}

fn users(ids: &[UserId]) -> BTreeSet<UserId> {
    ids.iter().copied().collect()
}

// --- Single-user path ---

#[test]
fn test_recompute_user_uses_single_membership_query() {
    let engine = engine_with(example_directory());

    let outcome = engine.recompute_user(U).unwrap();

    assert_eq!(outcome, ApplyOutcome::Updated { toggled: 3 });
    let dir = engine.directory();
    assert_eq!(dir.single_membership_queries(), 1);
    assert_eq!(dir.bulk_membership_queries(), 0);
    let u = dir.user(U).unwrap();
    assert_eq!(u.module_flag("Mail"), Some(true));
    assert_eq!(u.module_flag("MailDomains"), Some(true));
    assert_eq!(u.module_flag("Files"), Some(true));
}

#[test]
fn test_recompute_unknown_user_is_not_found() {
    let engine = engine_with(example_directory());
    let ghost = UserId::from_u128(99);
    assert_eq!(engine.recompute_user(ghost), Err(CapaError::UserNotFound(ghost)));
}

#[test]
fn test_recompute_user_twice_is_idempotent() {
    let engine = engine_with(example_directory());
    engine.recompute_user(V).unwrap();
    let first = engine.directory().user(V).unwrap();

    assert_eq!(engine.recompute_user(V).unwrap(), ApplyOutcome::Unchanged);
    assert_eq!(engine.directory().user(V).unwrap(), first);
    assert_eq!(engine.directory().user_writes(), 1);
}

// --- Batch path ---

#[test]
fn test_batch_reads_each_group_once() {
    let engine = engine_with(example_directory());

    let report = engine.recompute_users(&users(&[U, V, W])).unwrap();

    assert_eq!(report.requested, 3);
    assert_eq!(report.processed(), 3);
    assert!(report.is_clean());
    let dir = engine.directory();
    // U and V share G1, yet G1 is read once.
    assert_eq!(dir.capability_reads(), 2);
    assert_eq!(dir.bulk_membership_queries(), 1);
    assert_eq!(dir.single_membership_queries(), 0);
}

#[test]
fn test_batch_matches_worked_example() {
    let engine = engine_with(example_directory());
    engine.recompute_users(&users(&[U, V])).unwrap();

    let u = engine.directory().user(U).unwrap();
    let v = engine.directory().user(V).unwrap();
    assert_eq!((u.module_flag("Mail"), u.module_flag("MailDomains"), u.module_flag("Files")), (Some(true), Some(true), Some(true)));
    assert_eq!((v.module_flag("Mail"), v.module_flag("MailDomains"), v.module_flag("Files")), (Some(true), Some(true), Some(false)));
}

#[test]
fn test_user_without_groups_gets_everything_disabled() {
    let engine = engine_with(example_directory());
    engine.recompute_users(&users(&[W])).unwrap();
    let w = engine.directory().user(W).unwrap();
    assert_eq!(w.module_enablement.len(), 3);
    assert!(w.module_enablement.values().all(|on| !on));
}

#[test]
fn test_one_failing_user_does_not_abort_the_batch() {
    let dir = example_directory();
    dir.fail_writes_for(U);
    let engine = engine_with(dir);

    let report = engine.recompute_users(&users(&[U, V])).unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, U);
    assert!(matches!(report.failed[0].1, CapaError::Persistence(_)));
    assert_eq!(report.updated, vec![V]);
    assert_eq!(engine.directory().user(V).unwrap().module_flag("Mail"), Some(true));
}

#[test]
fn test_missing_users_are_reported_not_failed() {
    let engine = engine_with(example_directory());
    let ghost = UserId::from_u128(42);

    let report = engine.recompute_users(&users(&[V, ghost])).unwrap();

    assert_eq!(report.missing, vec![ghost]);
    assert!(report.is_clean());
    assert_eq!(report.updated, vec![V]);
}

#[test]
fn test_empty_batch_touches_no_store() {
    let engine = engine_with(example_directory());
    let report = engine.recompute_users(&BTreeSet::new()).unwrap();
    assert_eq!(report.requested, 0);
    assert_eq!(engine.directory().bulk_membership_queries(), 0);
    assert_eq!(engine.directory().capability_reads(), 0);
}

#[test]
fn test_membership_outage_fails_the_whole_batch() {
    let dir = example_directory();
    dir.set_fail_membership_queries(true);
    let engine = engine_with(dir);
    assert!(matches!(engine.recompute_users(&users(&[U])), Err(CapaError::Persistence(_))));
}

#[test]
fn test_malformed_group_grants_nothing_but_others_still_resolve() {
    let dir = example_directory();
    let broken = GroupId::from_u128(0x300);
    dir.add_group_raw(broken, Some("[\"Mail\", oops"));
    dir.add_member(W, broken);
    dir.add_member(W, G2);
    let engine = engine_with(dir);

    let report = engine.recompute_users(&users(&[W])).unwrap();

    assert!(report.is_clean());
    let w = engine.directory().user(W).unwrap();
    assert_eq!(w.module_flag("Mail"), Some(false));
    assert_eq!(w.module_flag("Files"), Some(true));
}

#[test]
fn test_recompute_group_uses_seeded_names() {
    let engine = engine_with(example_directory());
    let fresh = vec!["Files".to_string()];

    // The store still says [Mail]; the seeded value wins for this batch.
    let report = engine.recompute_group(G1, Some(&fresh)).unwrap();

    assert_eq!(report.requested, 2);
    let v = engine.directory().user(V).unwrap();
    assert_eq!(v.module_flag("Files"), Some(true));
    assert_eq!(v.module_flag("Mail"), Some(false));
    // G1 was seeded, only G2 (held by U) was read.
    assert_eq!(engine.directory().capability_reads(), 1);
}

#[test]
fn test_recompute_all_covers_every_user() {
    let engine = engine_with(example_directory());
    let report = engine.recompute_all().unwrap();
    assert_eq!(report.requested, 3);
    assert_eq!(report.updated.len(), 3);
}

#[test]
fn test_cold_batch_falls_back_to_single_query() {
    let engine = engine_with(example_directory());
    let mut batch = ResolutionBatch::cold();

    let patch = engine.resolve_user(V, &mut batch).unwrap();

    assert_eq!(patch.get("Mail"), Some(true));
    assert_eq!(engine.directory().single_membership_queries(), 1);
    assert!(batch.cache().contains(G1));
}

#[test]
fn test_modules_outside_catalog_survive_recompute() {
    let dir = example_directory();
    let mut v = dir.user(V).unwrap();
    v.set_module("Calendar", true);
    dir.put_user(v);
    let engine = engine_with(dir);

    engine.recompute_user(V).unwrap();

    assert_eq!(engine.directory().user(V).unwrap().module_flag("Calendar"), Some(true));
}
