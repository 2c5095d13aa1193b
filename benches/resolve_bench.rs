use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::collections::BTreeSet;
use std::sync::Arc;

use capa_core::testkit::InMemoryDirectory;
use capa_core::{CapabilityEngine, Catalog, EngineConfig, GroupId, KeyLocalizer, UserId, UserRole};

const USERS: u128 = 500;
const GROUPS: u128 = 20;

fn populated_engine() -> CapabilityEngine<InMemoryDirectory> {
    let dir = InMemoryDirectory::new();
    let pool = ["Mail", "Files", "Contacts"];
    for g in 0..GROUPS {
        dir.add_group(GroupId::from_u128(g), &[pool[(g % 3) as usize]]);
    }
    for u in 0..USERS {
        let user = UserId::from_u128(1_000 + u);
        dir.add_user(user, UserRole::NormalUser);
        dir.add_member(user, GroupId::from_u128(u % GROUPS));
        dir.add_member(user, GroupId::from_u128((u * 7) % GROUPS));
    }
    let catalog = Catalog::standard(&KeyLocalizer).expect("standard catalog");
    CapabilityEngine::new(Arc::new(catalog), dir, EngineConfig::default())
}

fn resolve_benchmarks(c: &mut Criterion) {
    let all: BTreeSet<UserId> = (0..USERS).map(|u| UserId::from_u128(1_000 + u)).collect();

    c.bench_function("batch_recompute_500_users", |b| {
        b.iter_batched(populated_engine, |engine| engine.recompute_users(&all), BatchSize::LargeInput)
    });

    c.bench_function("single_user_recompute_loop_500_users", |b| {
        b.iter_batched(
            populated_engine,
            |engine| {
                for user in &all {
                    let _ = engine.recompute_user(*user);
                }
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, resolve_benchmarks);
criterion_main!(benches);
