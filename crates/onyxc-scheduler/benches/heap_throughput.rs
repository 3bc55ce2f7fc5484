//! Throughput of the entity heap under the insert/remove churn a real
//! compilation produces: every dispatch pops one entity and typically
//! re-inserts it (or a handful of new entities it spawned) right away.
//!
//! Run with: cargo bench --package onyxc-scheduler

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use onyxc_entity::{EntityKind, EntityPayload, EntityState, EntityTemplate};
use onyxc_registries::ScopeTable;
use onyxc_scheduler::EntityHeap;
use onyxc_text::Position;

fn template(state: EntityState) -> EntityTemplate {
    let scope = ScopeTable::new().create_root("bench");
    EntityTemplate {
        kind: EntityKind::Binding,
        state,
        package: None,
        scope,
        payload: EntityPayload::Opaque,
        position: Position::internal(),
        source_span: None,
    }
}

fn fill(heap: &mut EntityHeap, n: usize) {
    let states = [
        EntityState::Parse,
        EntityState::IntroduceSymbols,
        EntityState::ResolveSymbols,
        EntityState::CheckTypes,
        EntityState::CodeGen,
    ];
    for i in 0..n {
        heap.insert(template(states[i % states.len()]));
    }
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for size in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut heap = EntityHeap::new();
                fill(&mut heap, size);
                heap
            });
        });
    }
    group.finish();
}

fn bench_dispatch_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_churn");
    for size in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut heap = EntityHeap::new();
            fill(&mut heap, size);
            b.iter(|| {
                let mut entity = heap.remove_top().unwrap();
                entity.macro_attempts += 1;
                heap.insert_existing(entity);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_dispatch_churn);
criterion_main!(benches);
