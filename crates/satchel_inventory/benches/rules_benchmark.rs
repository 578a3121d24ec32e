//! Benchmark for placement rules and transfer operators.
//!
//! Run with: cargo bench --package satchel_inventory --bench rules_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use satchel_inventory::operators::{move_slots, stack_slots};
use satchel_inventory::rules::{can_craft, find_available_slot, max_craftable, HOTBAR_SLOTS};
use satchel_inventory::{
    CatalogEntry, Container, ContainerKind, Endpoint, ItemCatalog, ItemInstance, ReservationMap, RootState, Slot,
    SlotRef,
};

fn create_player(slots: u32) -> Container {
    // Half the slots hold distinct materials, the other half stay free.
    let items = (1..=slots / 2).map(|i| {
        Slot::occupied(i, ItemInstance::new(format!("material_{i}"), Some(50), 50.0 * f64::from(i)))
    });
    Container::with_slots("char-1", ContainerKind::Player, slots, items)
}

fn benchmark_find_slot(c: &mut Criterion) {
    let player = create_player(120);
    let item = ItemInstance::new("material_55", Some(1), 55.0);
    let entry = CatalogEntry::new("material_55", 55.0, true);

    c.bench_function("find_available_slot_120", |b| {
        b.iter(|| black_box(find_available_slot(&item, &entry, &player, false, HOTBAR_SLOTS)));
    });
}

fn benchmark_craft_checks(c: &mut Criterion) {
    let player = create_player(120);
    let catalog = ItemCatalog::new();
    let recipe = ItemInstance::new("engine", None, 5000.0).with_ingredients((1..=8).map(|i| (format!("material_{i}"), 4.0)));
    let reserved: ReservationMap = (1..=4).map(|i| (format!("material_{i}"), 10.0)).collect();

    c.bench_function("can_craft_8_ingredients", |b| {
        b.iter(|| black_box(can_craft(&recipe, &ContainerKind::Crafting, &reserved, &player, &catalog)));
    });

    c.bench_function("max_craftable_8_ingredients", |b| {
        b.iter(|| black_box(max_craftable(&recipe, &reserved, &player, &catalog)));
    });
}

fn benchmark_operators(c: &mut Criterion) {
    let state = RootState::new(create_player(60), Container::new("stash", ContainerKind::Container, 60));
    let from = SlotRef::new(Endpoint::Left, 1);

    c.bench_function("move_split", |b| {
        b.iter(|| {
            let mut s = state.clone();
            black_box(move_slots(&mut s, from, SlotRef::new(Endpoint::Right, 10), 20, 0))
        });
    });

    c.bench_function("stack_merge", |b| {
        let mut merged = state.clone();
        move_slots(&mut merged, from, SlotRef::new(Endpoint::Right, 10), 10, 0).unwrap();
        b.iter(|| {
            let mut s = merged.clone();
            black_box(stack_slots(&mut s, from, SlotRef::new(Endpoint::Right, 10), 10, 0))
        });
    });
}

criterion_group!(benches, benchmark_find_slot, benchmark_craft_checks, benchmark_operators);
criterion_main!(benches);
