//! Benchmark for the optimistic write path.
//!
//! Run with: cargo bench --package satchel_sync --bench ledger_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use satchel_inventory::operators::move_slots;
use satchel_inventory::{CatalogEntry, Container, ContainerKind, Endpoint, ItemCatalog, ItemInstance, RootState, Slot, SlotRef};
use satchel_sync::{ClientConfig, ConfirmationLedger, DragSource, DropTarget, InventoryClient, Outcome, PushEvent};

fn create_state(slots: u32) -> RootState {
    let items = (1..=slots / 2).map(|i| Slot::occupied(i, ItemInstance::new(format!("material_{i}"), Some(50), 500.0)));
    RootState::new(
        Container::with_slots("char-1", ContainerKind::Player, slots, items),
        Container::new("stash", ContainerKind::Container, slots),
    )
}

fn benchmark_apply_and_rollback(c: &mut Criterion) {
    let base = create_state(120);

    c.bench_function("ledger_apply_commit_120", |b| {
        let mut ledger = ConfirmationLedger::new();
        b.iter(|| {
            let mut state = base.clone();
            let ticket = ledger
                .apply(&mut state, "swapItems", |s| {
                    move_slots(s, SlotRef::new(Endpoint::Left, 1), SlotRef::new(Endpoint::Right, 1), 10, 0)
                })
                .unwrap();
            black_box(ledger.commit(ticket))
        });
    });

    c.bench_function("ledger_apply_rollback_120", |b| {
        let mut ledger = ConfirmationLedger::new();
        b.iter(|| {
            let mut state = base.clone();
            let ticket = ledger
                .apply(&mut state, "swapItems", |s| {
                    move_slots(s, SlotRef::new(Endpoint::Left, 1), SlotRef::new(Endpoint::Right, 1), 10, 0)
                })
                .unwrap();
            black_box(ledger.rollback(ticket, &mut state))
        });
    });
}

fn benchmark_client_round_trip(c: &mut Criterion) {
    let catalog = ItemCatalog::with_entries((1..=60).map(|i| CatalogEntry::new(format!("material_{i}"), 10.0, true)));
    let mut client = InventoryClient::new(ClientConfig::default(), catalog);
    let state = create_state(120);
    client.apply_push(
        PushEvent::decode(
            "setupInventory",
            json!({ "leftInventory": state.left, "rightInventory": state.right }),
        )
        .unwrap(),
    );
    let source = DragSource::new(ContainerKind::Player, 1);
    let target = DropTarget::new(ContainerKind::Container, 1);

    c.bench_function("client_drop_then_refuse", |b| {
        b.iter(|| {
            let dispatch = client.drop_item(&source, &target).unwrap();
            let ticket = dispatch.ticket.unwrap();
            black_box(client.settle(ticket, &Outcome::Rejected(satchel_sync::RejectReason::Refused(None))))
        });
    });
}

criterion_group!(benches, benchmark_apply_and_rollback, benchmark_client_round_trip);
criterion_main!(benches);
