//! # Inventory Session Demo
//!
//! Drives a scripted session against the simulated authority.
//!
//! Run with: `cargo run --bin inventory_session [config.toml]`

use std::sync::Arc;

use serde_json::json;

use satchel::inventory::{CatalogEntry, ContainerKind, ItemCatalog};
use satchel::sync::{DragSource, DropTarget, SimulatedAuthority};
use satchel::{EngineConfig, InboundPush, PushBus, Session};

fn load_config() -> EngineConfig {
    let Some(path) = std::env::args().nth(1) else {
        return EngineConfig::default();
    };
    match EngineConfig::from_file(&path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}; using defaults");
            EngineConfig::default()
        }
    }
}

/// What the authority knows about items.
fn authority_catalog() -> ItemCatalog {
    let mut lockpick = CatalogEntry::new("lockpick", 20.0, true);
    lockpick.label = Some("Lockpick".to_owned());
    ItemCatalog::with_entries([
        CatalogEntry::new("water", 100.0, true),
        CatalogEntry::new("bread", 50.0, true),
        CatalogEntry::new("metalscrap", 10.0, true),
        CatalogEntry::new("plastic", 10.0, true),
        lockpick,
    ])
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = load_config();
    satchel::init_logging(&config.log_filter);

    let authority = Arc::new(SimulatedAuthority::new(
        config.authority.conditions(),
        authority_catalog(),
        config.authority.seed,
    ));
    let session = Session::new(&config, Arc::clone(&authority), ItemCatalog::new());
    let bus = PushBus::new(config.push_capacity);
    let pushes = bus.sender();

    pushes.send(InboundPush::new(
        "init",
        json!({ "items": { "water": { "weight": 100 }, "bread": { "weight": 50 } } }),
    ));
    pushes.send(InboundPush::new(
        "setupInventory",
        json!({
            "leftInventory": {
                "id": "char-1", "type": "player", "slots": 20, "maxWeight": 30000,
                "items": [
                    { "slot": 1, "name": "water", "count": 6, "weight": 600 },
                    { "slot": 2, "name": "metalscrap", "count": 9, "weight": 90 },
                    { "slot": 3, "name": "plastic", "count": 4, "weight": 40 }
                ]
            },
            "rightInventory": {
                "id": "stash-7", "type": "stash", "slots": 10,
                "items": [ { "slot": 1, "name": "bread", "count": 2, "weight": 100 } ]
            }
        }),
    ));
    let report = session.pump(&bus.receiver()).await;
    tracing::info!(applied = report.applied, skipped = report.skipped, "initial pushes applied");

    let player = DragSource::new(ContainerKind::Player, 1);
    for target_slot in 2..=4 {
        session.set_drag_quantity(2);
        let target = DropTarget::new(ContainerKind::Other("stash".to_owned()), target_slot);
        match session.drop_item(&player, &target).await {
            Ok(completion) => tracing::info!(?completion, target_slot, "transfer finished"),
            Err(error) => tracing::info!(%error, target_slot, "transfer not sent"),
        }
    }

    pushes.send(InboundPush::new(
        "setupInventory",
        json!({
            "rightInventory": {
                "id": "bench-1", "type": "crafting", "slots": 4, "index": 1,
                "items": [ { "slot": 1, "name": "lockpick", "count": 1, "weight": 20,
                             "duration": 4000, "ingredients": { "metalscrap": 3, "plastic": 1 } } ]
            }
        }),
    ));
    session.pump(&bus.receiver()).await;

    match session.craft(1, None, Some(10)).await {
        Ok(completion) => tracing::info!(?completion, "craft finished"),
        Err(error) => tracing::info!(%error, "craft not sent"),
    }

    let stats = session.stats();
    session.inspect(|client| {
        tracing::info!(
            left_weight = client.left().total_weight(),
            right = %client.right().id,
            catalog = client.catalog().len(),
            "session state"
        );
    });
    tracing::info!(
        sent = stats.requests_sent.load(std::sync::atomic::Ordering::Relaxed),
        refused = stats.refused.load(std::sync::atomic::Ordering::Relaxed),
        operations = ?authority.operations(),
        "demo complete"
    );
}
