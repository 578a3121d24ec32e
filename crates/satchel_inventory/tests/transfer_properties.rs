//! Integration tests for the inventory model: wire normalisation, resolver,
//! rules and operators working on the same state.

use satchel_inventory::operators::{apply, classify, move_slots};
use satchel_inventory::resolver::resolve_transfer;
use satchel_inventory::rules::{can_purchase, find_available_slot, max_craftable, stack_compatible, HOTBAR_SLOTS};
use satchel_inventory::{
    CatalogEntry, Container, ContainerKind, CraftLimit, Endpoint, ItemCatalog, ReservationMap, RootState, SlotRef,
    TransferKind,
};
use serde_json::json;

fn setup() -> RootState {
    let left: Container = serde_json::from_value(json!({
        "id": "char-1",
        "type": "player",
        "slots": 12,
        "maxWeight": 30000,
        "items": [
            { "slot": 10, "name": "water", "count": 5, "weight": 500 },
            { "slot": 11, "name": "ammo-9", "count": 30, "weight": 30, "metadata": { "ammo": 3 } },
            { "slot": 12, "name": "iron", "count": 12, "weight": 120 },
        ],
        "backpack": {
            "id": "bag-1",
            "type": "backpack",
            "slots": 4,
            "items": [{ "slot": 1, "name": "copper", "count": 20, "weight": 200 }],
        },
    }))
    .unwrap();
    let right: Container = serde_json::from_value(json!({
        "id": "stash-7",
        "type": "stash",
        "slots": 6,
        "items": [{ "slot": 2, "name": "ammo-9", "count": 12, "weight": 12, "metadata": { "ammo": 3 } }],
    }))
    .unwrap();
    RootState::new(left, right)
}

#[test]
fn test_every_container_is_normalised() {
    let state = setup();
    for endpoint in Endpoint::ALL {
        let Some(container) = state.container(endpoint) else {
            continue;
        };
        assert_eq!(container.slots().len() as u32, container.slot_count());
        for (i, slot) in container.slots().iter().enumerate() {
            assert_eq!(slot.index, i as u32 + 1);
        }
    }
}

#[test]
fn test_split_water_between_containers() {
    let mut state = setup();
    let resolution = resolve_transfer(&state, &ContainerKind::Player, Some("char-1"), None, None);
    assert_eq!(resolution.target, Some(Endpoint::Right));

    let from = SlotRef::new(Endpoint::Left, 10);
    let to = SlotRef::new(Endpoint::Right, 1);
    move_slots(&mut state, from, to, 2, 0).unwrap();

    let source = state.left.item(10).unwrap();
    let dest = state.right.item(1).unwrap();
    assert_eq!((source.count, source.weight), (Some(3), 300.0));
    assert_eq!((dest.count, dest.weight), (Some(2), 200.0));
}

#[test]
fn test_ammo_stacks_across_containers() {
    let mut state = setup();
    let moving = state.left.item(11).unwrap().clone();
    let resting = state.right.item(2).unwrap().clone();
    assert!(stack_compatible(&moving, &resting));

    let entry = CatalogEntry::new("ammo-9", 1.0, true);
    let slot = find_available_slot(&moving, &entry, &state.right, false, HOTBAR_SLOTS);
    assert_eq!(slot, Some(2));

    let kind = classify(&moving, Some(&resting), entry.stack);
    assert_eq!(kind, TransferKind::Stack);
    apply(&mut state, kind, SlotRef::new(Endpoint::Left, 11), SlotRef::new(Endpoint::Right, 2), 30, 0).unwrap();
    assert_eq!(state.right.item(2).unwrap().count, Some(42));
    assert!(state.left.item(11).is_none());
}

#[test]
fn test_backpack_ingredients_feed_crafting() {
    let state = setup();
    let bench: Container = serde_json::from_value(json!({
        "id": "bench-1",
        "type": "crafting",
        "slots": 1,
        "items": [{ "slot": 1, "name": "pipe", "weight": 500, "ingredients": { "copper": 12 } }],
    }))
    .unwrap();
    let recipe = bench.item(1).unwrap();
    let storage = state.left.backpack.as_deref().unwrap();
    let catalog = ItemCatalog::new();

    assert_eq!(
        max_craftable(recipe, &ReservationMap::new(), storage, &catalog),
        CraftLimit::Limited(1)
    );
    let reserved = ReservationMap::from([("copper".to_owned(), 12.0)]);
    assert_eq!(max_craftable(recipe, &reserved, storage, &catalog), CraftLimit::Limited(0));
}

#[test]
fn test_sold_out_listing() {
    let state = setup();
    let shop: Container = serde_json::from_value(json!({
        "id": "shop-1",
        "type": "shop",
        "slots": 2,
        "items": [
            { "slot": 1, "name": "water", "count": 0, "weight": 100, "price": 5 },
            { "slot": 2, "name": "bread", "count": 9, "weight": 50, "price": 3 },
        ],
    }))
    .unwrap();
    assert!(!can_purchase(shop.item(1).unwrap(), &shop, state.left.groups.as_ref()));
    assert!(can_purchase(shop.item(2).unwrap(), &shop, state.left.groups.as_ref()));
}

#[test]
fn test_state_serializes_back_to_wire_form() {
    let state = setup();
    let value = serde_json::to_value(&state.left).unwrap();
    assert_eq!(value["slots"], json!(12));
    assert_eq!(value["items"].as_array().unwrap().len(), 12);
    assert_eq!(value["items"][9]["name"], json!("water"));

    let restored: Container = serde_json::from_value(value).unwrap();
    assert_eq!(restored, state.left);
}
