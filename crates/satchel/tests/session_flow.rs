//! End-to-end session tests against the simulated authority.

use std::sync::Arc;

use serde_json::json;

use satchel::inventory::{CatalogEntry, ContainerKind, ItemCatalog};
use satchel::sync::{DragSource, DropTarget, IntentAbort, RejectReason, SimulatedAuthority, Verdict};
use satchel::{Completion, EngineConfig, InboundPush, PushBus, Session, SessionError};

fn authority() -> Arc<SimulatedAuthority> {
    Arc::new(SimulatedAuthority::perfect(ItemCatalog::with_entries([
        CatalogEntry::new("water", 100.0, true),
        CatalogEntry::new("bread", 50.0, true),
        CatalogEntry::new("radio", 200.0, false),
    ])))
}

fn config() -> EngineConfig {
    EngineConfig {
        request_timeout_ms: 50,
        ..EngineConfig::default()
    }
}

async fn session(authority: &Arc<SimulatedAuthority>) -> Session<SimulatedAuthority> {
    let catalog = ItemCatalog::with_entries([
        CatalogEntry::new("water", 100.0, true),
        CatalogEntry::new("bread", 50.0, true),
    ]);
    let session = Session::new(&config(), Arc::clone(authority), catalog);
    session
        .apply_push(
            "setupInventory",
            json!({
                "leftInventory": {
                    "id": "char-1", "type": "player", "slots": 10,
                    "items": [ { "slot": 1, "name": "water", "count": 5, "weight": 500 } ]
                },
                "rightInventory": {
                    "id": "trunk-3", "type": "trunk", "slots": 4,
                    "items": [ { "slot": 1, "name": "bread", "count": 1, "weight": 50 } ]
                }
            }),
        )
        .await
        .unwrap();
    session
}

fn drop_on_trunk(slot: u32) -> (DragSource, DropTarget) {
    (
        DragSource::new(ContainerKind::Player, 1),
        DropTarget::new(ContainerKind::Other("trunk".into()), slot),
    )
}

#[tokio::test]
async fn test_confirmed_transfer_keeps_write() {
    let authority = authority();
    let session = session(&authority).await;
    let (source, target) = drop_on_trunk(2);

    let completion = session.drop_item(&source, &target).await.unwrap();
    assert!(matches!(completion, Completion::Confirmed(_)));
    assert!(completion.is_confirmed());
    session.inspect(|client| {
        assert!(!client.is_busy());
        assert_eq!(client.right().item(2).and_then(|i| i.count), Some(5));
    });

    let received = authority.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].operation, "swapItems");
    assert_eq!(received[0].payload["toInventory"], "trunk-3");
}

#[tokio::test]
async fn test_refused_transfer_rolls_back_swap() {
    let authority = authority();
    let session = session(&authority).await;
    let before = session.inspect(|client| client.state().clone());
    authority.script([Verdict::Refuse(Some("too heavy".into()))]);

    let (source, target) = drop_on_trunk(1);
    let completion = session.drop_item(&source, &target).await.unwrap();
    assert!(matches!(
        completion,
        Completion::RolledBack { reason: RejectReason::Refused(Some(ref text)), .. } if text == "too heavy"
    ));
    session.inspect(|client| {
        assert_eq!(client.state(), &before);
        assert_eq!(client.right().item(1).map(|i| i.name.as_str()), Some("bread"));
    });
    assert_eq!(session.stats().refused.load(std::sync::atomic::Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_stalled_confirmation_times_out_and_rolls_back() {
    let authority = authority();
    let session = session(&authority).await;
    let before = session.inspect(|client| client.state().clone());
    authority.script([Verdict::Stall]);

    let (source, target) = drop_on_trunk(3);
    let completion = session.drop_item(&source, &target).await.unwrap();
    assert!(matches!(
        completion,
        Completion::RolledBack { reason: RejectReason::Transport(_), .. }
    ));
    session.inspect(|client| assert_eq!(client.state(), &before));
}

#[tokio::test]
async fn test_transport_failure_is_rejection() {
    let authority = authority();
    let session = session(&authority).await;
    authority.script([Verdict::Fail]);

    let (source, target) = drop_on_trunk(3);
    let completion = session.drop_item(&source, &target).await.unwrap();
    assert!(!completion.is_confirmed());
    session.inspect(|client| assert_eq!(client.left().item(1).and_then(|i| i.count), Some(5)));
}

#[tokio::test]
async fn test_aborted_intent_sends_nothing() {
    let authority = authority();
    let session = session(&authority).await;

    let empty = DragSource::new(ContainerKind::Player, 7);
    let (_, target) = drop_on_trunk(3);
    let error = session.drop_item(&empty, &target).await.unwrap_err();
    assert!(matches!(error, SessionError::Aborted(IntentAbort::EmptySource)));
    assert!(authority.received().is_empty());
}

#[tokio::test]
async fn test_unknown_items_are_fetched_after_refresh() {
    let authority = authority();
    let session = session(&authority).await;
    let (sender, receiver) = PushBus::create_pair(4);

    sender.send(InboundPush::new(
        "refreshSlots",
        json!({ "items": { "item": { "slot": 4, "name": "radio", "weight": 200 }, "inventory": "char-1" } }),
    ));
    sender.send(InboundPush::new("notAnEvent", json!({})));
    let report = session.pump(&receiver).await;

    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 1);
    session.inspect(|client| {
        let radio = client.catalog().get("radio").unwrap();
        assert!(!radio.stack);
    });
    assert_eq!(authority.operations(), vec!["getItemData".to_owned()]);
}

#[tokio::test]
async fn test_drop_fetches_item_the_authority_learned_late() {
    let authority_items = ItemCatalog::with_entries([
        CatalogEntry::new("water", 100.0, true),
        CatalogEntry::new("bread", 50.0, true),
    ]);
    let authority = Arc::new(SimulatedAuthority::perfect(authority_items.clone()));
    let session = session(&authority).await;
    session
        .apply_push(
            "refreshSlots",
            json!({ "items": { "item": { "slot": 2, "name": "radio", "count": 1, "weight": 200 }, "inventory": "char-1" } }),
        )
        .await
        .unwrap();
    session.inspect(|client| assert!(!client.catalog().contains("radio")));

    authority_items.insert(CatalogEntry::new("radio", 200.0, false));
    let completion = session
        .drop_item(
            &DragSource::new(ContainerKind::Player, 2),
            &DropTarget::new(ContainerKind::Other("trunk".into()), 3),
        )
        .await
        .unwrap();

    assert!(completion.is_confirmed());
    assert_eq!(authority.operations(), vec!["getItemData", "getItemData", "swapItems"]);
    session.inspect(|client| {
        assert!(!client.catalog().get("radio").unwrap().stack);
        assert_eq!(client.right().item(3).map(|i| i.name.as_str()), Some("radio"));
    });
}

#[tokio::test]
async fn test_refresh_with_malformed_strip_still_applies_slots() {
    let authority = authority();
    let session = session(&authority).await;
    let report = session
        .apply_push(
            "refreshSlots",
            json!({
                "items": [{ "item": { "slot": 3, "name": "water", "count": 2, "weight": 200 }, "inventory": "char-1" }],
                "leftUtility": { "slots": 2, "offset": 50, "items": [{ "slot": 51 }, null] },
            }),
        )
        .await
        .unwrap();

    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 0);
    session.inspect(|client| {
        assert_eq!(client.left().item(3).and_then(|i| i.count), Some(2));
        assert_eq!(client.left().utility.as_ref().map(|strip| strip.items.len()), Some(2));
    });
}

#[tokio::test]
async fn test_fire_and_forget_utility_release() {
    let authority = authority();
    let session = session(&authority).await;
    session
        .apply_push(
            "refreshSlots",
            json!({ "leftUtility": { "slots": 2, "offset": 50, "items": [ { "slot": 51 }, { "slot": 52 } ] } }),
        )
        .await
        .unwrap();

    let completion = session
        .drop_item(
            &DragSource::new(ContainerKind::Utility, 52),
            &DropTarget::new(ContainerKind::Player, 6),
        )
        .await
        .unwrap();
    assert!(matches!(completion, Completion::Sent { operation: "moveFromUtilitySlot", .. }));
    assert_eq!(authority.received()[0].payload, json!({ "utilitySlot": 2, "toSlot": 6 }));
}

#[tokio::test]
async fn test_malformed_push_is_an_error() {
    let authority = authority();
    let session = session(&authority).await;
    let error = session
        .apply_push("setContainerWeight", json!("heavy"))
        .await
        .unwrap_err();
    assert!(matches!(error, SessionError::Decode(_)));
}
