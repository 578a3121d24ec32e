//! Inbound push events.
//!
//! The authority pushes `(event, payload)` pairs at any time. Decoding is
//! strict about the envelope and lenient inside a refresh batch: a
//! malformed slot entry is kept raw so the client can skip or coerce it,
//! and a malformed side field decodes as absent. The rest of the batch
//! still applies.

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use satchel_inventory::item::value_to_id;
use satchel_inventory::{CatalogEntry, Container, ContainerKind, QueueEntry, UtilityStrip};

/// Push event names.
pub mod event {
    /// Catalog and player container seed.
    pub const INIT: &str = "init";
    /// Full or partial container setup.
    pub const SETUP_INVENTORY: &str = "setupInventory";
    /// Per-slot refresh batch.
    pub const REFRESH_SLOTS: &str = "refreshSlots";
    /// Player backpack replacement.
    pub const SET_PLAYER_BACKPACK: &str = "setPlayerBackpack";
    /// Craft queue replacement.
    pub const UPDATE_CRAFT_QUEUE: &str = "updateCraftQueue";
    /// Blueprint map replacement.
    pub const UPDATE_BLUEPRINTS: &str = "updateBlueprints";
    /// Weight of the container item the open container lives in.
    pub const SET_CONTAINER_WEIGHT: &str = "setContainerWeight";
}

/// Errors decoding a push event.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The event name is not known.
    #[error("unknown push event '{0}'")]
    UnknownEvent(String),
    /// The payload does not match the event.
    #[error("malformed '{event}' payload: {source}")]
    Payload {
        /// The event name.
        event: String,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// One entry of a refresh batch.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotUpdate {
    /// Raw slot payload; may be a bare slot number.
    #[serde(default)]
    pub item: Value,
    /// Id of the addressed container.
    #[serde(default, deserialize_with = "optional_id")]
    pub inventory: Option<String>,
    /// Kind of the addressed container.
    #[serde(default)]
    pub inventory_type: Option<ContainerKind>,
}

/// Weight limit change.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightChange {
    /// Addressed container id.
    #[serde(deserialize_with = "required_id")]
    pub inventory_id: String,
    /// New limit.
    pub max_weight: f64,
}

/// Slot count change.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsChange {
    /// Addressed container id.
    #[serde(deserialize_with = "required_id")]
    pub inventory_id: String,
    /// New slot count.
    pub slots: u32,
}

/// Crafting experience update.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct XpUpdate {
    /// Current experience.
    pub xp: f64,
}

/// A `refreshSlots` payload; every part is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBatch {
    /// Slot updates; a single object or a list.
    #[serde(default, deserialize_with = "one_or_many")]
    pub items: Vec<SlotUpdate>,
    /// Global count deltas per item name.
    #[serde(default, deserialize_with = "lenient")]
    pub item_count: Option<BTreeMap<String, i64>>,
    /// Weight limit change.
    #[serde(default, deserialize_with = "lenient")]
    pub weight_data: Option<WeightChange>,
    /// Slot count change.
    #[serde(default, deserialize_with = "lenient")]
    pub slots_data: Option<SlotsChange>,
    /// Player utility strip replacement.
    #[serde(default, deserialize_with = "lenient")]
    pub left_utility: Option<UtilityStrip>,
    /// Opened container utility strip replacement.
    #[serde(default, deserialize_with = "lenient")]
    pub right_utility: Option<UtilityStrip>,
    /// Crafting experience.
    #[serde(default, deserialize_with = "lenient")]
    pub crafting_xp: Option<XpUpdate>,
}

/// Container setup.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    /// New player container.
    #[serde(default)]
    pub left_inventory: Option<Container>,
    /// New opened container.
    #[serde(default)]
    pub right_inventory: Option<Container>,
}

/// Catalog seed.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Init {
    /// Catalog entries keyed by name.
    #[serde(default)]
    pub items: HashMap<String, CatalogEntry>,
    /// Player container.
    #[serde(default)]
    pub left_inventory: Option<Container>,
}

/// A decoded push event.
#[derive(Clone, Debug, PartialEq)]
pub enum PushEvent {
    /// `init`
    Init(Init),
    /// `setupInventory`
    Setup(Setup),
    /// `refreshSlots`
    Refresh(RefreshBatch),
    /// `setPlayerBackpack`; `None` removes the backpack.
    LeftBackpack(Option<Container>),
    /// `updateCraftQueue`
    CraftQueue(Vec<QueueEntry>),
    /// `updateBlueprints`
    Blueprints(BTreeMap<String, bool>),
    /// `setContainerWeight`
    ContainerWeight(f64),
}

impl PushEvent {
    /// Event name on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => event::INIT,
            Self::Setup(_) => event::SETUP_INVENTORY,
            Self::Refresh(_) => event::REFRESH_SLOTS,
            Self::LeftBackpack(_) => event::SET_PLAYER_BACKPACK,
            Self::CraftQueue(_) => event::UPDATE_CRAFT_QUEUE,
            Self::Blueprints(_) => event::UPDATE_BLUEPRINTS,
            Self::ContainerWeight(_) => event::SET_CONTAINER_WEIGHT,
        }
    }

    /// Decodes an event from its name and payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for unknown names and payloads that do not
    /// match the event.
    pub fn decode(name: &str, payload: Value) -> Result<Self, DecodeError> {
        let wrap = |source| DecodeError::Payload {
            event: name.to_owned(),
            source,
        };
        let decoded = match name {
            event::INIT => Self::Init(serde_json::from_value(payload).map_err(wrap)?),
            event::SETUP_INVENTORY => Self::Setup(serde_json::from_value(payload).map_err(wrap)?),
            event::REFRESH_SLOTS => Self::Refresh(serde_json::from_value(payload).map_err(wrap)?),
            event::SET_PLAYER_BACKPACK => match payload {
                Value::Bool(false) | Value::Null => Self::LeftBackpack(None),
                body => Self::LeftBackpack(Some(serde_json::from_value(body).map_err(wrap)?)),
            },
            event::UPDATE_CRAFT_QUEUE => match payload {
                Value::Array(_) => Self::CraftQueue(serde_json::from_value(payload).map_err(wrap)?),
                _ => Self::CraftQueue(Vec::new()),
            },
            event::UPDATE_BLUEPRINTS => Self::Blueprints(serde_json::from_value(payload).map_err(wrap)?),
            event::SET_CONTAINER_WEIGHT => Self::ContainerWeight(serde_json::from_value(payload).map_err(wrap)?),
            other => return Err(DecodeError::UnknownEvent(other.to_owned())),
        };
        Ok(decoded)
    }
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_id(&value))
}

fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_id(&value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(error) => {
            tracing::warn!(%error, field = std::any::type_name::<T>(), "ignoring malformed refresh field");
            Ok(None)
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<SlotUpdate>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    Ok(entries
        .into_iter()
        .filter(|entry| !entry.is_null())
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(update) => Some(update),
            Err(error) => {
                tracing::warn!(%error, "skipping malformed refresh entry");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refresh_single_item_and_numeric_ids() {
        let event = PushEvent::decode(
            "refreshSlots",
            json!({
                "items": { "item": { "slot": 2, "name": "water", "count": 1, "weight": 100 }, "inventory": 7 },
                "weightData": { "inventoryId": "player", "maxWeight": 40000 },
            }),
        )
        .unwrap();
        let PushEvent::Refresh(batch) = event else {
            panic!("expected a refresh batch");
        };
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].inventory.as_deref(), Some("7"));
        assert_eq!(batch.weight_data.unwrap().max_weight, 40000.0);
    }

    #[test]
    fn test_refresh_keeps_primitive_items_raw() {
        let event = PushEvent::decode(
            "refreshSlots",
            json!({ "items": [{ "item": 4, "inventoryType": "player" }, null] }),
        )
        .unwrap();
        let PushEvent::Refresh(batch) = event else {
            panic!("expected a refresh batch");
        };
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].item, json!(4));
        assert_eq!(batch.items[0].inventory_type, Some(ContainerKind::Player));
    }

    #[test]
    fn test_malformed_side_fields_keep_the_slot_entries() {
        let event = PushEvent::decode(
            "refreshSlots",
            json!({
                "items": [{ "item": { "slot": 3, "name": "water", "count": 2, "weight": 200 }, "inventory": "char-1" }],
                "leftUtility": { "slots": 2, "offset": 50, "items": [{ "slot": 51 }, null] },
                "weightData": { "maxWeight": 40000 },
                "slotsData": "twelve",
                "craftingXp": { "xp": "lots" },
            }),
        )
        .unwrap();
        let PushEvent::Refresh(batch) = event else {
            panic!("expected a refresh batch");
        };
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].item["name"], "water");
        assert_eq!(batch.weight_data, None);
        assert_eq!(batch.slots_data, None);
        assert_eq!(batch.crafting_xp, None);
        let strip = batch.left_utility.unwrap();
        assert_eq!(strip.items.len(), 2);
        assert_eq!(strip.items[1].index, 52);
        assert!(strip.items[1].item().is_none());
    }

    #[test]
    fn test_backpack_removal() {
        assert_eq!(
            PushEvent::decode("setPlayerBackpack", json!(false)).unwrap(),
            PushEvent::LeftBackpack(None)
        );
    }

    #[test]
    fn test_queue_payload_that_is_not_a_list_clears() {
        assert_eq!(
            PushEvent::decode("updateCraftQueue", json!({})).unwrap(),
            PushEvent::CraftQueue(Vec::new())
        );
    }

    #[test]
    fn test_unknown_event() {
        let err = PushEvent::decode("displayMetadata", json!([])).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownEvent(name) if name == "displayMetadata"));
    }
}
