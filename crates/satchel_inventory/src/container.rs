//! # Containers
//!
//! A [`Container`] is an ordered slot array with a kind, an id and optional
//! attachments (nested backpack, storage, utility strip, crafting info).
//!
//! Containers are always normalised on construction: `items.len() == slots`
//! and `items[i].index == i + 1`. The authority may send a sparse item list
//! (array or object keyed by slot, possibly with holes); [`Container::from`]
//! places each entry at its index and fills the rest with empty slots.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::crafting::QueueEntry;
use crate::error::{InventoryError, InventoryResult};
use crate::item::{value_to_id, ItemInstance, Slot};

/// Player group memberships: group name to held grade.
pub type Groups = BTreeMap<String, i64>;

/// Container type discriminator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContainerKind {
    /// The player's own pockets.
    Player,
    /// The player's backpack.
    Backpack,
    /// A backpack nested in the opened container.
    OtherBackpack,
    /// A shop listing.
    Shop,
    /// A crafting bench.
    Crafting,
    /// A generic world container.
    Container,
    /// The player's utility strip.
    Utility,
    /// The opened container's utility strip.
    OtherUtility,
    /// Any other authority-defined kind (stash, trunk, drop, ...).
    Other(String),
}

impl ContainerKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Player => "player",
            Self::Backpack => "backpack",
            Self::OtherBackpack => "otherBackpack",
            Self::Shop => "shop",
            Self::Crafting => "crafting",
            Self::Container => "container",
            Self::Utility => "utility",
            Self::OtherUtility => "otherUtility",
            Self::Other(kind) => kind,
        }
    }

    /// Shop and crafting containers are read-only catalogs.
    #[inline]
    #[must_use]
    pub const fn is_catalog(&self) -> bool {
        matches!(self, Self::Shop | Self::Crafting)
    }

    /// Utility strips are addressed through their own path.
    #[inline]
    #[must_use]
    pub const fn is_utility(&self) -> bool {
        matches!(self, Self::Utility | Self::OtherUtility)
    }
}

impl From<String> for ContainerKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "player" => Self::Player,
            "backpack" => Self::Backpack,
            "otherBackpack" => Self::OtherBackpack,
            "shop" => Self::Shop,
            "crafting" => Self::Crafting,
            "container" => Self::Container,
            "utility" => Self::Utility,
            "otherUtility" => Self::OtherUtility,
            _ => Self::Other(kind),
        }
    }
}

impl From<&str> for ContainerKind {
    fn from(kind: &str) -> Self {
        Self::from(kind.to_owned())
    }
}

impl From<ContainerKind> for String {
    fn from(kind: ContainerKind) -> Self {
        match kind {
            ContainerKind::Other(kind) => kind,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-size utility strip attached to a top-level container.
///
/// Strip entries that are not slot objects decode as empty positions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireUtilityStrip")]
pub struct UtilityStrip {
    /// Number of strip positions.
    pub slots: u32,
    /// Offset between strip positions and authority slot numbers.
    #[serde(default)]
    pub offset: u32,
    /// Strip contents, one per position.
    #[serde(default)]
    pub items: Vec<Slot>,
    /// Authority-defined presentation config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl UtilityStrip {
    /// Authority slot number of strip position `position` (1-based).
    #[inline]
    #[must_use]
    pub const fn slot_number(&self, position: u32) -> u32 {
        if self.offset > 0 {
            self.offset + position
        } else {
            position
        }
    }

    /// Strip position addressed by an item, via its `utilitySlot` metadata
    /// or its slot number relative to the offset.
    #[must_use]
    pub fn position_of(&self, slot_number: u32, item: Option<&ItemInstance>) -> Option<u32> {
        let position = item.and_then(ItemInstance::utility_slot).or_else(|| {
            (self.offset > 0 && slot_number >= self.offset).then(|| slot_number - self.offset)
        })?;
        (1..=self.slots).contains(&position).then_some(position)
    }

    /// Writes `slot` at strip position `position`, growing the strip if the
    /// authority sent fewer items than positions.
    pub fn place(&mut self, position: u32, slot: Slot) {
        let Some(target) = position.checked_sub(1) else {
            return;
        };
        let target = target as usize;
        while self.items.len() <= target {
            let next = u32::try_from(self.items.len()).unwrap_or(u32::MAX) + 1;
            self.items.push(Slot::empty(self.slot_number(next)));
        }
        self.items[target] = slot;
    }
}

#[derive(Deserialize)]
struct WireUtilityStrip {
    #[serde(default)]
    slots: u32,
    #[serde(default)]
    offset: u32,
    #[serde(default)]
    items: Value,
    #[serde(default)]
    config: Option<Value>,
}

impl From<WireUtilityStrip> for UtilityStrip {
    fn from(wire: WireUtilityStrip) -> Self {
        let mut strip = Self {
            slots: wire.slots,
            offset: wire.offset,
            items: Vec::new(),
            config: wire.config,
        };
        let entries = match wire.items {
            Value::Array(entries) => entries,
            _ => Vec::new(),
        };
        for (position, entry) in (1..).zip(entries) {
            let slot = if entry.is_object() {
                serde_json::from_value::<Slot>(entry).unwrap_or_else(|error| {
                    tracing::warn!(%error, position, "malformed utility entry, left empty");
                    Slot::empty(strip.slot_number(position))
                })
            } else {
                Slot::empty(strip.slot_number(position))
            };
            strip.items.push(slot);
        }
        strip
    }
}

/// Crafting experience state of a bench.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpInfo {
    /// Whether experience gates are enforced.
    #[serde(default)]
    pub enabled: bool,
    /// The player's current crafting experience.
    #[serde(default)]
    pub current: f64,
    /// Hide recipes the player cannot unlock yet.
    #[serde(default)]
    pub hide_locked: bool,
}

/// Crafting metadata carried by a bench container.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftingInfo {
    /// Experience gate state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<XpInfo>,
    /// Blueprints held by the player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprints: Option<BTreeMap<String, bool>>,
    /// Display labels of blueprint keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint_labels: Option<BTreeMap<String, String>>,
    /// Authority craft queue at open time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<Vec<QueueEntry>>,
}

/// A normalised inventory container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireContainer", into = "WireContainer")]
pub struct Container {
    /// Id, unique among open containers.
    pub id: String,
    /// Type discriminator.
    pub kind: ContainerKind,
    /// Display label.
    pub label: Option<String>,
    /// Slots; always `slot_count()` long.
    items: Vec<Slot>,
    /// Weight limit.
    pub max_weight: Option<f64>,
    /// Group grades of the owner (player containers).
    pub groups: Option<Groups>,
    /// Nested backpack.
    pub backpack: Option<Box<Container>>,
    /// Backpack nested inside the opened container.
    pub other_backpack: Option<Box<Container>>,
    /// Storage feeding a crafting bench.
    pub storage: Option<Box<Container>>,
    /// Crafting metadata.
    pub crafting: Option<CraftingInfo>,
    /// Bench index for crafting containers.
    pub index: Option<u32>,
    /// Attached utility strip.
    pub utility: Option<UtilityStrip>,
}

impl Container {
    /// Creates a container with `slots` empty slots.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ContainerKind, slots: u32) -> Self {
        Self {
            id: id.into(),
            kind,
            label: None,
            items: (1..=slots).map(Slot::empty).collect(),
            max_weight: None,
            groups: None,
            backpack: None,
            other_backpack: None,
            storage: None,
            crafting: None,
            index: None,
            utility: None,
        }
    }

    /// Builds a container from a sparse slot list; entries outside
    /// `1..=slots` are dropped.
    #[must_use]
    pub fn with_slots(
        id: impl Into<String>,
        kind: ContainerKind,
        slots: u32,
        entries: impl IntoIterator<Item = Slot>,
    ) -> Self {
        let mut container = Self::new(id, kind, slots);
        for entry in entries {
            if container.set_slot(entry).is_err() {
                tracing::warn!(container = %container.id, "dropped slot outside container bounds");
            }
        }
        container
    }

    /// Declared slot count.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        u32::try_from(self.items.len()).unwrap_or(u32::MAX)
    }

    /// All slots in order.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.items
    }

    /// Slot at a 1-based index.
    #[must_use]
    pub fn slot(&self, index: u32) -> Option<&Slot> {
        index
            .checked_sub(1)
            .and_then(|i| self.items.get(i as usize))
    }

    /// Item at a 1-based index.
    #[must_use]
    pub fn item(&self, index: u32) -> Option<&ItemInstance> {
        self.slot(index).and_then(Slot::item)
    }

    /// Mutable item at a 1-based index.
    pub fn item_mut(&mut self, index: u32) -> Option<&mut ItemInstance> {
        index
            .checked_sub(1)
            .and_then(|i| self.items.get_mut(i as usize))
            .and_then(Slot::item_mut)
    }

    /// Replaces the slot at `slot.index`.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::SlotOutOfRange`] for an index outside
    /// `1..=slots`.
    pub fn set_slot(&mut self, slot: Slot) -> InventoryResult<()> {
        let slots = self.slot_count();
        let target = slot
            .index
            .checked_sub(1)
            .and_then(|i| self.items.get_mut(i as usize))
            .ok_or_else(|| InventoryError::SlotOutOfRange {
                container: self.id.clone(),
                index: slot.index,
                slots,
            })?;
        *target = slot;
        Ok(())
    }

    /// Changes the slot count, keeping existing slots by index.
    pub fn resize(&mut self, slots: u32) {
        let current = self.slot_count();
        if slots < current {
            self.items.truncate(slots as usize);
        } else {
            self.items.extend((current + 1..=slots).map(Slot::empty));
        }
    }

    /// Sum of every stack weight.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.items
            .iter()
            .filter_map(Slot::item)
            .map(|item| item.weight)
            .sum()
    }

    /// Units of `name` summed across stacks.
    #[must_use]
    pub fn count_of(&self, name: &str) -> u64 {
        self.items
            .iter()
            .filter_map(Slot::item)
            .filter(|item| item.name == name)
            .map(|item| u64::from(item.units()))
            .sum()
    }

    /// Occupied slots.
    pub fn occupied(&self) -> impl Iterator<Item = &ItemInstance> {
        self.items.iter().filter_map(Slot::item)
    }

    /// Mutable occupied slots.
    pub fn occupied_mut(&mut self) -> impl Iterator<Item = &mut ItemInstance> {
        self.items.iter_mut().filter_map(Slot::item_mut)
    }

    /// Nested containers (backpack, other backpack, storage).
    pub fn nested_mut(&mut self) -> impl Iterator<Item = &mut Container> {
        [
            self.backpack.as_deref_mut(),
            self.other_backpack.as_deref_mut(),
            self.storage.as_deref_mut(),
        ]
        .into_iter()
        .flatten()
    }

    /// Whether any item in this container holds an open container link to `id`.
    #[must_use]
    pub fn holds_link(&self, id: &str) -> bool {
        self.occupied()
            .any(|item| item.container_link().as_deref() == Some(id))
    }
}

/// JSON form of a container as the authority sends it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireContainer {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: String,
    #[serde(rename = "type", default = "unknown_kind")]
    kind: ContainerKind,
    #[serde(default)]
    slots: u32,
    #[serde(default)]
    items: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    groups: Option<Groups>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backpack: Option<Box<Container>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    other_backpack: Option<Box<Container>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage: Option<Box<Container>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crafting: Option<CraftingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utility: Option<UtilityStrip>,
}

fn unknown_kind() -> ContainerKind {
    ContainerKind::Other(String::new())
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_id(&value).unwrap_or_default())
}

/// Collects the slot entries of a sparse item list. Non-object entries and
/// entries that fail to parse are skipped.
fn sparse_slots(items: Value) -> Vec<Slot> {
    let entries: Vec<Value> = match items {
        Value::Array(entries) => entries,
        Value::Object(map) => map.into_iter().map(|(_, entry)| entry).collect(),
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| match serde_json::from_value::<Slot>(entry) {
            Ok(slot) => Some(slot),
            Err(error) => {
                tracing::warn!(%error, "skipping malformed slot entry");
                None
            }
        })
        .collect()
}

impl From<WireContainer> for Container {
    fn from(wire: WireContainer) -> Self {
        let mut container = Self::with_slots(wire.id, wire.kind, wire.slots, sparse_slots(wire.items));
        container.label = wire.label;
        container.max_weight = wire.max_weight;
        container.groups = wire.groups;
        container.backpack = wire.backpack;
        container.other_backpack = wire.other_backpack;
        container.storage = wire.storage;
        container.crafting = wire.crafting;
        container.index = wire.index;
        container.utility = wire.utility;
        container
    }
}

impl From<Container> for WireContainer {
    fn from(container: Container) -> Self {
        let slots = container.slot_count();
        Self {
            id: container.id,
            kind: container.kind,
            slots,
            items: serde_json::to_value(container.items).unwrap_or_default(),
            label: container.label,
            max_weight: container.max_weight,
            groups: container.groups,
            backpack: container.backpack,
            other_backpack: container.other_backpack,
            storage: container.storage,
            crafting: container.crafting,
            index: container.index,
            utility: container.utility,
        }
    }
}
