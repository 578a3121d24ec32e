//! # Items and Slots
//!
//! An [`ItemInstance`] is one stack of a catalog item. A [`Slot`] is a
//! 1-based position in a container whose content is decided once, at
//! construction, as [`SlotContent::Empty`] or [`SlotContent::Occupied`].
//!
//! ## Wire form
//!
//! On the wire a slot is a flat JSON object: `{ "slot": 3 }` for an empty
//! slot, `{ "slot": 3, "name": "water", "count": 5, "weight": 500, ... }`
//! for an occupied one. A slot counts as occupied only when it carries both
//! a name and a weight.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open per-item metadata map (durability, serial, container link, ...).
///
/// Equality is structural and key-order insensitive.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key holding a durability percentage or an absolute decay timestamp.
pub const META_DURABILITY: &str = "durability";
/// Metadata key holding the decay rate in minutes.
pub const META_DEGRADE: &str = "degrade";
/// Metadata key linking an item to the container it opens.
pub const META_CONTAINER: &str = "container";
/// Metadata key naming the utility strip position of an item.
pub const META_UTILITY_SLOT: &str = "utilitySlot";

/// Group grade requirement declared on a shop listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeRequirement {
    /// Any held grade at or above the threshold passes.
    Minimum(i64),
    /// Any held grade equal to one of the listed grades passes.
    AnyOf(Vec<i64>),
}

/// Experience gate attached to a crafting recipe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeXp {
    /// Experience required to craft.
    #[serde(default)]
    pub required: Option<f64>,
    /// Experience awarded per craft.
    #[serde(default)]
    pub reward: Option<f64>,
}

/// One stack of a catalog item.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemInstance {
    /// Catalog key.
    pub name: String,
    /// Units in the stack; absent for non-stacking equipment.
    pub count: Option<u32>,
    /// Total weight of the whole stack.
    pub weight: f64,
    /// Open metadata map.
    pub metadata: Option<Metadata>,
    /// Current durability percentage, derived from metadata.
    pub durability: Option<f64>,
    /// Shop price.
    pub price: Option<f64>,
    /// Shop currency item.
    pub currency: Option<String>,
    /// Shop grade requirement.
    pub grade: Option<GradeRequirement>,
    /// Crafting ingredients: catalog key to required quantity.
    pub ingredients: Option<BTreeMap<String, f64>>,
    /// Crafting duration in milliseconds.
    pub duration: Option<f64>,
    /// Crafting experience gate.
    pub xp: Option<RecipeXp>,
    /// Blueprint key gating a recipe.
    pub blueprint: Option<String>,
}

impl ItemInstance {
    /// Creates a bare stack with no metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, count: Option<u32>, weight: f64) -> Self {
        Self {
            name: name.into(),
            count,
            weight,
            metadata: None,
            durability: None,
            price: None,
            currency: None,
            grade: None,
            ingredients: None,
            duration: None,
            xp: None,
            blueprint: None,
        }
    }

    /// Attaches a metadata map.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attaches crafting ingredients.
    #[must_use]
    pub fn with_ingredients<I, K>(mut self, ingredients: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        self.ingredients = Some(
            ingredients
                .into_iter()
                .map(|(name, amount)| (name.into(), amount))
                .collect(),
        );
        self
    }

    /// Number of units this stack represents (1 when `count` is absent).
    #[inline]
    #[must_use]
    pub fn units(&self) -> u32 {
        self.count.unwrap_or(1)
    }

    /// Weight of a single unit.
    #[inline]
    #[must_use]
    pub fn unit_weight(&self) -> f64 {
        self.weight / f64::from(self.units().max(1))
    }

    /// Looks up a metadata value.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|meta| meta.get(key))
    }

    /// The id of the container this item opens, if any.
    #[must_use]
    pub fn container_link(&self) -> Option<String> {
        self.meta(META_CONTAINER).and_then(value_to_id)
    }

    /// Explicit utility strip position from metadata.
    #[must_use]
    pub fn utility_slot(&self) -> Option<u32> {
        self.meta(META_UTILITY_SLOT)
            .and_then(Value::as_u64)
            .and_then(|slot| u32::try_from(slot).ok())
    }
}

/// Renders a JSON id (string or number) as a string.
#[must_use]
pub fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Content of a slot.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum SlotContent {
    /// Nothing in the slot.
    #[default]
    Empty,
    /// A stack occupies the slot.
    Occupied(ItemInstance),
}

/// A 1-based position in a container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireSlot", into = "WireSlot")]
pub struct Slot {
    /// 1-based index.
    pub index: u32,
    /// What the slot holds.
    pub content: SlotContent,
}

impl Slot {
    /// Creates an empty slot.
    #[inline]
    #[must_use]
    pub const fn empty(index: u32) -> Self {
        Self {
            index,
            content: SlotContent::Empty,
        }
    }

    /// Creates an occupied slot.
    #[inline]
    #[must_use]
    pub const fn occupied(index: u32, item: ItemInstance) -> Self {
        Self {
            index,
            content: SlotContent::Occupied(item),
        }
    }

    /// The item in this slot, if any.
    #[inline]
    #[must_use]
    pub const fn item(&self) -> Option<&ItemInstance> {
        match &self.content {
            SlotContent::Occupied(item) => Some(item),
            SlotContent::Empty => None,
        }
    }

    /// Mutable access to the item in this slot.
    #[inline]
    pub fn item_mut(&mut self) -> Option<&mut ItemInstance> {
        match &mut self.content {
            SlotContent::Occupied(item) => Some(item),
            SlotContent::Empty => None,
        }
    }

    /// Returns true if no item is present.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.content, SlotContent::Empty)
    }
}

/// Flat JSON form of a slot.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSlot {
    slot: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    durability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grade: Option<GradeRequirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ingredients: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    xp: Option<RecipeXp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blueprint: Option<String>,
}

impl From<WireSlot> for Slot {
    fn from(wire: WireSlot) -> Self {
        let (Some(name), Some(weight)) = (wire.name, wire.weight) else {
            return Self::empty(wire.slot);
        };
        Self::occupied(
            wire.slot,
            ItemInstance {
                name,
                count: wire.count,
                weight,
                metadata: wire.metadata,
                durability: wire.durability,
                price: wire.price,
                currency: wire.currency,
                grade: wire.grade,
                ingredients: wire.ingredients,
                duration: wire.duration,
                xp: wire.xp,
                blueprint: wire.blueprint,
            },
        )
    }
}

impl From<Slot> for WireSlot {
    fn from(slot: Slot) -> Self {
        match slot.content {
            SlotContent::Empty => Self {
                slot: slot.index,
                ..Self::default()
            },
            SlotContent::Occupied(item) => Self {
                slot: slot.index,
                name: Some(item.name),
                count: item.count,
                weight: Some(item.weight),
                metadata: item.metadata,
                durability: item.durability,
                price: item.price,
                currency: item.currency,
                grade: item.grade,
                ingredients: item.ingredients,
                duration: item.duration,
                xp: item.xp,
                blueprint: item.blueprint,
            },
        }
    }
}
