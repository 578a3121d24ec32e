//! # Availability & Compatibility Rules
//!
//! Pure predicates consulted before any gesture turns into a request:
//!
//! - [`stack_compatible`]: may two stacks share a slot?
//! - [`find_available_slot`]: where does an item land without an explicit slot?
//! - [`can_purchase`]: stock and group-grade gate of a shop listing
//! - [`can_craft`] / [`max_craftable`]: ingredient availability net of reservations

use crate::catalog::{CatalogEntry, ItemCatalog};
use crate::container::{Container, ContainerKind, Groups};
use crate::crafting::ReservationMap;
use crate::item::{GradeRequirement, ItemInstance, Metadata, META_DURABILITY};

/// Player slots excluded from automatic placement.
pub const HOTBAR_SLOTS: u32 = 9;

/// Whether two metadata maps are equal, treating an absent map as empty.
fn metadata_eq(a: Option<&Metadata>, b: Option<&Metadata>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        (None, None) => true,
        (Some(only), None) | (None, Some(only)) => only.is_empty(),
    }
}

/// Same catalog key and deep-equal metadata.
#[must_use]
pub fn stack_compatible(a: &ItemInstance, b: &ItemInstance) -> bool {
    a.name == b.name && metadata_eq(a.metadata.as_ref(), b.metadata.as_ref())
}

/// Picks a destination slot for `item` in `dest`.
///
/// Non-stacking items and splits take the first empty slot. Stacking items
/// prefer a compatible stack, then the first empty slot. In the player's
/// own container the first `hotbar_slots` positions are never chosen.
#[must_use]
pub fn find_available_slot(
    item: &ItemInstance,
    entry: &CatalogEntry,
    dest: &Container,
    is_split: bool,
    hotbar_slots: u32,
) -> Option<u32> {
    let skip = if dest.kind == ContainerKind::Player {
        hotbar_slots
    } else {
        0
    };
    let candidates = || dest.slots().iter().filter(move |slot| slot.index > skip);
    let first_empty = || candidates().find(|slot| slot.is_empty()).map(|slot| slot.index);

    if !entry.stack || is_split {
        return first_empty();
    }
    candidates()
        .find(|slot| slot.item().is_some_and(|resting| stack_compatible(item, resting)))
        .map(|slot| slot.index)
        .or_else(first_empty)
}

/// Whether the player may buy `item` from `shop`.
///
/// Non-shop sources always pass. A listing with stock exactly 0 never
/// passes. A grade requirement is checked against the player's grades in
/// the groups the shop declares.
#[must_use]
pub fn can_purchase(item: &ItemInstance, shop: &Container, player_groups: Option<&Groups>) -> bool {
    if shop.kind != ContainerKind::Shop {
        return true;
    }
    if item.count == Some(0) {
        return false;
    }
    let (Some(grade), Some(shop_groups)) = (&item.grade, &shop.groups) else {
        return true;
    };
    let Some(player_groups) = player_groups.filter(|groups| !groups.is_empty()) else {
        return false;
    };

    let mut held = shop_groups.keys().filter_map(|group| player_groups.get(group));
    match grade {
        GradeRequirement::Minimum(threshold) => held.any(|grade| grade >= threshold),
        GradeRequirement::AnyOf(accepted) => held.any(|grade| accepted.contains(grade)),
    }
}

/// Availability of an ingredient in `storage`, before reservations.
///
/// Whole-unit ingredients count units, taking the larger of the global
/// catalog count and the stacks in `storage`. Fractional ingredients
/// (`required < 1`) count stacks whose durability covers `required × 100`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ingredient_available(name: &str, required: f64, storage: &Container, catalog: &ItemCatalog) -> f64 {
    if required < 1.0 {
        let threshold = required * 100.0;
        return storage
            .occupied()
            .filter(|item| item.name == name)
            .filter(|item| {
                item.meta(META_DURABILITY)
                    .and_then(serde_json::Value::as_f64)
                    .is_some_and(|durability| durability >= threshold)
            })
            .count() as f64;
    }
    let global = catalog.global_count(name).unwrap_or(0).max(0) as f64;
    let summed = storage.count_of(name) as f64;
    global.max(summed)
}

fn net_available(
    name: &str,
    required: f64,
    reserved: &ReservationMap,
    storage: &Container,
    catalog: &ItemCatalog,
) -> f64 {
    let held_back = reserved.get(name).copied().unwrap_or(0.0);
    (ingredient_available(name, required, storage, catalog) - held_back).max(0.0)
}

/// Whether every ingredient of `recipe` is available net of reservations.
///
/// Only crafting sources are checked; anything else passes.
#[must_use]
pub fn can_craft(
    recipe: &ItemInstance,
    source_kind: &ContainerKind,
    reserved: &ReservationMap,
    storage: &Container,
    catalog: &ItemCatalog,
) -> bool {
    if *source_kind != ContainerKind::Crafting {
        return true;
    }
    let Some(ingredients) = &recipe.ingredients else {
        return true;
    };
    ingredients
        .iter()
        .all(|(name, required)| net_available(name, *required, reserved, storage, catalog) >= *required)
}

/// Upper bound on how many times a recipe can be crafted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CraftLimit {
    /// The recipe needs no ingredients.
    Unbounded,
    /// At most this many crafts.
    Limited(u32),
}

impl CraftLimit {
    /// Clamps a requested count to the limit, keeping it at least 1.
    #[must_use]
    pub fn clamp(self, requested: u32) -> u32 {
        match self {
            Self::Unbounded => requested.max(1),
            Self::Limited(max) => requested.min(max).max(1),
        }
    }
}

/// `min` over ingredients of `floor((available − reserved) / required)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn max_craftable(
    recipe: &ItemInstance,
    reserved: &ReservationMap,
    storage: &Container,
    catalog: &ItemCatalog,
) -> CraftLimit {
    let Some(ingredients) = recipe.ingredients.as_ref().filter(|i| !i.is_empty()) else {
        return CraftLimit::Unbounded;
    };
    let limit = ingredients
        .iter()
        .map(|(name, required)| {
            if *required <= 0.0 {
                return u32::MAX;
            }
            let crafts = (net_available(name, *required, reserved, storage, catalog) / required).floor();
            crafts.min(f64::from(u32::MAX)) as u32
        })
        .min()
        .unwrap_or(0);
    CraftLimit::Limited(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Slot;
    use serde_json::json;

    fn meta(value: serde_json::Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    fn player(items: Vec<Slot>) -> Container {
        Container::with_slots("char-1", ContainerKind::Player, 15, items)
    }

    #[test]
    fn test_stack_compatibility_is_deep() {
        let a = ItemInstance::new("ammo-9", Some(30), 30.0).with_metadata(meta(json!({ "ammo": 3 })));
        let b = ItemInstance::new("ammo-9", Some(12), 12.0).with_metadata(meta(json!({ "ammo": 3 })));
        let c = ItemInstance::new("ammo-9", Some(12), 12.0).with_metadata(meta(json!({ "ammo": 4 })));
        assert!(stack_compatible(&a, &b));
        assert!(!stack_compatible(&a, &c));

        let named = ItemInstance::new("water", Some(1), 100.0);
        let other = ItemInstance::new("bread", Some(1), 100.0);
        assert!(!stack_compatible(&named, &other));

        let empty_meta = ItemInstance::new("water", Some(1), 100.0).with_metadata(Metadata::new());
        assert!(stack_compatible(&named, &empty_meta));
    }

    #[test]
    fn test_find_slot_skips_hotbar() {
        let water = ItemInstance::new("water", Some(1), 100.0);
        let entry = CatalogEntry::new("water", 100.0, true);
        let dest = player(vec![Slot::occupied(2, water.clone())]);
        // The compatible stack sits in the hotbar, so the first free slot after it wins.
        assert_eq!(find_available_slot(&water, &entry, &dest, false, HOTBAR_SLOTS), Some(10));

        let stash = Container::with_slots(
            "stash",
            ContainerKind::Other("stash".into()),
            5,
            [Slot::occupied(3, water.clone())],
        );
        assert_eq!(find_available_slot(&water, &entry, &stash, false, HOTBAR_SLOTS), Some(3));
        assert_eq!(find_available_slot(&water, &entry, &stash, true, HOTBAR_SLOTS), Some(1));

        let weapon = CatalogEntry::new("water", 100.0, false);
        assert_eq!(find_available_slot(&water, &weapon, &stash, false, HOTBAR_SLOTS), Some(1));
    }

    #[test]
    fn test_find_slot_full_container() {
        let rock = ItemInstance::new("rock", Some(1), 1.0);
        let entry = CatalogEntry::new("rock", 1.0, false);
        let full = Container::with_slots(
            "box",
            ContainerKind::Container,
            1,
            [Slot::occupied(1, rock.clone())],
        );
        assert_eq!(find_available_slot(&rock, &entry, &full, false, HOTBAR_SLOTS), None);
    }

    #[test]
    fn test_out_of_stock_never_purchasable() {
        let shop = Container::new("shop-1", ContainerKind::Shop, 10);
        let mut listing = ItemInstance::new("water", Some(0), 100.0);
        assert!(!can_purchase(&listing, &shop, None));
        listing.count = Some(3);
        assert!(can_purchase(&listing, &shop, None));
        listing.count = None;
        assert!(can_purchase(&listing, &shop, None));
    }

    #[test]
    fn test_grade_requirements() {
        let mut shop = Container::new("armory", ContainerKind::Shop, 10);
        shop.groups = Some(Groups::from([("police".to_owned(), 0)]));
        let mut rifle = ItemInstance::new("rifle", Some(5), 3000.0);
        rifle.grade = Some(GradeRequirement::Minimum(2));

        let cadet = Groups::from([("police".to_owned(), 1)]);
        let sergeant = Groups::from([("police".to_owned(), 3)]);
        let medic = Groups::from([("ems".to_owned(), 5)]);
        assert!(!can_purchase(&rifle, &shop, None));
        assert!(!can_purchase(&rifle, &shop, Some(&cadet)));
        assert!(can_purchase(&rifle, &shop, Some(&sergeant)));
        assert!(!can_purchase(&rifle, &shop, Some(&medic)));

        rifle.grade = Some(GradeRequirement::AnyOf(vec![1, 4]));
        assert!(can_purchase(&rifle, &shop, Some(&cadet)));
        assert!(!can_purchase(&rifle, &shop, Some(&sergeant)));
    }

    #[test]
    fn test_max_craftable_respects_reservations() {
        let recipe = ItemInstance::new("pipe", None, 500.0).with_ingredients([("iron", 5.0), ("copper", 12.0)]);
        let storage = player(vec![
            Slot::occupied(1, ItemInstance::new("iron", Some(12), 12.0)),
            Slot::occupied(2, ItemInstance::new("copper", Some(20), 20.0)),
        ]);
        let catalog = ItemCatalog::new();

        let none = ReservationMap::new();
        assert_eq!(max_craftable(&recipe, &none, &storage, &catalog), CraftLimit::Limited(1));
        assert!(can_craft(&recipe, &ContainerKind::Crafting, &none, &storage, &catalog));

        let reserved = ReservationMap::from([("iron".to_owned(), 10.0)]);
        assert_eq!(max_craftable(&recipe, &reserved, &storage, &catalog), CraftLimit::Limited(0));
        assert!(!can_craft(&recipe, &ContainerKind::Crafting, &reserved, &storage, &catalog));
    }

    #[test]
    fn test_fractional_ingredient_uses_durability() {
        let recipe = ItemInstance::new("lockpick", None, 10.0).with_ingredients([("toolkit", 0.2)]);
        let worn = ItemInstance::new("toolkit", None, 500.0).with_metadata(meta(json!({ "durability": 15 })));
        let fresh = ItemInstance::new("toolkit", None, 500.0).with_metadata(meta(json!({ "durability": 80 })));
        let catalog = ItemCatalog::new();
        let none = ReservationMap::new();

        let worn_only = player(vec![Slot::occupied(1, worn.clone())]);
        assert!(!can_craft(&recipe, &ContainerKind::Crafting, &none, &worn_only, &catalog));

        let with_fresh = player(vec![Slot::occupied(1, worn), Slot::occupied(2, fresh)]);
        assert!(can_craft(&recipe, &ContainerKind::Crafting, &none, &with_fresh, &catalog));
        assert_eq!(max_craftable(&recipe, &none, &with_fresh, &catalog), CraftLimit::Limited(5));
    }

    #[test]
    fn test_global_count_feeds_availability() {
        let recipe = ItemInstance::new("pipe", None, 500.0).with_ingredients([("iron", 5.0)]);
        let catalog = ItemCatalog::with_entries([CatalogEntry {
            count: 11,
            ..CatalogEntry::new("iron", 1.0, true)
        }]);
        let storage = player(Vec::new());
        assert_eq!(
            max_craftable(&recipe, &ReservationMap::new(), &storage, &catalog),
            CraftLimit::Limited(2)
        );
    }

    #[test]
    fn test_recipes_without_ingredients() {
        let free = ItemInstance::new("note", None, 1.0);
        let storage = player(Vec::new());
        let catalog = ItemCatalog::new();
        assert_eq!(
            max_craftable(&free, &ReservationMap::new(), &storage, &catalog),
            CraftLimit::Unbounded
        );
        assert_eq!(CraftLimit::Unbounded.clamp(0), 1);
        assert_eq!(CraftLimit::Limited(3).clamp(10), 3);
    }
}
