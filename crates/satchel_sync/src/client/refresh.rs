//! Inbound push application.
//!
//! Pushes are authoritative: they overwrite local state and never open
//! tickets. A malformed entry is skipped with a warning; a batch never
//! aborts half-way.

use serde_json::Value;

use satchel_inventory::item::value_to_id;
use satchel_inventory::resolver;
use satchel_inventory::{durability, Container, ContainerKind, CraftQueue, Slot, XpInfo};

use super::InventoryClient;
use crate::protocol::push::{Init, RefreshBatch, Setup};
use crate::protocol::{PushEvent, SlotUpdate};

/// What applying one push did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Updates written to local state.
    pub applied: usize,
    /// Updates skipped (unresolved container, bad slot, no bench).
    pub skipped: usize,
}

impl PushReport {
    fn one(applied: bool) -> Self {
        Self {
            applied: usize::from(applied),
            skipped: usize::from(!applied),
        }
    }
}

impl InventoryClient {
    /// Applies an authority push to local state.
    pub fn apply_push(&mut self, event: PushEvent) -> PushReport {
        let name = event.name();
        let report = match event {
            PushEvent::Init(init) => self.apply_init(init),
            PushEvent::Setup(setup) => self.apply_setup(setup),
            PushEvent::Refresh(batch) => self.apply_refresh(batch),
            PushEvent::LeftBackpack(backpack) => {
                let backpack = backpack.map(|mut backpack| {
                    self.normalise(&mut backpack);
                    Box::new(backpack)
                });
                self.state.left.backpack = backpack;
                PushReport::one(true)
            }
            PushEvent::CraftQueue(entries) => {
                let is_bench = self.state.right.kind == ContainerKind::Crafting;
                if is_bench {
                    self.craft_queue = CraftQueue::from_entries(&entries, &self.state.right);
                }
                PushReport::one(is_bench)
            }
            PushEvent::Blueprints(blueprints) => {
                let is_bench = self.state.right.kind == ContainerKind::Crafting;
                if is_bench {
                    self.state.right.crafting.get_or_insert_with(Default::default).blueprints = Some(blueprints);
                }
                PushReport::one(is_bench)
            }
            PushEvent::ContainerWeight(weight) => self.apply_container_weight(weight),
        };
        tracing::debug!(event = name, applied = report.applied, skipped = report.skipped, "push applied");
        report
    }

    fn apply_init(&mut self, init: Init) -> PushReport {
        let mut report = PushReport::default();
        for (key, mut entry) in init.items {
            if entry.name.is_empty() {
                entry.name = key;
            }
            self.catalog.insert(entry);
            report.applied += 1;
        }
        if let Some(mut left) = init.left_inventory {
            self.normalise(&mut left);
            self.state.left = left;
            report.applied += 1;
        }
        report
    }

    fn apply_setup(&mut self, setup: Setup) -> PushReport {
        self.ledger.abandon_all();
        self.precise_split = false;
        let mut report = PushReport::default();

        if let Some(mut left) = setup.left_inventory {
            self.normalise(&mut left);
            self.state.left = left;
            report.applied += 1;
        }
        if let Some(mut right) = setup.right_inventory {
            self.normalise(&mut right);
            self.craft_queue = match (&right.kind, right.crafting.as_ref().and_then(|c| c.queue.as_ref())) {
                (ContainerKind::Crafting, Some(entries)) => CraftQueue::from_entries(entries, &right),
                _ => CraftQueue::new(),
            };
            tracing::info!(id = %right.id, kind = %right.kind, "container opened");
            self.state.right = right;
            report.applied += 1;
        }
        report
    }

    fn apply_refresh(&mut self, batch: RefreshBatch) -> PushReport {
        let mut report = PushReport::default();
        let now = durability::now_epoch_secs();

        for update in batch.items {
            if self.apply_slot_update(update, now) {
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
        }

        for (name, delta) in batch.item_count.unwrap_or_default() {
            if !self.catalog.adjust_count(&name, delta) {
                tracing::warn!(%name, delta, "count delta for unknown item");
            }
        }

        if let Some(change) = batch.weight_data {
            match self.container_by_id(&change.inventory_id) {
                Some(container) => container.max_weight = Some(change.max_weight),
                None => tracing::warn!(id = %change.inventory_id, "weight change for unknown container"),
            }
        }

        if let Some(change) = batch.slots_data {
            match self.container_by_id(&change.inventory_id) {
                Some(container) => container.resize(change.slots),
                None => tracing::warn!(id = %change.inventory_id, "slot change for unknown container"),
            }
        }

        if let Some(strip) = batch.left_utility {
            self.state.left.utility = Some(strip);
        }
        if let Some(strip) = batch.right_utility {
            self.state.right.utility = Some(strip);
        }

        if let Some(update) = batch.crafting_xp {
            if self.state.right.kind == ContainerKind::Crafting {
                let crafting = self.state.right.crafting.get_or_insert_with(Default::default);
                match crafting.xp.as_mut() {
                    Some(xp) => xp.current = update.xp,
                    None => {
                        crafting.xp = Some(XpInfo {
                            enabled: true,
                            current: update.xp,
                            hide_locked: false,
                        });
                    }
                }
            }
        }
        report
    }

    /// Writes one refresh entry. Returns false if it was skipped.
    fn apply_slot_update(&mut self, update: SlotUpdate, now: i64) -> bool {
        let Some(endpoint) =
            resolver::resolve_refresh_target(&self.state, update.inventory.as_deref(), update.inventory_type.as_ref())
        else {
            tracing::warn!(inventory = ?update.inventory, "refresh entry for unknown container");
            return false;
        };

        let Some(mut slot) = decode_slot(update.item) else {
            tracing::warn!(?endpoint, "refresh entry without a slot number");
            return false;
        };
        if let Some(item) = slot.item_mut() {
            durability::refresh(item, now);
            if !self.catalog.contains(&item.name) {
                self.unknown_items.insert(item.name.clone());
            }
        }

        let Some(container) = self.state.container_mut(endpoint) else {
            return false;
        };

        if let Some(strip) = container.utility.as_mut() {
            if let Some(position) = strip.position_of(slot.index, slot.item()) {
                let filled = slot.item().and_then(|item| item.count).is_some_and(|count| count > 0);
                let written = if filled {
                    slot
                } else {
                    Slot::empty(strip.slot_number(position))
                };
                strip.place(position, written);
                return true;
            }
        }

        match container.set_slot(slot) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, "skipping refresh entry");
                false
            }
        }
    }

    fn apply_container_weight(&mut self, weight: f64) -> PushReport {
        let open = self.state.right.id.clone();
        let holder = self
            .state
            .left
            .occupied_mut()
            .find(|item| item.container_link().is_some_and(|link| link == open));
        match holder {
            Some(item) => {
                item.weight = weight;
                PushReport::one(true)
            }
            None => PushReport::one(false),
        }
    }

    fn container_by_id(&mut self, id: &str) -> Option<&mut Container> {
        let endpoint = resolver::resolve_by_id(&self.state, id)?;
        self.state.container_mut(endpoint)
    }

    /// Recomputes durability and collects uncatalogued names, recursively.
    fn normalise(&mut self, container: &mut Container) {
        let now = durability::now_epoch_secs();
        let mut stack = vec![container];
        while let Some(current) = stack.pop() {
            for item in current.occupied_mut() {
                durability::refresh(item, now);
                if !self.catalog.contains(&item.name) {
                    self.unknown_items.insert(item.name.clone());
                }
            }
            stack.extend(current.nested_mut());
        }
    }
}

/// Turns a raw refresh payload into a slot; bare numbers are empty slots.
fn decode_slot(raw: Value) -> Option<Slot> {
    match raw {
        Value::Object(_) => match serde_json::from_value::<Slot>(raw) {
            Ok(slot) if slot.index > 0 => Some(slot),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(%error, "malformed slot in refresh");
                None
            }
        },
        other => value_to_id(&other)
            .and_then(|id| id.parse::<u32>().ok())
            .filter(|index| *index > 0)
            .map(Slot::empty),
    }
}
