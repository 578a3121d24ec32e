//! # Inventory Client
//!
//! Owns the local inventory state and turns gestures into requests.
//!
//! ## Intent lifecycle
//!
//! ```text
//! gesture ──► preconditions ──✗──► IntentAbort (nothing sent, nothing mutated)
//!                 │
//!                 ✓
//!                 ▼
//!          ledger.apply(snapshot + operator) ──► Dispatch { ticket, request }
//!                                                     │
//!                         authority outcome ──► settle(ticket, outcome)
//! ```
//!
//! Transfers mutate local state before the authority answers. Purchases
//! and craft enqueues only snapshot; the authority's refresh carries their
//! effect. Cancellation and utility moves are fire-and-forget.

mod refresh;

use std::collections::BTreeSet;

use thiserror::Error;

use satchel_inventory::operators;
use satchel_inventory::resolver::{self, Resolution};
use satchel_inventory::rules::{self, CraftLimit};
use satchel_inventory::{
    durability, recipe_lock, Container, ContainerKind, CraftQueue, Endpoint, InventoryError, ItemCatalog,
    ItemInstance, JobProgress, RecipeLock, ReservationMap, RootState, Slot, SlotRef, HOTBAR_SLOTS,
};

use crate::ledger::{ConfirmationLedger, Settlement, Ticket};
use crate::protocol::{
    operation, CancelCraftRequest, CraftRequest, Outcome, PaymentMethod, PurchaseRequest, Request, TransferRequest,
    UtilityAssignRequest, UtilityReleaseRequest,
};

pub use refresh::PushReport;

/// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Player slots excluded from automatic placement.
    pub hotbar_slots: u32,
    /// Payment method when a purchase does not name one.
    pub default_payment: PaymentMethod,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hotbar_slots: HOTBAR_SLOTS,
            default_payment: PaymentMethod::Cash,
        }
    }
}

/// Why a gesture did not produce a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentAbort {
    /// Nothing to move.
    #[error("source slot is empty")]
    EmptySource,
    /// A shop or crafting listing without a count.
    #[error("listing lacks a count")]
    IncompleteListing,
    /// No destination container resolves.
    #[error("no target container resolves")]
    UnresolvedTarget,
    /// The destination slot does not exist.
    #[error("target slot {0} does not exist")]
    NoSuchSlot(u32),
    /// No free or compatible slot in the destination.
    #[error("no free slot in the target container")]
    NoFreeSlot,
    /// Dropped back onto itself.
    #[error("source and target are the same slot")]
    SameSlot,
    /// Shops and benches do not accept drops.
    #[error("cannot drop into a {0} container")]
    ReadOnlyTarget(ContainerKind),
    /// A container item dropped into a container.
    #[error("containers cannot be nested")]
    NestedContainer,
    /// The container item is the one currently open.
    #[error("container '{0}' is open")]
    ContainerOpen(String),
    /// The catalog has no entry for the item.
    #[error("item '{0}' is not in the catalog")]
    UnknownItem(String),
    /// Shop stock is zero.
    #[error("listing is sold out")]
    OutOfStock,
    /// The player lacks the required group grade.
    #[error("missing required group grade")]
    NotPermitted,
    /// Not enough ingredients once reservations are subtracted.
    #[error("missing ingredients")]
    MissingIngredients,
    /// Experience or blueprint gate.
    #[error("recipe is locked")]
    RecipeLocked,
    /// The right-hand container is not a bench.
    #[error("no crafting bench is open")]
    NoBench,
    /// The right-hand container is not a shop.
    #[error("no shop is open")]
    NoShop,
    /// The craft queue has no such job.
    #[error("craft queue has no job at position {0}")]
    NoSuchJob(usize),
    /// The utility strip position could not be derived.
    #[error("no utility strip position resolves")]
    UnresolvedUtilitySlot,
    /// The operator refused the mutation.
    #[error(transparent)]
    Operator(#[from] InventoryError),
}

/// Result type for intents.
pub type IntentResult<T> = Result<T, IntentAbort>;

/// The slot a gesture starts from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragSource {
    /// Kind of the source container.
    pub kind: ContainerKind,
    /// Explicit id of the source container.
    pub inventory_id: Option<String>,
    /// 1-based slot (authority slot number for utility strips).
    pub slot: u32,
}

impl DragSource {
    /// Source addressed by kind only.
    #[must_use]
    pub const fn new(kind: ContainerKind, slot: u32) -> Self {
        Self {
            kind,
            inventory_id: None,
            slot,
        }
    }

    /// Adds an explicit container id.
    #[must_use]
    pub fn in_inventory(mut self, id: impl Into<String>) -> Self {
        self.inventory_id = Some(id.into());
        self
    }
}

/// The slot a gesture ends on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropTarget {
    /// Kind of the destination container.
    pub kind: ContainerKind,
    /// Explicit id of the destination container.
    pub inventory_id: Option<String>,
    /// 1-based slot.
    pub slot: u32,
}

impl DropTarget {
    /// Target addressed by kind only.
    #[must_use]
    pub const fn new(kind: ContainerKind, slot: u32) -> Self {
        Self {
            kind,
            inventory_id: None,
            slot,
        }
    }

    /// Adds an explicit container id.
    #[must_use]
    pub fn in_inventory(mut self, id: impl Into<String>) -> Self {
        self.inventory_id = Some(id.into());
        self
    }
}

/// A request produced by an intent.
#[derive(Clone, Debug, PartialEq)]
pub struct Dispatch {
    /// Ticket to settle; `None` for fire-and-forget requests.
    pub ticket: Option<Ticket>,
    /// The request to send.
    pub request: Request,
}

/// Local inventory state plus the optimistic machinery around it.
#[derive(Debug)]
pub struct InventoryClient {
    config: ClientConfig,
    state: RootState,
    catalog: ItemCatalog,
    ledger: ConfirmationLedger,
    craft_queue: CraftQueue,
    drag_quantity: u32,
    precise_split: bool,
    unknown_items: BTreeSet<String>,
}

impl InventoryClient {
    /// Creates a client with empty containers.
    #[must_use]
    pub fn new(config: ClientConfig, catalog: ItemCatalog) -> Self {
        Self {
            config,
            state: RootState::default(),
            catalog,
            ledger: ConfirmationLedger::new(),
            craft_queue: CraftQueue::new(),
            drag_quantity: 0,
            precise_split: false,
            unknown_items: BTreeSet::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read-only views
    // ------------------------------------------------------------------

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> &RootState {
        &self.state
    }

    /// The player container.
    #[inline]
    #[must_use]
    pub const fn left(&self) -> &Container {
        &self.state.left
    }

    /// The opened container.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> &Container {
        &self.state.right
    }

    /// The catalog handle.
    #[inline]
    #[must_use]
    pub const fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// The client configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether any confirmation is outstanding.
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.ledger.is_busy()
    }

    /// Number of outstanding confirmations.
    #[inline]
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.ledger.outstanding()
    }

    /// Units moved per gesture; 0 means the whole stack.
    #[inline]
    #[must_use]
    pub const fn drag_quantity(&self) -> u32 {
        self.drag_quantity
    }

    /// Sets the drag quantity.
    pub fn set_drag_quantity(&mut self, quantity: u32) {
        self.drag_quantity = quantity;
    }

    /// Whether the half-split modifier is held.
    #[inline]
    #[must_use]
    pub const fn precise_split(&self) -> bool {
        self.precise_split
    }

    /// Sets the half-split modifier.
    pub fn set_precise_split(&mut self, active: bool) {
        self.precise_split = active;
    }

    /// The open bench's craft queue.
    #[inline]
    #[must_use]
    pub const fn craft_queue(&self) -> &CraftQueue {
        &self.craft_queue
    }

    /// Ingredients held back by the craft queue.
    #[must_use]
    pub fn reservations(&self) -> ReservationMap {
        self.craft_queue.reservations()
    }

    /// Progress of the running craft job.
    #[must_use]
    pub fn queue_progress(&self, now_ms: u64) -> Option<JobProgress> {
        self.craft_queue.active_progress(now_ms)
    }

    /// Item names seen in pushes that the catalog does not know yet.
    pub fn take_unknown_items(&mut self) -> Vec<String> {
        std::mem::take(&mut self.unknown_items).into_iter().collect()
    }

    /// Container whose contents feed crafting: the player's backpack,
    /// else the bench storage, else the player.
    #[must_use]
    pub fn crafting_storage(&self) -> &Container {
        self.state
            .left
            .backpack
            .as_deref()
            .or(self.state.right.storage.as_deref())
            .unwrap_or(&self.state.left)
    }

    /// Whether the slot may start a drag: listings must be purchasable
    /// and recipes craftable.
    #[must_use]
    pub fn can_drag(&self, endpoint: Endpoint, slot: u32) -> bool {
        let Some(container) = self.state.container(endpoint) else {
            return false;
        };
        let Some(item) = container.item(slot) else {
            return false;
        };
        rules::can_purchase(item, container, self.state.left.groups.as_ref())
            && rules::can_craft(
                item,
                &container.kind,
                &self.reservations(),
                self.crafting_storage(),
                &self.catalog,
            )
    }

    /// Name of the item a gesture starts from when the catalog has no
    /// entry for it yet.
    #[must_use]
    pub fn uncached_source_item(&self, source: &DragSource) -> Option<String> {
        let item = match source.kind {
            ContainerKind::Utility | ContainerKind::OtherUtility => return None,
            ContainerKind::Shop | ContainerKind::Crafting => self.state.right.item(source.slot)?,
            _ => {
                let endpoint =
                    resolver::resolve_endpoint(&self.state, Some(&source.kind), source.inventory_id.as_deref())
                        .unwrap_or(Endpoint::Left);
                self.state.container(endpoint)?.item(source.slot)?
            }
        };
        (!self.catalog.contains(&item.name)).then(|| item.name.clone())
    }

    /// Craft limit of a bench recipe, net of reservations.
    #[must_use]
    pub fn max_craftable(&self, recipe_slot: u32) -> Option<CraftLimit> {
        let bench = self.bench().ok()?;
        let recipe = bench.item(recipe_slot)?;
        Some(rules::max_craftable(
            recipe,
            &self.reservations(),
            self.crafting_storage(),
            &self.catalog,
        ))
    }

    /// Lock gates of a bench recipe.
    #[must_use]
    pub fn recipe_lock(&self, recipe_slot: u32) -> Option<RecipeLock> {
        let bench = self.bench().ok()?;
        Some(recipe_lock(bench.item(recipe_slot)?, bench.crafting.as_ref()))
    }

    fn bench(&self) -> IntentResult<&Container> {
        if self.state.right.kind == ContainerKind::Crafting {
            Ok(&self.state.right)
        } else {
            Err(IntentAbort::NoBench)
        }
    }

    fn shop(&self) -> IntentResult<&Container> {
        if self.state.right.kind == ContainerKind::Shop {
            Ok(&self.state.right)
        } else {
            Err(IntentAbort::NoShop)
        }
    }

    // ------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------

    /// Routes a drop: shop sources purchase, bench sources craft, anything
    /// else is a general transfer.
    ///
    /// # Errors
    ///
    /// Returns the [`IntentAbort`] of the first failed precondition.
    pub fn drop_item(&mut self, source: &DragSource, target: &DropTarget) -> IntentResult<Dispatch> {
        if target.kind.is_catalog() {
            return Err(IntentAbort::ReadOnlyTarget(target.kind.clone()));
        }
        if source.slot == target.slot && source.kind == target.kind {
            return Err(IntentAbort::SameSlot);
        }
        let dispatch = match source.kind {
            ContainerKind::Shop => self.purchase(source.slot, target.slot, None),
            ContainerKind::Crafting => self.craft(source.slot, Some(target.slot), None),
            _ => self.transfer(source, Some(target)),
        };
        if let Err(abort) = &dispatch {
            tracing::debug!(%abort, from = %source.kind, to = %target.kind, "drop aborted");
        }
        dispatch
    }

    /// Sends an item to the opposite side without naming a slot.
    ///
    /// # Errors
    ///
    /// Returns the [`IntentAbort`] of the first failed precondition.
    pub fn quick_move(&mut self, source: &DragSource) -> IntentResult<Dispatch> {
        let dispatch = self.transfer(source, None);
        if let Err(abort) = &dispatch {
            tracing::debug!(%abort, from = %source.kind, "quick move aborted");
        }
        dispatch
    }

    /// Units a general transfer moves.
    fn transfer_count(&self, item: &ItemInstance, from_kind: &ContainerKind) -> u32 {
        let units = item.units();
        if self.precise_split && units > 1 && *from_kind != ContainerKind::Shop {
            return units / 2;
        }
        if self.drag_quantity == 0 || self.drag_quantity > units {
            units
        } else {
            self.drag_quantity
        }
    }

    /// General transfer with optimistic write.
    ///
    /// # Errors
    ///
    /// Returns the [`IntentAbort`] of the first failed precondition.
    pub fn transfer(&mut self, source: &DragSource, target: Option<&DropTarget>) -> IntentResult<Dispatch> {
        match source.kind {
            ContainerKind::Utility => return self.release_utility(source, target.map(|t| t.slot)),
            ContainerKind::OtherUtility => return Err(IntentAbort::UnresolvedTarget),
            _ => {}
        }

        let Resolution {
            source: from_endpoint,
            target: to_endpoint,
        } = resolver::resolve_transfer(
            &self.state,
            &source.kind,
            source.inventory_id.as_deref(),
            target.map(|t| &t.kind),
            target.and_then(|t| t.inventory_id.as_deref()),
        );
        let to_endpoint = to_endpoint.ok_or(IntentAbort::UnresolvedTarget)?;

        let from_container = self.state.require(from_endpoint)?;
        let item = from_container
            .item(source.slot)
            .cloned()
            .ok_or(IntentAbort::EmptySource)?;
        if from_container.kind.is_catalog() && item.count.is_none() {
            return Err(IntentAbort::IncompleteListing);
        }
        let from_kind = from_container.kind.clone();
        let from_id = from_container.id.clone();

        let entry = self
            .catalog
            .get(&item.name)
            .ok_or_else(|| IntentAbort::UnknownItem(item.name.clone()))?;

        let open_id = self.state.right.id.clone();
        let to_container = self.state.require(to_endpoint)?;
        if let Some(link) = item.container_link() {
            if to_container.kind == ContainerKind::Container {
                return Err(IntentAbort::NestedContainer);
            }
            if link == open_id {
                return Err(IntentAbort::ContainerOpen(link));
            }
        }

        let to_slot = match target {
            Some(target) => {
                to_container
                    .slot(target.slot)
                    .ok_or(IntentAbort::NoSuchSlot(target.slot))?;
                target.slot
            }
            None => rules::find_available_slot(&item, &entry, to_container, false, self.config.hotbar_slots)
                .ok_or(IntentAbort::NoFreeSlot)?,
        };
        let resting = to_container.item(to_slot).cloned();
        if let Some(link) = resting.as_ref().and_then(ItemInstance::container_link) {
            if link == open_id {
                return Err(IntentAbort::ContainerOpen(link));
            }
        }
        let to_kind = to_container.kind.clone();
        let to_id = to_container.id.clone();

        let from = SlotRef::new(from_endpoint, source.slot);
        let to = SlotRef::new(to_endpoint, to_slot);
        if from == to {
            return Err(IntentAbort::SameSlot);
        }

        let count = self.transfer_count(&item, &from_kind);
        let kind = operators::classify(&item, resting.as_ref(), entry.stack);
        let request = Request::Transfer(TransferRequest {
            from_slot: source.slot,
            from_type: from_kind,
            to_slot,
            to_type: to_kind,
            count,
            from_inventory: Some(source.inventory_id.clone().unwrap_or(from_id)),
            to_inventory: Some(target.and_then(|t| t.inventory_id.clone()).unwrap_or(to_id)),
        });

        let now = durability::now_epoch_secs();
        let ticket = self.ledger.apply(&mut self.state, operation::SWAP_ITEMS, |state| {
            operators::apply(state, kind, from, to, count, now)
        })?;
        tracing::info!(
            ticket = ticket.id(),
            item = %item.name,
            count,
            operator = ?kind,
            "transfer dispatched"
        );
        Ok(Dispatch {
            ticket: Some(ticket),
            request,
        })
    }

    /// Buys from the open shop into a player slot.
    ///
    /// # Errors
    ///
    /// Returns the [`IntentAbort`] of the first failed precondition.
    pub fn purchase(&mut self, shop_slot: u32, to_slot: u32, payment: Option<PaymentMethod>) -> IntentResult<Dispatch> {
        let shop = self.shop()?;
        let listing = shop.item(shop_slot).ok_or(IntentAbort::EmptySource)?;
        if listing.count == Some(0) {
            return Err(IntentAbort::OutOfStock);
        }
        if !rules::can_purchase(listing, shop, self.state.left.groups.as_ref()) {
            return Err(IntentAbort::NotPermitted);
        }
        if !self.catalog.contains(&listing.name) {
            return Err(IntentAbort::UnknownItem(listing.name.clone()));
        }
        self.state
            .left
            .slot(to_slot)
            .ok_or(IntentAbort::NoSuchSlot(to_slot))?;

        let count = match (self.drag_quantity, listing.count) {
            (0, _) => 1,
            (wanted, Some(stock)) => wanted.min(stock),
            (wanted, None) => wanted,
        }
        .max(1);
        let request = Request::Purchase(PurchaseRequest {
            from_slot: shop_slot,
            from_type: shop.kind.clone(),
            to_slot,
            to_type: self.state.left.kind.clone(),
            count,
            payment: payment.unwrap_or(self.config.default_payment),
        });
        let name = listing.name.clone();

        let ticket = self.ledger.begin(&self.state, operation::BUY_ITEM);
        tracing::info!(ticket = ticket.id(), item = %name, count, "purchase dispatched");
        Ok(Dispatch {
            ticket: Some(ticket),
            request,
        })
    }

    /// Enqueues a craft at the open bench.
    ///
    /// Without an explicit `count` the drag quantity is used (at least 1);
    /// an explicit count is clamped to what the ingredients allow.
    ///
    /// # Errors
    ///
    /// Returns the [`IntentAbort`] of the first failed precondition.
    pub fn craft(&mut self, recipe_slot: u32, to_slot: Option<u32>, count: Option<u32>) -> IntentResult<Dispatch> {
        let bench = self.bench()?;
        let recipe = bench.item(recipe_slot).ok_or(IntentAbort::EmptySource)?;
        if recipe.count == Some(0) {
            return Err(IntentAbort::OutOfStock);
        }
        if !self.catalog.contains(&recipe.name) {
            return Err(IntentAbort::UnknownItem(recipe.name.clone()));
        }
        if let Some(slot) = to_slot {
            self.state.left.slot(slot).ok_or(IntentAbort::NoSuchSlot(slot))?;
        }
        if recipe_lock(recipe, bench.crafting.as_ref()).is_locked() {
            return Err(IntentAbort::RecipeLocked);
        }
        let reserved = self.reservations();
        let storage = self.crafting_storage();
        if !rules::can_craft(recipe, &bench.kind, &reserved, storage, &self.catalog) {
            return Err(IntentAbort::MissingIngredients);
        }

        let count = match count {
            Some(requested) => rules::max_craftable(recipe, &reserved, storage, &self.catalog).clamp(requested),
            None => self.drag_quantity.max(1),
        };
        let storage_id = self
            .state
            .left
            .backpack
            .as_deref()
            .or(bench.storage.as_deref())
            .map(|storage| storage.id.clone());
        let request = Request::Craft(CraftRequest {
            bench_id: bench.id.clone(),
            bench_index: bench.index,
            recipe_slot,
            storage_id,
            count,
            to_slot,
        });
        let name = recipe.name.clone();

        let ticket = self.ledger.begin(&self.state, operation::CRAFT_ITEM);
        tracing::info!(ticket = ticket.id(), recipe = %name, count, "craft dispatched");
        Ok(Dispatch {
            ticket: Some(ticket),
            request,
        })
    }

    /// Cancels the job at 0-based queue `position`.
    ///
    /// # Errors
    ///
    /// Fails without a bench or when the position is past the queue end.
    pub fn cancel_craft(&self, position: usize) -> IntentResult<Dispatch> {
        let bench = self.bench()?;
        if position >= self.craft_queue.len() {
            return Err(IntentAbort::NoSuchJob(position));
        }
        let job_index = u32::try_from(position + 1).map_err(|_| IntentAbort::NoSuchJob(position))?;
        tracing::info!(bench = %bench.id, job_index, "craft cancel dispatched");
        Ok(Dispatch {
            ticket: None,
            request: Request::CancelCraft(CancelCraftRequest {
                bench_id: bench.id.clone(),
                job_index,
            }),
        })
    }

    /// Moves a player item into utility strip position `utility_slot`.
    ///
    /// # Errors
    ///
    /// Fails if the player slot is empty or the strip has no such position.
    pub fn assign_utility(&self, from_slot: u32, utility_slot: u32) -> IntentResult<Dispatch> {
        let strip = self
            .state
            .left
            .utility
            .as_ref()
            .ok_or(IntentAbort::UnresolvedUtilitySlot)?;
        if !(1..=strip.slots).contains(&utility_slot) {
            return Err(IntentAbort::UnresolvedUtilitySlot);
        }
        self.state.left.item(from_slot).ok_or(IntentAbort::EmptySource)?;
        Ok(Dispatch {
            ticket: None,
            request: Request::AssignUtility(UtilityAssignRequest { utility_slot, from_slot }),
        })
    }

    /// Moves an item out of the player's utility strip.
    fn release_utility(&self, source: &DragSource, to_slot: Option<u32>) -> IntentResult<Dispatch> {
        let strip = self
            .state
            .left
            .utility
            .as_ref()
            .ok_or(IntentAbort::UnresolvedUtilitySlot)?;
        let item = strip
            .items
            .iter()
            .find(|slot| slot.index == source.slot)
            .and_then(Slot::item);
        let utility_slot = strip
            .position_of(source.slot, item)
            .ok_or(IntentAbort::UnresolvedUtilitySlot)?;
        tracing::info!(utility_slot, ?to_slot, "utility release dispatched");
        Ok(Dispatch {
            ticket: None,
            request: Request::ReleaseUtility(UtilityReleaseRequest { utility_slot, to_slot }),
        })
    }

    // ------------------------------------------------------------------
    // Settlement
    // ------------------------------------------------------------------

    /// Applies the authority's verdict on a ticket.
    pub fn settle(&mut self, ticket: Ticket, outcome: &Outcome) -> Settlement {
        match outcome {
            Outcome::Fulfilled => self.ledger.commit(ticket),
            Outcome::Rejected(reason) => {
                tracing::info!(ticket = ticket.id(), ?reason, "confirmation rejected");
                self.ledger.rollback(ticket, &mut self.state)
            }
        }
    }
}
