//! # Transfer Operators
//!
//! The three slot mutations behind every optimistic transfer.
//!
//! | Operator | Destination | Effect |
//! |----------|-------------|--------|
//! | [`move_slots`] | empty | copy `count` units into it |
//! | [`stack_slots`] | compatible stack | add `count` units to it |
//! | [`swap_slots`] | anything | exchange both contents |
//!
//! Move and Stack preserve per-unit weight on both sides: a stack of
//! weight `w` and count `n` always weighs `w / n` per unit after a split
//! or a merge. Catalog-class sources (shop, crafting) are never
//! decremented. Durability is recomputed on every written item.
//!
//! Operators read the source before writing anything, validate their
//! inputs, and leave the state untouched on error.

use crate::durability;
use crate::error::{InventoryError, InventoryResult};
use crate::item::{ItemInstance, Slot};
use crate::rules::stack_compatible;
use crate::state::{RootState, SlotRef};

/// Which operator a transfer resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferKind {
    /// Destination empty.
    Move,
    /// Destination holds a compatible stack of a stacking item.
    Stack,
    /// Destination holds something else.
    Swap,
}

/// Source item and its read-only flag, validated against `count`.
fn read_source(state: &RootState, from: SlotRef, to: SlotRef, count: u32) -> InventoryResult<(ItemInstance, bool)> {
    if from == to {
        return Err(InventoryError::SameSlot);
    }
    let container = state.require(from.endpoint)?;
    let item = container
        .item(from.index)
        .cloned()
        .ok_or_else(|| InventoryError::EmptySlot {
            container: container.id.clone(),
            index: from.index,
        })?;
    let available = item.units();
    if count == 0 || count > available {
        return Err(InventoryError::InvalidCount { count, available });
    }
    Ok((item, container.kind.is_catalog()))
}

fn check_dest(state: &RootState, to: SlotRef) -> InventoryResult<()> {
    let container = state.require(to.endpoint)?;
    if container.slot(to.index).is_none() {
        return Err(InventoryError::SlotOutOfRange {
            container: container.id.clone(),
            index: to.index,
            slots: container.slot_count(),
        });
    }
    Ok(())
}

/// Writes what is left of the source after `count` units left it.
fn settle_source(
    state: &mut RootState,
    from: SlotRef,
    source: ItemInstance,
    count: u32,
    read_only: bool,
) -> InventoryResult<()> {
    if read_only {
        return Ok(());
    }
    let piece = source.unit_weight();
    let remaining = source.units() - count;
    let slot = if remaining > 0 {
        let mut rest = source;
        rest.count = Some(remaining);
        rest.weight = piece * f64::from(remaining);
        Slot::occupied(from.index, rest)
    } else {
        Slot::empty(from.index)
    };
    state.require_mut(from.endpoint)?.set_slot(slot)
}

/// Moves `count` units from `from` into the slot at `to`.
///
/// # Errors
///
/// Fails if either endpoint is closed, the source is empty, `to` is out of
/// range, the slots are the same, or `count` is outside `1..=units`.
pub fn move_slots(state: &mut RootState, from: SlotRef, to: SlotRef, count: u32, now: i64) -> InventoryResult<()> {
    let (source, read_only) = read_source(state, from, to, count)?;
    check_dest(state, to)?;

    let mut placed = source.clone();
    placed.count = Some(count);
    placed.weight = source.unit_weight() * f64::from(count);
    durability::refresh(&mut placed, now);

    state.require_mut(to.endpoint)?.set_slot(Slot::occupied(to.index, placed))?;
    settle_source(state, from, source, count, read_only)
}

/// Merges `count` units from `from` into the compatible stack at `to`.
///
/// # Errors
///
/// As [`move_slots`], plus [`InventoryError::IncompatibleStack`] when the
/// destination is empty or holds an incompatible item.
pub fn stack_slots(state: &mut RootState, from: SlotRef, to: SlotRef, count: u32, now: i64) -> InventoryResult<()> {
    let (source, read_only) = read_source(state, from, to, count)?;
    check_dest(state, to)?;

    let resting = state.item(to).cloned();
    let mut merged = match resting {
        Some(resting) if stack_compatible(&source, &resting) => resting,
        resting => {
            return Err(InventoryError::IncompatibleStack {
                moving: source.name,
                resting: resting.map(|item| item.name).unwrap_or_default(),
            })
        }
    };
    let total = merged.units() + count;
    merged.count = Some(total);
    merged.weight = source.unit_weight() * f64::from(total);
    durability::refresh(&mut merged, now);

    state.require_mut(to.endpoint)?.set_slot(Slot::occupied(to.index, merged))?;
    settle_source(state, from, source, count, read_only)
}

/// Exchanges the contents of two slots; each slot keeps its index.
///
/// # Errors
///
/// Fails if either endpoint is closed, either index is out of range or the
/// slots are the same.
pub fn swap_slots(state: &mut RootState, from: SlotRef, to: SlotRef, now: i64) -> InventoryResult<()> {
    if from == to {
        return Err(InventoryError::SameSlot);
    }
    check_dest(state, from)?;
    check_dest(state, to)?;

    let take = |state: &RootState, at: SlotRef| {
        state.item(at).cloned().map(|mut item| {
            durability::refresh(&mut item, now);
            item
        })
    };
    let incoming = take(state, from);
    let outgoing = take(state, to);

    let to_slot = incoming.map_or_else(|| Slot::empty(to.index), |item| Slot::occupied(to.index, item));
    let from_slot = outgoing.map_or_else(|| Slot::empty(from.index), |item| Slot::occupied(from.index, item));
    state.require_mut(to.endpoint)?.set_slot(to_slot)?;
    state.require_mut(from.endpoint)?.set_slot(from_slot)
}

/// Picks the operator for a transfer: Stack onto a compatible stack of a
/// stacking item, Swap onto any other occupant, Move into an empty slot.
#[must_use]
pub fn classify(source: &ItemInstance, resting: Option<&ItemInstance>, stackable: bool) -> TransferKind {
    match resting {
        None => TransferKind::Move,
        Some(resting) if stackable && stack_compatible(source, resting) => TransferKind::Stack,
        Some(_) => TransferKind::Swap,
    }
}

/// Runs the operator selected by `kind`.
///
/// # Errors
///
/// Propagates the operator's error.
pub fn apply(
    state: &mut RootState,
    kind: TransferKind,
    from: SlotRef,
    to: SlotRef,
    count: u32,
    now: i64,
) -> InventoryResult<()> {
    match kind {
        TransferKind::Move => move_slots(state, from, to, count, now),
        TransferKind::Stack => stack_slots(state, from, to, count, now),
        TransferKind::Swap => swap_slots(state, from, to, now),
    }
}
