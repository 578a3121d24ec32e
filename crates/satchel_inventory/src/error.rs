//! # Inventory Error Types
//!
//! All errors that can occur while reading or mutating inventory state.

use thiserror::Error;

use crate::state::Endpoint;

/// Errors that can occur in the inventory model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// The endpoint is not open (for example no backpack is attached).
    #[error("endpoint {0:?} is not open")]
    EndpointUnavailable(Endpoint),

    /// A slot index outside `1..=slots`.
    #[error("slot {index} out of range for container '{container}' ({slots} slots)")]
    SlotOutOfRange {
        /// The container id.
        container: String,
        /// The requested 1-based index.
        index: u32,
        /// Slot count of the container.
        slots: u32,
    },

    /// The slot holds no item.
    #[error("slot {index} of container '{container}' is empty")]
    EmptySlot {
        /// The container id.
        container: String,
        /// The 1-based index.
        index: u32,
    },

    /// Source and destination are the same slot.
    #[error("source and destination are the same slot")]
    SameSlot,

    /// The two items may not share a slot.
    #[error("cannot stack '{moving}' onto '{resting}'")]
    IncompatibleStack {
        /// Name of the moving item.
        moving: String,
        /// Name of the item already in the destination.
        resting: String,
    },

    /// Requested count outside `1..=available`.
    #[error("count {count} outside 1..={available}")]
    InvalidCount {
        /// The requested count.
        count: u32,
        /// Units held by the source slot.
        available: u32,
    },
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;
