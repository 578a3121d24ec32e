//! # Wire Protocol
//!
//! JSON messages exchanged with the authority.
//!
//! ## Message Flow
//!
//! ```text
//! CLIENT                                   AUTHORITY
//!   |                                          |
//!   |--- request(operation, payload) --------->|
//!   |                                          | <- validates against truth
//!   |<-- bool | null | {success, data|error} --|
//!   |                                          |
//!   |<========= push(event, payload) ==========|  (at any time)
//! ```
//!
//! - [`requests`]: outbound operations and their camelCase payloads
//! - [`responses`]: decoding of the three response shapes into an [`Outcome`]
//! - [`push`]: inbound events that replace or patch local state

pub mod push;
pub mod requests;
pub mod responses;

pub use push::{DecodeError, PushEvent, RefreshBatch, SlotUpdate};
pub use requests::{
    CancelCraftRequest, CraftRequest, PaymentMethod, PurchaseRequest, Request, TransferRequest,
    UtilityAssignRequest, UtilityReleaseRequest,
};
pub use responses::{Outcome, RejectReason, Response};

/// Operation names understood by the authority.
pub mod operation {
    /// Generic transfer (move, stack or swap).
    pub const SWAP_ITEMS: &str = "swapItems";
    /// Shop purchase.
    pub const BUY_ITEM: &str = "buyItem";
    /// Craft enqueue.
    pub const CRAFT_ITEM: &str = "craftItem";
    /// Craft cancellation.
    pub const CANCEL_CRAFT: &str = "cancelCraft";
    /// Move out of the utility strip.
    pub const MOVE_FROM_UTILITY: &str = "moveFromUtilitySlot";
    /// Move into the utility strip.
    pub const MOVE_TO_UTILITY: &str = "moveToUtilitySlot";
    /// Catalog lookup.
    pub const GET_ITEM_DATA: &str = "getItemData";
}
