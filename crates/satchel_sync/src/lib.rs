//! # SATCHEL Sync - Optimistic Inventory Client
//!
//! Turns player gestures into authority requests, writes their effect
//! locally before the authority answers, and undoes it on refusal.
//!
//! ## Architecture
//!
//! - **Client**: owns local state; intents check preconditions and dispatch
//! - **Ledger**: one snapshot per outstanding confirmation
//! - **Protocol**: request payloads, response shapes, push events
//! - **Transport**: the request/response seam to the authority
//! - **Simulation**: an in-process authority for tests and demos
//!
//! ## Trust Model
//!
//! ```text
//! CLIENT                              AUTHORITY
//!   |                                     |
//!   |--- swapItems {from, to, count} ---->|
//!   |    (local state already moved)      | <- validates
//!   |<-- true | {success:false} ----------|
//!   |    (commit | restore snapshot)      |
//!   |                                     |
//!   |<-- refreshSlots (authoritative) ----|
//! ```
//!
//! The authority always wins: its pushes overwrite local state without
//! consulting the ledger.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod ledger;
pub mod protocol;
pub mod simulation;
pub mod transport;

pub use client::{ClientConfig, DragSource, Dispatch, DropTarget, IntentAbort, IntentResult, InventoryClient, PushReport};
pub use ledger::{ConfirmationLedger, Settlement, Snapshot, Ticket};
pub use protocol::{DecodeError, Outcome, PaymentMethod, PushEvent, RejectReason, Request, Response};
pub use simulation::{AuthorityConditions, ReceivedRequest, SimulatedAuthority, Verdict};
pub use transport::{confirm, ChannelCatalog, ChannelStats, RemoteChannel, TransportError, TransportResult};
