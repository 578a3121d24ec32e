//! # SATCHEL Inventory Model
//!
//! Pure inventory logic for the SATCHEL transfer engine.
//!
//! ## Design Principles
//!
//! 1. **Fixed hierarchy** - two top-level containers, at most four transfer endpoints
//! 2. **Occupancy at construction** - a slot is `Empty` or `Occupied`, never "maybe"
//! 3. **Weight in lockstep** - per-unit weight survives every split and merge
//! 4. **No I/O** - the catalog fetch is a trait implemented by the sync layer
//!
//! ## Example
//!
//! ```rust,ignore
//! use satchel_inventory::{operators, Endpoint, RootState, SlotRef};
//!
//! let mut state: RootState = serde_json::from_value(setup)?;
//! operators::move_slots(
//!     &mut state,
//!     SlotRef::new(Endpoint::Left, 1),
//!     SlotRef::new(Endpoint::Right, 4),
//!     2,
//!     durability::now_epoch_secs(),
//! )?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod container;
pub mod crafting;
pub mod durability;
pub mod error;
pub mod item;
pub mod operators;
pub mod resolver;
pub mod rules;
pub mod state;

pub use catalog::{CatalogEntry, CatalogSource, ItemCatalog};
pub use container::{Container, ContainerKind, CraftingInfo, Groups, UtilityStrip, XpInfo};
pub use crafting::{recipe_lock, CraftJob, CraftQueue, JobProgress, QueueEntry, RecipeLock, ReservationMap};
pub use error::{InventoryError, InventoryResult};
pub use item::{GradeRequirement, ItemInstance, Metadata, RecipeXp, Slot, SlotContent};
pub use operators::TransferKind;
pub use resolver::{Resolution, PLAYER_SENTINEL};
pub use rules::{CraftLimit, HOTBAR_SLOTS};
pub use state::{Endpoint, RootState, SlotRef};
