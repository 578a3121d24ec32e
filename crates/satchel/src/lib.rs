//! # SATCHEL
//!
//! Multi-container inventory transfer engine, integrating all layers.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            SATCHEL                               │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌──────────────────┐    ┌──────────────────┐                    │
//! │  │ satchel_inventory│    │  satchel_sync    │                    │
//! │  │                  │───>│                  │                    │
//! │  │ • Containers     │    │ • Intents        │    ┌────────────┐  │
//! │  │ • Operators      │    │ • Ledger         │<──>│ Authority  │  │
//! │  │ • Rules          │    │ • Push apply     │    └────────────┘  │
//! │  │ • Catalog        │    │ • Transport      │                    │
//! │  └──────────────────┘    └────────┬─────────┘                    │
//! │                                   │                              │
//! │                          ┌────────┴─────────┐                    │
//! │                          │  satchel         │                    │
//! │                          │ • Session driver │                    │
//! │                          │ • Push bus       │                    │
//! │                          │ • Config, logs   │                    │
//! │                          └──────────────────┘                    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML configuration
//! - `events`: inbound push bus
//! - `session`: async confirmation driver

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod events;
pub mod session;

pub use satchel_inventory as inventory;
pub use satchel_sync as sync;

pub use config::{AuthorityConfig, ConfigError, ConfigResult, EngineConfig};
pub use events::{InboundPush, PushBus, PushReceiver, PushSender};
pub use session::{Completion, Session, SessionError, SessionResult};

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Returns false if a subscriber
/// was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
