//! # Engine Configuration
//!
//! TOML-backed settings. Every field has a default; a file only needs the
//! keys it changes.
//!
//! ```toml
//! hotbar_slots = 5
//! request_timeout_ms = 3000
//! default_payment = "bank"
//! log_filter = "satchel=debug,satchel_sync=debug"
//!
//! [authority]
//! latency_ms = 40
//! refusal_percent = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use satchel_inventory::HOTBAR_SLOTS;
use satchel_sync::{AuthorityConditions, ClientConfig, PaymentMethod};

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`EngineConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings of the simulated authority used by the demo binary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Base latency in milliseconds.
    pub latency_ms: u32,
    /// Jitter in milliseconds.
    pub jitter_ms: u32,
    /// Refused confirmations (0-100).
    pub refusal_percent: u8,
    /// Confirmations that never answer (0-100).
    pub stall_percent: u8,
    /// Random seed.
    pub seed: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        let good = AuthorityConditions::GOOD;
        Self {
            latency_ms: good.base_latency_ms,
            jitter_ms: good.jitter_ms,
            refusal_percent: good.refusal_percent,
            stall_percent: good.stall_percent,
            seed: 0x5A7C_4E11,
        }
    }
}

impl AuthorityConfig {
    /// Simulator conditions for these settings.
    #[must_use]
    pub fn conditions(&self) -> AuthorityConditions {
        AuthorityConditions {
            base_latency_ms: self.latency_ms,
            jitter_ms: self.jitter_ms,
            refusal_percent: self.refusal_percent.min(100),
            stall_percent: self.stall_percent.min(100),
        }
    }
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Player slots excluded from automatic placement.
    pub hotbar_slots: u32,
    /// Deadline for one confirmation round trip.
    pub request_timeout_ms: u64,
    /// Payment method when a purchase does not name one.
    pub default_payment: PaymentMethod,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Capacity of the inbound push bus.
    pub push_capacity: usize,
    /// Simulated authority settings.
    pub authority: AuthorityConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hotbar_slots: HOTBAR_SLOTS,
            request_timeout_ms: 5_000,
            default_payment: PaymentMethod::Cash,
            log_filter: "info".to_owned(),
            push_capacity: 256,
            authority: AuthorityConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is malformed.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Confirmation deadline.
    #[inline]
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Client settings derived from this configuration.
    #[must_use]
    pub const fn client_config(&self) -> ClientConfig {
        ClientConfig {
            hotbar_slots: self.hotbar_slots,
            default_payment: self.default_payment,
        }
    }
}
