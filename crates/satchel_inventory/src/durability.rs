//! # Durability
//!
//! Metadata `durability` is either a percentage (0..=100) or, for items
//! that decay over time, an absolute epoch timestamp at which the item is
//! spent. Timestamps are turned back into a percentage using the
//! `degrade` rate (minutes of life).

use std::time::{SystemTime, UNIX_EPOCH};

use crate::item::{ItemInstance, Metadata, META_DEGRADE, META_DURABILITY};

/// Durability values above this are decay timestamps.
pub const DECAY_TIMESTAMP_THRESHOLD: f64 = 100.0;

/// Current time in epoch seconds.
#[must_use]
pub fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

/// Current time in epoch milliseconds.
#[must_use]
pub fn now_epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Durability percentage of a metadata map at `now` (epoch seconds).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn durability_at(metadata: Option<&Metadata>, now: i64) -> Option<f64> {
    let metadata = metadata?;
    let stored = metadata.get(META_DURABILITY)?.as_f64()?;
    let degrade = metadata
        .get(META_DEGRADE)
        .and_then(serde_json::Value::as_f64)
        .filter(|rate| *rate > 0.0);

    match degrade {
        Some(rate) if stored > DECAY_TIMESTAMP_THRESHOLD => {
            let percent = (stored - now as f64) / (60.0 * rate) * 100.0;
            Some(percent.max(0.0))
        }
        _ => Some(stored.clamp(0.0, 100.0)),
    }
}

/// Recomputes the cached durability of an item.
pub fn refresh(item: &mut ItemInstance, now: i64) {
    item.durability = durability_at(item.metadata.as_ref(), now);
}
