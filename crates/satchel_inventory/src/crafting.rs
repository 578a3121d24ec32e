//! # Crafting Queue & Reservation
//!
//! The authority owns the craft queue and pushes it whole. Each entry is
//! resolved against the bench's recipe slots into a [`CraftJob`].
//!
//! ## Reservation
//!
//! Ingredients of queued jobs are still in the player's storage until the
//! job finishes. The [`ReservationMap`] sums `required × craft_count` per
//! ingredient over the whole queue; every availability check subtracts it
//! so the same units are never offered twice.
//!
//! ## Lock gates
//!
//! Recipes can be gated behind crafting experience and blueprints, see
//! [`recipe_lock`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::container::{Container, CraftingInfo};
use crate::item::ItemInstance;

/// Duration of a job whose recipe and queue entry carry none.
pub const DEFAULT_CRAFT_DURATION_MS: u64 = 3000;

/// Reserved quantity per ingredient name.
pub type ReservationMap = BTreeMap<String, f64>;

/// A queue entry as the authority sends it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// 1-based recipe slot on the bench.
    pub recipe_slot: u32,
    /// Units to craft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub craft_count: Option<u32>,
    /// Start time in epoch seconds; present on the running job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<f64>,
    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Recipe name, used when the bench slot cannot be found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
}

/// A queued craft resolved against its recipe.
#[derive(Clone, Debug, PartialEq)]
pub struct CraftJob {
    /// 1-based recipe slot on the bench.
    pub recipe_slot: u32,
    /// Crafted item name.
    pub name: String,
    /// Units to craft, at least 1.
    pub craft_count: u32,
    /// Per-unit ingredient requirements.
    pub ingredients: BTreeMap<String, f64>,
    /// Start time in epoch milliseconds.
    pub started_at_ms: Option<u64>,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

/// Progress of the running job.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JobProgress {
    /// Completed fraction in `0.0..=1.0`.
    pub fraction: f64,
    /// Milliseconds left.
    pub remaining_ms: u64,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seconds_to_millis(seconds: f64) -> u64 {
    (seconds * 1000.0).max(0.0) as u64
}

impl CraftJob {
    /// Resolves a queue entry against the bench recipes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn resolve(entry: &QueueEntry, bench: &Container) -> Self {
        let recipe = bench.item(entry.recipe_slot);

        let base_count = recipe.and_then(|r| r.count).unwrap_or(1);
        let duration_ms = entry
            .duration
            .filter(|d| *d > 0.0)
            .map(seconds_to_millis)
            .or_else(|| recipe.and_then(|r| r.duration).map(|d| d.max(0.0) as u64))
            .unwrap_or(DEFAULT_CRAFT_DURATION_MS);

        Self {
            recipe_slot: entry.recipe_slot,
            name: recipe
                .map(|r| r.name.clone())
                .or_else(|| entry.recipe.clone())
                .unwrap_or_default(),
            craft_count: entry.craft_count.unwrap_or(base_count).max(1),
            ingredients: recipe
                .and_then(|r| r.ingredients.clone())
                .unwrap_or_default(),
            started_at_ms: entry
                .started_at
                .filter(|s| *s > 0.0)
                .map(seconds_to_millis),
            duration_ms: duration_ms.max(1),
        }
    }

    /// Progress at `now_ms`; zero if the job has not started.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self, now_ms: u64) -> JobProgress {
        let elapsed = self
            .started_at_ms
            .map_or(0, |start| now_ms.saturating_sub(start).min(self.duration_ms));
        JobProgress {
            fraction: (elapsed as f64 / self.duration_ms as f64).clamp(0.0, 1.0),
            remaining_ms: self.duration_ms - elapsed,
        }
    }
}

/// The authority's craft queue for the open bench.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CraftQueue {
    jobs: Vec<CraftJob>,
}

impl CraftQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Resolves a whole queue push against the bench.
    #[must_use]
    pub fn from_entries(entries: &[QueueEntry], bench: &Container) -> Self {
        Self {
            jobs: entries
                .iter()
                .map(|entry| CraftJob::resolve(entry, bench))
                .collect(),
        }
    }

    /// Jobs in authority order.
    #[inline]
    #[must_use]
    pub fn jobs(&self) -> &[CraftJob] {
        &self.jobs
    }

    /// Number of queued jobs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the queue is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// The head job if it has started.
    #[must_use]
    pub fn active(&self) -> Option<&CraftJob> {
        self.jobs.first().filter(|job| job.started_at_ms.is_some())
    }

    /// Progress of the active job.
    #[must_use]
    pub fn active_progress(&self, now_ms: u64) -> Option<JobProgress> {
        self.active().map(|job| job.progress(now_ms))
    }

    /// Ingredient quantities held back by every queued job.
    #[must_use]
    pub fn reservations(&self) -> ReservationMap {
        let mut reserved = ReservationMap::new();
        for job in &self.jobs {
            for (name, amount) in &job.ingredients {
                *reserved.entry(name.clone()).or_insert(0.0) += amount * f64::from(job.craft_count);
            }
        }
        reserved
    }
}

/// Experience and blueprint gate state of a recipe.
#[derive(Clone, Debug, PartialEq)]
pub struct RecipeLock {
    /// Experience the recipe requires.
    pub required_xp: f64,
    /// Whether the player meets it (always true when gates are off).
    pub meets_xp: bool,
    /// Blueprint key gating the recipe.
    pub blueprint: Option<String>,
    /// Whether the player holds the blueprint (true when none is needed).
    pub has_blueprint: bool,
}

impl RecipeLock {
    /// Whether either gate blocks the recipe.
    #[inline]
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        !(self.meets_xp && self.has_blueprint)
    }
}

/// Evaluates the lock gates of `recipe` against the bench crafting info.
#[must_use]
pub fn recipe_lock(recipe: &ItemInstance, crafting: Option<&CraftingInfo>) -> RecipeLock {
    let required_xp = recipe.xp.as_ref().and_then(|xp| xp.required).unwrap_or(0.0);
    let xp = crafting.and_then(|c| c.xp.as_ref());
    let meets_xp = xp.map_or(true, |xp| !xp.enabled || xp.current >= required_xp);

    let has_blueprint = recipe.blueprint.as_ref().map_or(true, |key| {
        crafting
            .and_then(|c| c.blueprints.as_ref())
            .and_then(|held| held.get(key))
            .copied()
            .unwrap_or(false)
    });

    RecipeLock {
        required_xp,
        meets_xp,
        blueprint: recipe.blueprint.clone(),
        has_blueprint,
    }
}
