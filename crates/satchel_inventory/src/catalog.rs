//! # Item Catalog
//!
//! Read-through cache of item definitions keyed by name. The catalog is a
//! cheap, cloneable handle: every clone shares the same entries.
//!
//! Unknown names are fetched through a [`CatalogSource`] on first reference
//! and cached afterwards. The authority also pushes global count deltas
//! which are applied with [`ItemCatalog::adjust_count`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Definition of a catalog item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Catalog key.
    #[serde(default)]
    pub name: String,
    /// Display label.
    #[serde(default)]
    pub label: Option<String>,
    /// Weight of one unit.
    #[serde(default)]
    pub weight: f64,
    /// Whether units stack into one slot.
    #[serde(default = "default_stack")]
    pub stack: bool,
    /// Whether using the item closes the inventory.
    #[serde(default)]
    pub close: bool,
    /// Units the player holds across every container.
    #[serde(default)]
    pub count: i64,
    /// Icon path or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Description text.
    #[serde(default)]
    pub description: Option<String>,
}

const fn default_stack() -> bool {
    true
}

impl CatalogEntry {
    /// Creates an entry with default flags.
    #[must_use]
    pub fn new(name: impl Into<String>, weight: f64, stack: bool) -> Self {
        Self {
            name: name.into(),
            label: None,
            weight,
            stack,
            close: false,
            count: 0,
            image: None,
            description: None,
        }
    }
}

/// Where unknown catalog entries are fetched from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches the definition of `name`, or `None` if the authority does not know it.
    async fn item_data(&self, name: &str) -> Option<CatalogEntry>;
}

/// Shared item catalog handle.
#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    entries: Arc<RwLock<HashMap<String, CatalogEntry>>>,
}

impl ItemCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog seeded with entries.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let catalog = Self::new();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    /// Cached definition of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<CatalogEntry> {
        self.entries.read().get(name).cloned()
    }

    /// Whether `name` is cached.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Inserts or replaces an entry.
    pub fn insert(&self, entry: CatalogEntry) {
        self.entries.write().insert(entry.name.clone(), entry);
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Global held count of `name`.
    #[must_use]
    pub fn global_count(&self, name: &str) -> Option<i64> {
        self.entries.read().get(name).map(|entry| entry.count)
    }

    /// Applies a global count delta. Returns false if `name` is unknown.
    pub fn adjust_count(&self, name: &str, delta: i64) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(name) {
            Some(entry) => {
                entry.count = entry.count.saturating_add(delta);
                true
            }
            None => false,
        }
    }

    /// Names from `names` not yet cached, deduplicated.
    #[must_use]
    pub fn missing<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let entries = self.entries.read();
        let mut missing: Vec<String> = names
            .into_iter()
            .filter(|name| !name.is_empty() && !entries.contains_key(*name))
            .map(str::to_owned)
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// Returns the cached entry, fetching and caching it on a miss.
    pub async fn fetch<S>(&self, name: &str, source: &S) -> Option<CatalogEntry>
    where
        S: CatalogSource + ?Sized,
    {
        if let Some(entry) = self.get(name) {
            return Some(entry);
        }
        let entry = source.item_data(name).await?;
        if entry.name != name {
            tracing::warn!(requested = name, received = %entry.name, "catalog fetch returned another item");
            return None;
        }
        tracing::debug!(name, "catalog entry cached");
        self.insert(entry.clone());
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn item_data(&self, name: &str) -> Option<CatalogEntry> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (name == "water").then(|| CatalogEntry::new("water", 100.0, true))
        }
    }

    #[tokio::test]
    async fn test_read_through_fetches_once() {
        let catalog = ItemCatalog::new();
        let source = CountingSource {
            calls: AtomicUsize::new(0),
        };

        assert!(catalog.fetch("water", &source).await.is_some());
        assert!(catalog.fetch("water", &source).await.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        assert!(catalog.fetch("unobtainium", &source).await.is_none());
        assert!(!catalog.contains("unobtainium"));
    }

    #[test]
    fn test_clones_share_entries() {
        let catalog = ItemCatalog::new();
        let handle = catalog.clone();
        handle.insert(CatalogEntry::new("bread", 50.0, true));
        assert!(catalog.contains("bread"));
        assert!(catalog.adjust_count("bread", 4));
        assert!(catalog.adjust_count("bread", -1));
        assert_eq!(handle.global_count("bread"), Some(3));
        assert!(!catalog.adjust_count("ghost", 1));
    }

    #[test]
    fn test_missing_names() {
        let catalog = ItemCatalog::with_entries([CatalogEntry::new("water", 100.0, true)]);
        let missing = catalog.missing(["water", "bread", "bread", ""]);
        assert_eq!(missing, vec!["bread".to_owned()]);
    }

    #[test]
    fn test_entry_defaults() {
        let entry: CatalogEntry = serde_json::from_str(r#"{ "name": "rope" }"#).unwrap();
        assert!(entry.stack);
        assert_eq!(entry.count, 0);
        assert_eq!(entry.image, None);
    }

    #[test]
    fn test_entry_image() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{ "name": "radio", "stack": false, "image": "radio.png" }"#).unwrap();
        assert_eq!(entry.image.as_deref(), Some("radio.png"));
        assert!(!entry.stack);
        let encoded = serde_json::to_value(&entry).unwrap();
        assert_eq!(encoded["image"], "radio.png");
    }
}
