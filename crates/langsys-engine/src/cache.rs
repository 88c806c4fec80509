//! Categorized translation cache backed by the durable store

use langsys_common::{TranslationData, CATEGORY_KEY, UNCATEGORIZED};
use tokio::sync::watch;
use tracing::debug;

use crate::store::DurableCell;

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// The (category, token) pair has never been seen
    Absent,
    /// The token was reported as missing; no translation exists yet
    Pending,
    /// A non-empty translation is available
    Resolved(String),
}

/// Category -> token -> translation mapping with reactive change
/// notification, persisted through a [`DurableCell`].
///
/// Structural invariants maintained by every mutation: the
/// `__uncategorized__` category always exists, and every category map
/// carries a `__category__` marker equal to its own key.
#[derive(Debug, Clone)]
pub struct TranslationCache {
    cell: DurableCell<TranslationData>,
}

impl TranslationCache {
    pub fn new(cell: DurableCell<TranslationData>) -> Self {
        let cache = Self { cell };
        // The persisted value may predate the invariants or be empty
        cache.cell.update(normalize);
        cache
    }

    /// Atomically swap the entire category map, normalizing the payload
    /// so the structural invariants hold even when the remote omits them
    pub fn replace(&self, mut payload: TranslationData) {
        normalize(&mut payload);
        debug!("Replacing translation cache ({} categories)", payload.len());
        self.cell.set(payload);
    }

    /// Pure lookup; empty category falls under `__uncategorized__`
    pub fn get(&self, category: &str, token: &str) -> CacheEntry {
        let category = effective_category(category);
        let data = self.cell.get();

        match data.get(category).and_then(|map| map.get(token)) {
            Some(Some(translation)) if !translation.is_empty() => {
                CacheEntry::Resolved(translation.clone())
            }
            // Null or empty marker: reported, not yet translated
            Some(_) => CacheEntry::Pending,
            None => CacheEntry::Absent,
        }
    }

    /// Insert a pending marker for the token if it has no entry yet, so a
    /// repeated miss is not re-queued until the next full refresh.
    /// Idempotent, and never downgrades a resolved entry.
    pub fn mark_pending(&self, category: &str, token: &str) {
        let category = effective_category(category).to_string();
        let token = token.to_string();

        self.cell.update(move |data| {
            let map = data.entry(category.clone()).or_default();
            map.entry(CATEGORY_KEY.to_string())
                .or_insert_with(|| Some(category.clone()));
            map.entry(token).or_insert(None);
        });
    }

    /// Drop everything, including the persisted copy
    pub fn clear(&self) {
        self.cell.clear();
        self.cell.update(normalize);
    }

    /// Read-only reactive view of the full cache
    pub fn subscribe(&self) -> watch::Receiver<TranslationData> {
        self.cell.subscribe()
    }

    /// Snapshot of the current data
    pub fn data(&self) -> TranslationData {
        self.cell.get()
    }
}

fn effective_category(category: &str) -> &str {
    if category.is_empty() {
        UNCATEGORIZED
    } else {
        category
    }
}

/// Enforce the structural invariants on a category map
fn normalize(data: &mut TranslationData) {
    data.entry(UNCATEGORIZED.to_string()).or_default();
    for (category, map) in data.iter_mut() {
        map.insert(CATEGORY_KEY.to_string(), Some(category.clone()));
    }
}
