//! Wishlist aggregate: unique product snapshots, no quantities.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use storekeep_core::ProductId;

use super::cart::ProductSnapshot;

/// A wishlist entry is the product snapshot taken when it was added.
pub type WishlistEntry = ProductSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishlistAction {
    /// Idempotent.
    Add(ProductSnapshot),
    Remove(ProductId),
    Clear,
}

/// Saved products in insertion order. Serializes as the entry array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<WishlistEntry>", into = "Vec<WishlistEntry>")]
pub struct WishlistState {
    items: IndexMap<ProductId, WishlistEntry>,
}

impl From<Vec<WishlistEntry>> for WishlistState {
    fn from(entries: Vec<WishlistEntry>) -> Self {
        let mut items = IndexMap::with_capacity(entries.len());
        for entry in entries {
            items.entry(entry.id).or_insert(entry);
        }
        Self { items }
    }
}

impl From<WishlistState> for Vec<WishlistEntry> {
    fn from(wishlist: WishlistState) -> Self {
        wishlist.items.into_values().collect()
    }
}

impl WishlistState {
    pub fn items(&self) -> impl Iterator<Item = &WishlistEntry> {
        self.items.values()
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn reduce(&self, action: &WishlistAction) -> Self {
        let mut next = self.clone();
        match action {
            WishlistAction::Add(snapshot) => {
                next.items
                    .entry(snapshot.id)
                    .or_insert_with(|| snapshot.clone());
            }
            WishlistAction::Remove(id) => {
                next.items.shift_remove(id);
            }
            WishlistAction::Clear => next.items.clear(),
        }
        next
    }
}
