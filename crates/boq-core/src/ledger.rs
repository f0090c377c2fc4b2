//! The line-item ledger.
//!
//! A pure projection of a flat line-item collection into per-category
//! ordered lists. The ledger holds no aggregate state: subtotals are always
//! derived fresh by [`crate::aggregate`], so there is nothing here to go
//! stale.

use std::collections::HashMap;

use crate::error::{BoqError, Result};
use crate::model::{CategoryId, LineItem, LineItemId};

/// Line items grouped by owning category, insertion order preserved within
/// each group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    by_category: HashMap<CategoryId, Vec<LineItem>>,
    owner: HashMap<LineItemId, CategoryId>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group a flat collection. Grouping itself has no side effects and
    /// validates nothing beyond id uniqueness; referential integrity
    /// against the tree is the snapshot's concern.
    ///
    /// # Errors
    ///
    /// [`BoqError::Validation`] on a duplicate line-item id.
    pub fn build(items: Vec<LineItem>) -> Result<Self> {
        let mut ledger = Self::new();
        for item in items {
            if ledger.owner.contains_key(&item.id) {
                return Err(BoqError::validation(format!(
                    "duplicate line item id {}",
                    item.id
                )));
            }
            ledger.attach(item);
        }
        Ok(ledger)
    }

    /// Line items of `category`, in attachment order. Empty for categories
    /// with no items (including unknown ids).
    #[must_use]
    pub fn line_items_for(&self, category: CategoryId) -> &[LineItem] {
        self.by_category
            .get(&category)
            .map_or(&[], Vec::as_slice)
    }

    /// The category a line item is attached to, if any.
    #[must_use]
    pub fn owner_of(&self, item: LineItemId) -> Option<CategoryId> {
        self.owner.get(&item).copied()
    }

    /// Total number of line items across all categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owner.is_empty()
    }

    /// Every line item in the ledger, ungrouped and unordered.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.by_category.values().flatten()
    }

    // -- Mutation primitives ------------------------------------------------

    /// Append an item to its category's list. The caller has already
    /// validated the item and its category.
    pub(crate) fn attach(&mut self, item: LineItem) {
        self.owner.insert(item.id, item.category_id);
        self.by_category
            .entry(item.category_id)
            .or_default()
            .push(item);
    }

    /// Detach `item` from `category`.
    ///
    /// # Errors
    ///
    /// [`BoqError::LineItemNotFound`] if the item is not currently attached
    /// to that category. The ledger is unchanged on failure.
    pub(crate) fn detach(&mut self, category: CategoryId, item: LineItemId) -> Result<LineItem> {
        if self.owner.get(&item) != Some(&category) {
            return Err(BoqError::LineItemNotFound { id: item, category });
        }
        self.owner.remove(&item);
        let list = self.by_category.entry(category).or_default();
        let pos = list.iter().position(|it| it.id == item);
        let removed = pos.map(|p| list.remove(p));
        if list.is_empty() {
            self.by_category.remove(&category);
        }
        removed.ok_or(BoqError::LineItemNotFound { id: item, category })
    }

    /// Lookup by id across all categories.
    pub(crate) fn item(&self, item: LineItemId) -> Option<&LineItem> {
        let category = self.owner.get(&item)?;
        self.by_category
            .get(category)?
            .iter()
            .find(|it| it.id == item)
    }

    /// Mutable access for in-place edits (quantity, price, notes).
    pub(crate) fn item_mut(&mut self, item: LineItemId) -> Option<&mut LineItem> {
        let category = self.owner.get(&item)?;
        self.by_category
            .get_mut(category)?
            .iter_mut()
            .find(|it| it.id == item)
    }

    /// Drop every item attached to `category`, returning how many were
    /// removed. Used by the cascade delete.
    pub(crate) fn remove_category(&mut self, category: CategoryId) -> usize {
        let removed = self.by_category.remove(&category).unwrap_or_default();
        for item in &removed {
            self.owner.remove(&item.id);
        }
        removed.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
