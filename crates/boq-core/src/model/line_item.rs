//! Priced line items attached to categories.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Unique identifier of a line item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LineItemId(pub u64);

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a catalog entry. The catalog is owned by an external
/// collaborator; this is a weak reference, resolved at render time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CatalogItemId(pub u64);

impl fmt::Display for CatalogItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A priced attachment of a catalog item to a category.
///
/// `unit_price` is a snapshot captured when the item was attached; later
/// catalog price changes do not affect it. The line subtotal is always
/// `quantity * unit_price`, recomputed on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub category_id: crate::model::CategoryId,
    pub catalog_item_id: CatalogItemId,
    pub quantity: Decimal,
    pub unit_price: Money,
    #[serde(default)]
    pub notes: Option<String>,
}

impl LineItem {
    /// `quantity * unit_price`, exact.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}
