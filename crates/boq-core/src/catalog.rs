//! Catalog reference resolution.
//!
//! Line items carry a weak reference into a centrally-owned item catalog.
//! The engine only ever reads from it, through [`CatalogResolver`]; the
//! catalog's lifecycle belongs to an external collaborator. Unresolvable
//! references degrade to a placeholder at render time rather than failing
//! the whole projection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::CatalogItemId;
use crate::money::Money;

/// Resolved catalog data for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    /// Unit of measure ("m3", "kg", ...). Rendering falls back to `"unit"`
    /// when absent.
    #[serde(default)]
    pub unit: Option<String>,
    /// The catalog's current price. Informational only: attached line items
    /// keep the price captured at attachment time.
    pub reference_price: Money,
}

/// Read-only lookup from catalog item id to its display data.
pub trait CatalogResolver {
    fn resolve(&self, id: CatalogItemId) -> Option<&CatalogEntry>;
}

/// Catalog backed by a plain map. Used by the CLI and tests; a production
/// deployment would implement [`CatalogResolver`] over its item service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: HashMap<CatalogItemId, CatalogEntry>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: CatalogItemId, entry: CatalogEntry) {
        self.entries.insert(id, entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(CatalogItemId, CatalogEntry)> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = (CatalogItemId, CatalogEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl CatalogResolver for InMemoryCatalog {
    fn resolve(&self, id: CatalogItemId) -> Option<&CatalogEntry> {
        self.entries.get(&id)
    }
}
