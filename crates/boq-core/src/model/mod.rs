//! Boundary data shapes: category records and line items.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod category;
pub mod line_item;

pub use category::{CategoryId, CategoryNode, CategoryRecord};
pub use line_item::{CatalogItemId, LineItem, LineItemId};

/// Identifier of a project. The engine serializes mutations per project;
/// the id itself is opaque here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
