//! Category records and tree nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a category. Immutable once created.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flat category record as it crosses the engine boundary.
///
/// `level` is redundant with the parent chain and is validated against the
/// computed depth during tree construction; it is never independently
/// settable through the mutation protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub level: u32,
    pub order_seq: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl CategoryRecord {
    /// A root-level record with defaults for the computed fields.
    #[must_use]
    pub fn root(id: CategoryId, name: impl Into<String>, order_seq: i64) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: None,
            level: 0,
            order_seq,
            is_active: true,
        }
    }

    /// A child record directly under `parent`, at `parent_level + 1`.
    #[must_use]
    pub fn child(
        id: CategoryId,
        name: impl Into<String>,
        parent: CategoryId,
        parent_level: u32,
        order_seq: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: Some(parent),
            level: parent_level + 1,
            order_seq,
            is_active: true,
        }
    }
}

/// A category inside a built [`crate::tree::CategoryTree`]: the record
/// fields plus the resolved child list, ordered by `order_seq` with input
/// order as tie-break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub level: u32,
    pub order_seq: i64,
    pub is_active: bool,
    pub children: Vec<CategoryId>,
}

impl CategoryNode {
    pub(crate) fn from_record(record: &CategoryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            parent_id: record.parent_id,
            level: record.level,
            order_seq: record.order_seq,
            is_active: record.is_active,
            children: Vec::new(),
        }
    }
}
