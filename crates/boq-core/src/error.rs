//! Error types surfaced by the engine.
//!
//! Every failure here is locally recoverable by the caller: correct the
//! input and retry, or re-fetch the snapshot and retry. A failed operation
//! never leaves the in-memory tree or ledger partially mutated.

use std::fmt;

use thiserror::Error;

use crate::model::{CategoryId, LineItemId, ProjectId};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BoqError>;

// ---------------------------------------------------------------------------
// Error kinds
// ---------------------------------------------------------------------------

/// Coarse classification of a [`BoqError`], matching the contract surfaced
/// to callers: malformed input, missing reference, structural violation,
/// stale snapshot, or aggregation over a vanished node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Integrity,
    Conflict,
    InvalidNode,
}

/// All errors produced by the core.
#[derive(Debug, Error)]
pub enum BoqError {
    /// Malformed input: empty name, non-positive quantity, negative price,
    /// duplicate identifier in an input collection.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// A referenced category does not exist (or is inactive where an active
    /// one is required).
    #[error("category not found: {id}")]
    CategoryNotFound { id: CategoryId },

    /// A line item is not attached where the caller claims it is. Defends
    /// against stale client state.
    #[error("line item {id} is not attached to category {category}")]
    LineItemNotFound {
        id: LineItemId,
        category: CategoryId,
    },

    /// A line item id does not exist anywhere in the ledger.
    #[error("line item not found: {id}")]
    LineItemUnknown { id: LineItemId },

    /// The store has no snapshot for the requested project.
    #[error("project not found: {id}")]
    ProjectNotFound { id: ProjectId },

    /// A record's `parent_id` does not resolve to any record in the input
    /// set.
    #[error("category {child} references parent {parent} which is not in the input set")]
    OrphanParent {
        child: CategoryId,
        parent: CategoryId,
    },

    /// The parent chain loops. The path lists the ids walked before the
    /// repeat, starting at the node where detection began.
    #[error("cycle detected in category parent chain: {}", DisplayPath(.path))]
    Cycle { path: Vec<CategoryId> },

    /// A record's stored level does not match its computed depth.
    #[error("category {id} carries level {stored} but sits at depth {computed}")]
    LevelMismatch {
        id: CategoryId,
        stored: u32,
        computed: u32,
    },

    /// The snapshot used for a mutation is stale: the store committed a
    /// different version since it was loaded. The caller must re-fetch.
    #[error("snapshot at version {snapshot} is stale, store is at version {store}")]
    Conflict { snapshot: u64, store: u64 },

    /// Aggregation was requested for a node no longer present in the tree.
    #[error("cannot aggregate category {id}: not present in the tree")]
    InvalidNode { id: CategoryId },
}

struct DisplayPath<'a>(&'a [CategoryId]);

impl fmt::Display for DisplayPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

impl BoqError {
    /// Shorthand for a [`BoqError::Validation`] with a formatted reason.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// The coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::CategoryNotFound { .. }
            | Self::LineItemNotFound { .. }
            | Self::LineItemUnknown { .. }
            | Self::ProjectNotFound { .. } => ErrorKind::NotFound,
            Self::OrphanParent { .. } | Self::Cycle { .. } | Self::LevelMismatch { .. } => {
                ErrorKind::Integrity
            }
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InvalidNode { .. } => ErrorKind::InvalidNode,
        }
    }

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "E1001",
            Self::CategoryNotFound { .. } => "E2001",
            Self::LineItemNotFound { .. } => "E2002",
            Self::LineItemUnknown { .. } => "E2003",
            Self::ProjectNotFound { .. } => "E2004",
            Self::OrphanParent { .. } => "E3001",
            Self::Cycle { .. } => "E3002",
            Self::LevelMismatch { .. } => "E3003",
            Self::Conflict { .. } => "E4001",
            Self::InvalidNode { .. } => "E4002",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Validation { .. } => Some("Correct the rejected field and retry."),
            Self::CategoryNotFound { .. }
            | Self::LineItemNotFound { .. }
            | Self::LineItemUnknown { .. } => {
                Some("Refresh the project snapshot; the target may have been deleted.")
            }
            Self::ProjectNotFound { .. } => Some("Check the project id against the store."),
            Self::OrphanParent { .. } => {
                Some("Include the missing parent record or fix the parent reference.")
            }
            Self::Cycle { .. } => Some("Break the parent loop in the source records."),
            Self::LevelMismatch { .. } => {
                Some("Recompute stored levels from the parent chain before loading.")
            }
            Self::Conflict { .. } => Some("Reload the snapshot and reapply the mutation."),
            Self::InvalidNode { .. } => Some("Re-fetch the tree before aggregating."),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
