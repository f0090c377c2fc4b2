//! The tree mutation protocol over versioned snapshots.
//!
//! The engine runs single-threaded per project: a caller loads a
//! point-in-time [`Snapshot`] from its [`SnapshotStore`], applies one
//! [`Mutation`] in memory, and asks the store to commit the result. Each
//! mutation is atomic from the caller's perspective: validation happens
//! before any state is touched, so a rejected operation leaves the tree
//! and ledger exactly as they were.
//!
//! Commit uses optimistic versioning. If another commit landed after this
//! snapshot was loaded, the store reports [`BoqError::Conflict`] and the
//! whole operation fails — no partial cascade, no automatic retry. Retry,
//! if any, belongs to the caller.
//!
//! Every successful mutation returns freshly recomputed [`Totals`], so a
//! single actor never observes a stale subtotal after its own write.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{self, Totals};
use crate::catalog::CatalogResolver;
use crate::config::RenderConfig;
use crate::error::{BoqError, Result};
use crate::ledger::Ledger;
use crate::model::{
    CatalogItemId, CategoryId, CategoryRecord, LineItem, LineItemId, ProjectId,
};
use crate::money::Money;
use crate::render::{self, Row};
use crate::tree::CategoryTree;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A point-in-time view of one project's category tree and ledger, tagged
/// with the store version it was loaded at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    project_id: ProjectId,
    version: u64,
    tree: CategoryTree,
    ledger: Ledger,
    next_category_id: u64,
    next_line_item_id: u64,
}

impl Snapshot {
    /// Assemble a snapshot from the flat boundary collections.
    ///
    /// Beyond tree construction (§ orphans, cycles, levels) this enforces
    /// the invariants between the collections: every line item must belong
    /// to a category present in the tree, carry a positive quantity and a
    /// non-negative unit price, and the summed line totals must fit in a
    /// `Decimal`. A snapshot that assembles can always aggregate.
    ///
    /// # Errors
    ///
    /// Everything [`CategoryTree::build`] and [`Ledger::build`] can return,
    /// plus [`BoqError::CategoryNotFound`] for a line item attached to a
    /// category that is not in the input set and [`BoqError::Validation`]
    /// for sign or amount-range violations.
    pub fn assemble(
        project_id: ProjectId,
        version: u64,
        records: &[CategoryRecord],
        items: Vec<LineItem>,
    ) -> Result<Self> {
        let tree = CategoryTree::build(records)?;
        let ledger = Ledger::build(items)?;
        let mut grand_total = Money::ZERO;
        for item in ledger.iter() {
            if !tree.contains(item.category_id) {
                return Err(BoqError::CategoryNotFound {
                    id: item.category_id,
                });
            }
            validate_quantity(item.quantity)?;
            validate_unit_price(item.unit_price)?;
            let total = validated_line_total(item.quantity, item.unit_price)?;
            grand_total = grand_total
                .checked_add(total)
                .ok_or_else(grand_total_overflow)?;
        }
        let next_category_id = tree.ids().map(|id| id.0).max().map_or(1, |max| max + 1);
        let next_line_item_id = ledger.iter().map(|it| it.id.0).max().map_or(1, |max| max + 1);
        Ok(Self {
            project_id,
            version,
            tree,
            ledger,
            next_category_id,
            next_line_item_id,
        })
    }

    /// An empty snapshot for a fresh project.
    #[must_use]
    pub fn empty(project_id: ProjectId) -> Self {
        Self {
            project_id,
            version: 0,
            tree: CategoryTree::new(),
            ledger: Ledger::new(),
            next_category_id: 1,
            next_line_item_id: 1,
        }
    }

    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub const fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Fresh aggregates for the current state. Never cached.
    #[must_use]
    pub fn totals(&self) -> Totals {
        aggregate::project_totals(&self.tree, &self.ledger)
    }

    /// The rendered row sequence for the current state.
    #[must_use]
    pub fn rows(&self, catalog: &dyn CatalogResolver, cfg: &RenderConfig) -> Vec<Row> {
        render::render_rows(&self.tree, &self.ledger, catalog, cfg)
    }

    /// Apply one mutation in memory.
    ///
    /// On success the returned outcome carries the recomputed totals. On
    /// failure the snapshot is unchanged.
    ///
    /// # Errors
    ///
    /// Per-operation validation and lookup failures; see [`Mutation`].
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationOutcome> {
        let applied = self.dispatch(mutation)?;
        Ok(MutationOutcome {
            totals: self.totals(),
            applied,
        })
    }

    fn dispatch(&mut self, mutation: Mutation) -> Result<Applied> {
        match mutation {
            Mutation::AddRootCategory { name } => {
                let name = normalized_name(&name)?;
                let id = self.allocate_category_id();
                self.tree.add_root(id, name)?;
                debug!(project = %self.project_id, category = %id, "added root category");
                Ok(Applied::CategoryCreated { id })
            }
            Mutation::AddSubCategory { parent_id, name } => {
                let name = normalized_name(&name)?;
                // Validate the parent before consuming an id, so a rejected
                // call allocates nothing.
                match self.tree.get(parent_id) {
                    Some(parent) if parent.is_active => {}
                    _ => return Err(BoqError::CategoryNotFound { id: parent_id }),
                }
                let id = self.allocate_category_id();
                self.tree.add_child(parent_id, id, name)?;
                debug!(
                    project = %self.project_id,
                    category = %id,
                    parent = %parent_id,
                    "added sub-category"
                );
                Ok(Applied::CategoryCreated { id })
            }
            Mutation::RenameCategory { id, name } => {
                let name = normalized_name(&name)?;
                self.tree.rename(id, name)?;
                debug!(project = %self.project_id, category = %id, "renamed category");
                Ok(Applied::CategoryRenamed { id })
            }
            Mutation::DeleteCategory { id } => {
                let removed = self.tree.remove_subtree(id)?;
                let mut removed_items = 0;
                for category in &removed {
                    removed_items += self.ledger.remove_category(*category);
                }
                debug!(
                    project = %self.project_id,
                    category = %id,
                    removed_categories = removed.len(),
                    removed_items,
                    "cascade-deleted category subtree"
                );
                Ok(Applied::CategoryDeleted {
                    id,
                    removed_categories: removed.len(),
                    removed_items,
                })
            }
            Mutation::AttachLineItem {
                category_id,
                catalog_item_id,
                quantity,
                unit_price,
                notes,
            } => {
                validate_quantity(quantity)?;
                validate_unit_price(unit_price)?;
                let line_total = validated_line_total(quantity, unit_price)?;
                if !self.tree.contains(category_id) {
                    return Err(BoqError::CategoryNotFound { id: category_id });
                }
                if self
                    .totals()
                    .grand_total
                    .checked_add(line_total)
                    .is_none()
                {
                    return Err(grand_total_overflow());
                }
                let id = self.allocate_line_item_id();
                self.ledger.attach(LineItem {
                    id,
                    category_id,
                    catalog_item_id,
                    quantity,
                    unit_price,
                    notes: normalized_notes(notes),
                });
                debug!(
                    project = %self.project_id,
                    line_item = %id,
                    category = %category_id,
                    "attached line item"
                );
                Ok(Applied::LineItemAttached { id })
            }
            Mutation::DetachLineItem {
                category_id,
                line_item_id,
            } => {
                self.ledger.detach(category_id, line_item_id)?;
                debug!(
                    project = %self.project_id,
                    line_item = %line_item_id,
                    category = %category_id,
                    "detached line item"
                );
                Ok(Applied::LineItemDetached { id: line_item_id })
            }
            Mutation::UpdateLineItem {
                line_item_id,
                quantity,
                unit_price,
                notes,
            } => {
                // Full validation before the first field is written, so a
                // partially-valid update cannot half-apply.
                if let Some(q) = quantity {
                    validate_quantity(q)?;
                }
                if let Some(p) = unit_price {
                    validate_unit_price(p)?;
                }
                let current = self
                    .ledger
                    .item(line_item_id)
                    .ok_or(BoqError::LineItemUnknown { id: line_item_id })?;
                let new_total = validated_line_total(
                    quantity.unwrap_or(current.quantity),
                    unit_price.unwrap_or(current.unit_price),
                )?;
                // Grand total with the item's current contribution retired.
                // Both operands are non-negative and representable, so the
                // subtraction stays in range.
                let remainder = Money::new(
                    self.totals().grand_total.amount() - current.line_total().amount(),
                );
                if remainder.checked_add(new_total).is_none() {
                    return Err(grand_total_overflow());
                }
                let item = self
                    .ledger
                    .item_mut(line_item_id)
                    .ok_or(BoqError::LineItemUnknown { id: line_item_id })?;
                if let Some(q) = quantity {
                    item.quantity = q;
                }
                if let Some(p) = unit_price {
                    item.unit_price = p;
                }
                if let Some(n) = notes {
                    item.notes = normalized_notes(Some(n));
                }
                debug!(project = %self.project_id, line_item = %line_item_id, "updated line item");
                Ok(Applied::LineItemUpdated { id: line_item_id })
            }
        }
    }

    fn allocate_category_id(&mut self) -> CategoryId {
        let id = CategoryId(self.next_category_id);
        self.next_category_id += 1;
        id
    }

    fn allocate_line_item_id(&mut self) -> LineItemId {
        let id = LineItemId(self.next_line_item_id);
        self.next_line_item_id += 1;
        id
    }
}

fn normalized_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BoqError::validation("category name must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn normalized_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}

fn validate_quantity(quantity: Decimal) -> Result<()> {
    if quantity <= Decimal::ZERO {
        return Err(BoqError::validation(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    Ok(())
}

fn validate_unit_price(unit_price: Money) -> Result<()> {
    if unit_price.is_negative() {
        return Err(BoqError::validation(format!(
            "unit price must not be negative, got {unit_price}"
        )));
    }
    Ok(())
}

fn validated_line_total(quantity: Decimal, unit_price: Money) -> Result<Money> {
    unit_price.checked_times(quantity).ok_or_else(|| {
        BoqError::validation(format!(
            "line total {quantity} x {unit_price} exceeds the representable amount range"
        ))
    })
}

fn grand_total_overflow() -> BoqError {
    BoqError::validation("project grand total would exceed the representable amount range")
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// The named operations of the mutation protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Create a category at level 0, ordered after the existing roots.
    AddRootCategory { name: String },
    /// Create a category at `parent.level + 1`, ordered after the existing
    /// siblings. Fails with `NotFound` if the parent is missing or
    /// inactive.
    AddSubCategory {
        parent_id: CategoryId,
        name: String,
    },
    /// Change a category's display name. Fails with `Validation` when the
    /// name trims to empty.
    RenameCategory { id: CategoryId, name: String },
    /// Remove the category, all descendant categories, and every line item
    /// attached anywhere in the subtree, atomically.
    DeleteCategory { id: CategoryId },
    /// Attach a priced catalog reference to a category. The unit price is
    /// captured here and never tracks later catalog changes.
    AttachLineItem {
        category_id: CategoryId,
        catalog_item_id: CatalogItemId,
        quantity: Decimal,
        unit_price: Money,
        #[serde(default)]
        notes: Option<String>,
    },
    /// Remove one line item from the category it is attached to.
    DetachLineItem {
        category_id: CategoryId,
        line_item_id: LineItemId,
    },
    /// Edit a line item in place. Omitted fields are unchanged.
    UpdateLineItem {
        line_item_id: LineItemId,
        #[serde(default)]
        quantity: Option<Decimal>,
        #[serde(default)]
        unit_price: Option<Money>,
        #[serde(default)]
        notes: Option<String>,
    },
}

/// What a successful mutation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Applied {
    CategoryCreated {
        id: CategoryId,
    },
    CategoryRenamed {
        id: CategoryId,
    },
    CategoryDeleted {
        id: CategoryId,
        removed_categories: usize,
        removed_items: usize,
    },
    LineItemAttached {
        id: LineItemId,
    },
    LineItemDetached {
        id: LineItemId,
    },
    LineItemUpdated {
        id: LineItemId,
    },
}

/// Result of a committed mutation: what happened plus the recomputed
/// totals (read-your-writes: never stale after a successful apply).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    pub applied: Applied,
    pub totals: Totals,
}

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// Persistence boundary. Loading and committing snapshots is the external
/// collaborator's concern; the engine only defines where the calls happen
/// and how conflicts surface.
pub trait SnapshotStore {
    /// Load the current snapshot of a project.
    ///
    /// # Errors
    ///
    /// [`BoqError::ProjectNotFound`] for an unknown project.
    fn load(&self, project: ProjectId) -> Result<Snapshot>;

    /// Commit a mutated snapshot, returning the new version.
    ///
    /// # Errors
    ///
    /// [`BoqError::Conflict`] when the snapshot's version no longer matches
    /// the store's (another commit landed first). The store is unchanged
    /// on failure.
    fn commit(&mut self, snapshot: Snapshot) -> Result<u64>;
}

/// Load-mutate-commit in one step. The snapshot never escapes, so this is
/// the simplest way to serialize mutations for a single actor.
///
/// # Errors
///
/// Everything [`Snapshot::apply`] and [`SnapshotStore::commit`] can return.
pub fn mutate(
    store: &mut dyn SnapshotStore,
    project: ProjectId,
    mutation: Mutation,
) -> Result<MutationOutcome> {
    let mut snapshot = store.load(project)?;
    let outcome = snapshot.apply(mutation)?;
    store.commit(snapshot)?;
    Ok(outcome)
}

/// Store backed by a plain map. Reference implementation for tests and the
/// CLI; it versions each project and rejects stale commits the way a real
/// backend would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    projects: HashMap<ProjectId, Snapshot>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project with an assembled snapshot (version as given).
    pub fn insert_project(&mut self, snapshot: Snapshot) {
        self.projects.insert(snapshot.project_id, snapshot);
    }
}

impl SnapshotStore for InMemoryStore {
    fn load(&self, project: ProjectId) -> Result<Snapshot> {
        self.projects
            .get(&project)
            .cloned()
            .ok_or(BoqError::ProjectNotFound { id: project })
    }

    fn commit(&mut self, mut snapshot: Snapshot) -> Result<u64> {
        if let Some(stored) = self.projects.get(&snapshot.project_id) {
            if stored.version != snapshot.version {
                return Err(BoqError::Conflict {
                    snapshot: snapshot.version,
                    store: stored.version,
                });
            }
        }
        snapshot.version += 1;
        let version = snapshot.version;
        self.projects.insert(snapshot.project_id, snapshot);
        Ok(version)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
