//! Bottom-up monetary aggregation.
//!
//! A post-order fold over the category tree: each node's own subtotal is
//! the sum of its line-item totals, its subtree subtotal adds the subtree
//! subtotals of its children, and the grand total sums the subtree
//! subtotals of the roots. All arithmetic is exact decimal; nothing here is
//! cached — callers recompute after every committed mutation.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{BoqError, Result};
use crate::ledger::Ledger;
use crate::model::{CategoryId, LineItem};
use crate::money::Money;
use crate::tree::CategoryTree;

/// Subtotals of a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    /// Sum of `quantity * unit_price` over the category's own line items.
    pub own_subtotal: Money,
    /// `own_subtotal` plus the subtree subtotals of all children.
    pub subtree_subtotal: Money,
}

/// Aggregates for a whole project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Per-category aggregates, keyed by category id. Every category in
    /// the tree has an entry, including empty ones (at zero).
    pub subtotals: HashMap<CategoryId, Aggregate>,
    /// Sum of subtree subtotals over all root categories.
    pub grand_total: Money,
}

impl Totals {
    /// Aggregate for one category, if it is in the tree.
    #[must_use]
    pub fn for_category(&self, id: CategoryId) -> Option<&Aggregate> {
        self.subtotals.get(&id)
    }
}

/// Aggregate the subtree rooted at `id`.
///
/// # Errors
///
/// [`BoqError::InvalidNode`] if `id` is not present in the tree (for
/// example after a concurrent delete); the caller must re-fetch before
/// retrying.
pub fn aggregate_node(tree: &CategoryTree, ledger: &Ledger, id: CategoryId) -> Result<Aggregate> {
    if !tree.contains(id) {
        return Err(BoqError::InvalidNode { id });
    }
    let mut scratch = HashMap::new();
    fold(tree, ledger, id, &mut scratch);
    scratch
        .remove(&id)
        .ok_or(BoqError::InvalidNode { id })
}

/// Aggregates for every category plus the grand total.
#[must_use]
pub fn project_totals(tree: &CategoryTree, ledger: &Ledger) -> Totals {
    let mut subtotals = HashMap::with_capacity(tree.len());
    let mut grand_total = Money::ZERO;
    for root in tree.roots() {
        grand_total += fold(tree, ledger, *root, &mut subtotals);
    }
    Totals {
        subtotals,
        grand_total,
    }
}

/// Post-order fold: children first, then the node itself. Returns the
/// node's subtree subtotal.
fn fold(
    tree: &CategoryTree,
    ledger: &Ledger,
    id: CategoryId,
    out: &mut HashMap<CategoryId, Aggregate>,
) -> Money {
    let own_subtotal: Money = ledger
        .line_items_for(id)
        .iter()
        .map(LineItem::line_total)
        .sum();
    let mut subtree_subtotal = own_subtotal;
    for child in tree.children_of(id) {
        subtree_subtotal += fold(tree, ledger, *child, out);
    }
    out.insert(
        id,
        Aggregate {
            own_subtotal,
            subtree_subtotal,
        },
    );
    subtree_subtotal
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CatalogItemId, CategoryRecord, LineItemId};
    use rust_decimal::Decimal;

    fn id(n: u64) -> CategoryId {
        CategoryId(n)
    }

    fn line(item: u64, category: u64, quantity: i64, unit_price: i64) -> LineItem {
        LineItem {
            id: LineItemId(item),
            category_id: id(category),
            catalog_item_id: CatalogItemId(item),
            quantity: Decimal::from(quantity),
            unit_price: Money::from(unit_price),
            notes: None,
        }
    }

    /// Root "Earthworks" with sub "Excavation" holding one 10 x 50,000 item.
    fn earthworks() -> (CategoryTree, Ledger) {
        let tree = CategoryTree::build(&[
            CategoryRecord::root(id(1), "Earthworks", 0),
            CategoryRecord::child(id(2), "Excavation", id(1), 0, 0),
        ])
        .expect("build tree");
        let ledger = Ledger::build(vec![line(1, 2, 10, 50_000)]).expect("build ledger");
        (tree, ledger)
    }

    #[test]
    fn subtotal_propagates_to_root_and_grand_total() {
        let (tree, ledger) = earthworks();
        let totals = project_totals(&tree, &ledger);
        let sub = totals.for_category(id(2)).expect("excavation");
        assert_eq!(sub.own_subtotal, Money::from(500_000));
        assert_eq!(sub.subtree_subtotal, Money::from(500_000));
        let root = totals.for_category(id(1)).expect("earthworks");
        assert_eq!(root.own_subtotal, Money::ZERO);
        assert_eq!(root.subtree_subtotal, Money::from(500_000));
        assert_eq!(totals.grand_total, Money::from(500_000));
    }

    #[test]
    fn second_item_updates_own_subtotal_and_grand_total() {
        let (tree, mut ledger) = earthworks();
        // quantity 2, unit price 750,000 under the same sub-category.
        ledger = Ledger::build(
            ledger
                .iter()
                .cloned()
                .chain(std::iter::once(line(2, 2, 2, 750_000)))
                .collect(),
        )
        .expect("rebuild ledger");
        let totals = project_totals(&tree, &ledger);
        let sub = totals.for_category(id(2)).expect("excavation");
        assert_eq!(sub.own_subtotal, Money::from(2_000_000));
        assert_eq!(totals.grand_total, Money::from(2_000_000));
    }

    #[test]
    fn empty_category_contributes_zero_but_has_an_entry() {
        let tree = CategoryTree::build(&[
            CategoryRecord::root(id(1), "Earthworks", 0),
            CategoryRecord::root(id(2), "Unused", 1),
        ])
        .expect("build tree");
        let ledger = Ledger::build(vec![line(1, 1, 3, 100)]).expect("build ledger");
        let totals = project_totals(&tree, &ledger);
        let unused = totals.for_category(id(2)).expect("entry exists");
        assert_eq!(unused.subtree_subtotal, Money::ZERO);
        assert_eq!(totals.grand_total, Money::from(300));
    }

    #[test]
    fn grand_total_equals_flat_sum_over_all_items() {
        let tree = CategoryTree::build(&[
            CategoryRecord::root(id(1), "A", 0),
            CategoryRecord::child(id(2), "A1", id(1), 0, 0),
            CategoryRecord::child(id(3), "A2", id(1), 0, 1),
            CategoryRecord::child(id(4), "A1a", id(2), 1, 0),
        ])
        .expect("build tree");
        let items = vec![
            line(1, 1, 1, 10),
            line(2, 2, 2, 20),
            line(3, 3, 3, 30),
            line(4, 4, 4, 40),
            line(5, 4, 5, 50),
        ];
        let flat: Money = items.iter().map(LineItem::line_total).sum();
        let ledger = Ledger::build(items).expect("build ledger");
        let totals = project_totals(&tree, &ledger);
        assert_eq!(totals.grand_total, flat);
        // Roots cross-check.
        let roots_sum: Money = tree
            .roots()
            .iter()
            .map(|r| totals.for_category(*r).expect("root entry").subtree_subtotal)
            .sum();
        assert_eq!(roots_sum, flat);
    }

    #[test]
    fn aggregate_node_matches_project_totals() {
        let (tree, ledger) = earthworks();
        let agg = aggregate_node(&tree, &ledger, id(1)).expect("aggregate");
        assert_eq!(agg.subtree_subtotal, Money::from(500_000));
        let sub = aggregate_node(&tree, &ledger, id(2)).expect("aggregate");
        assert_eq!(sub.own_subtotal, Money::from(500_000));
    }

    #[test]
    fn aggregate_of_missing_node_is_invalid_node() {
        let (tree, ledger) = earthworks();
        let err = aggregate_node(&tree, &ledger, id(99)).unwrap_err();
        assert!(matches!(err, BoqError::InvalidNode { .. }));
    }
}
