//! The presentational row projection.
//!
//! Pre-order traversal of the category tree, interleaving category header
//! rows with the category's line-item rows. Categories that contribute
//! nothing (no own items, no non-empty descendant) are elided — a display
//! policy only, the nodes stay in the tree and in the totals. Sibling
//! indices for numbering count *rendered* siblings, so hiding an empty
//! category renumbers the ones after it.

use serde::Serialize;

use crate::catalog::CatalogResolver;
use crate::config::RenderConfig;
use crate::ledger::Ledger;
use crate::model::{CategoryId, LineItem};
use crate::numbering::label_for;
use crate::tree::CategoryTree;

/// One rendered table row. Fields that do not apply to the row kind
/// (quantity on a header, for example) are empty strings, matching the
/// boundary contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub label: String,
    pub name: String,
    pub quantity: String,
    pub unit: String,
    pub unit_price: String,
    pub line_total: String,
}

impl Row {
    fn header(label: String, name: &str) -> Self {
        Self {
            label,
            name: name.to_string(),
            quantity: String::new(),
            unit: String::new(),
            unit_price: String::new(),
            line_total: String::new(),
        }
    }
}

/// Produce the ordered row sequence for the whole forest.
#[must_use]
pub fn render_rows(
    tree: &CategoryTree,
    ledger: &Ledger,
    catalog: &dyn CatalogResolver,
    cfg: &RenderConfig,
) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut index = 0;
    for root in tree.roots() {
        if cfg.hide_empty_categories && !has_content(tree, ledger, *root) {
            continue;
        }
        emit(tree, ledger, catalog, cfg, *root, 0, index, &mut rows);
        index += 1;
    }
    rows
}

/// Whether the subtree rooted at `id` owns any line item.
fn has_content(tree: &CategoryTree, ledger: &Ledger, id: CategoryId) -> bool {
    !ledger.line_items_for(id).is_empty()
        || tree
            .children_of(id)
            .iter()
            .any(|child| has_content(tree, ledger, *child))
}

fn emit(
    tree: &CategoryTree,
    ledger: &Ledger,
    catalog: &dyn CatalogResolver,
    cfg: &RenderConfig,
    id: CategoryId,
    level: u32,
    sibling_index: usize,
    rows: &mut Vec<Row>,
) {
    let Some(node) = tree.get(id) else {
        return;
    };
    rows.push(Row::header(label_for(level, sibling_index), &node.name));

    for (i, item) in ledger.line_items_for(id).iter().enumerate() {
        rows.push(item_row(catalog, cfg, item, i));
    }

    let mut index = 0;
    for child in tree.children_of(id) {
        if cfg.hide_empty_categories && !has_content(tree, ledger, *child) {
            continue;
        }
        emit(tree, ledger, catalog, cfg, *child, level + 1, index, rows);
        index += 1;
    }
}

fn item_row(catalog: &dyn CatalogResolver, cfg: &RenderConfig, item: &LineItem, index: usize) -> Row {
    let (name, unit) = match catalog.resolve(item.catalog_item_id) {
        Some(entry) => (
            entry.name.clone(),
            entry.unit.clone().unwrap_or_else(|| "unit".to_string()),
        ),
        None => {
            tracing::warn!(
                catalog_item = %item.catalog_item_id,
                line_item = %item.id,
                "catalog entry missing, rendering placeholder"
            );
            (
                format!("unknown item #{}", item.catalog_item_id),
                "unit".to_string(),
            )
        }
    };
    Row {
        label: (index + 1).to_string(),
        name,
        quantity: item.quantity.normalize().to_string(),
        unit,
        unit_price: cfg.format_money(item.unit_price),
        line_total: cfg.format_money(item.line_total()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
