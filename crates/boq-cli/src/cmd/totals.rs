//! `boq totals`: per-category subtotals and the grand total.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;

use boq_core::aggregate::Totals;
use boq_core::config::RenderConfig;
use boq_core::model::CategoryId;
use boq_core::tree::CategoryTree;

use crate::output::{self, OutputMode};
use crate::project::ProjectFile;

#[derive(Args, Debug)]
pub struct TotalsArgs {
    /// Path to the project JSON file.
    pub file: PathBuf,
}

pub fn run_totals(args: &TotalsArgs, mode: OutputMode, cfg: &RenderConfig) -> anyhow::Result<()> {
    let project = ProjectFile::load(&args.file)?;
    let snapshot = project.snapshot()?;
    let totals = snapshot.totals();
    output::render(mode, &totals, |totals, w| {
        print_totals(snapshot.tree(), totals, cfg, w)
    })
}

/// Indented category outline with the subtree subtotal on each line.
fn print_totals(
    tree: &CategoryTree,
    totals: &Totals,
    cfg: &RenderConfig,
    w: &mut dyn Write,
) -> io::Result<()> {
    for root in tree.roots() {
        print_node(tree, totals, cfg, *root, w)?;
    }
    writeln!(w, "Grand total: {}", cfg.format_money(totals.grand_total))
}

fn print_node(
    tree: &CategoryTree,
    totals: &Totals,
    cfg: &RenderConfig,
    id: CategoryId,
    w: &mut dyn Write,
) -> io::Result<()> {
    let Some(node) = tree.get(id) else {
        return Ok(());
    };
    let indent = "  ".repeat(node.level as usize);
    let subtotal = totals
        .for_category(id)
        .map_or_else(String::new, |agg| cfg.format_money(agg.subtree_subtotal));
    writeln!(w, "{indent}{}  {subtotal}", node.name)?;
    for child in tree.children_of(id) {
        print_node(tree, totals, cfg, *child, w)?;
    }
    Ok(())
}
