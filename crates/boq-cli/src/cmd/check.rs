//! `boq check`: validate a project file without rendering anything.
//!
//! Runs the full structural validation (orphans, cycles, level mismatches,
//! dangling line items) and reports a summary. Errors propagate to main,
//! which renders the stable code and hint.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::output::{self, OutputMode};
use crate::project::ProjectFile;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the project JSON file.
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport {
    ok: bool,
    categories: usize,
    line_items: usize,
    catalog_entries: usize,
    /// Line items whose catalog reference does not resolve. They render as
    /// placeholders, so this is a warning, not a failure.
    unresolved_catalog_refs: usize,
}

pub fn run_check(args: &CheckArgs, mode: OutputMode) -> anyhow::Result<()> {
    let project = ProjectFile::load(&args.file)?;
    let snapshot = project.snapshot()?;

    let unresolved = snapshot
        .ledger()
        .iter()
        .filter(|item| !project.catalog.contains_key(&item.catalog_item_id))
        .count();

    let report = CheckReport {
        ok: true,
        categories: snapshot.tree().len(),
        line_items: snapshot.ledger().len(),
        catalog_entries: project.catalog.len(),
        unresolved_catalog_refs: unresolved,
    };
    output::render(mode, &report, |report, w| {
        writeln!(
            w,
            "ok: {} categories, {} line items, {} catalog entries",
            report.categories, report.line_items, report.catalog_entries
        )?;
        if report.unresolved_catalog_refs > 0 {
            writeln!(
                w,
                "warning: {} line item(s) reference missing catalog entries",
                report.unresolved_catalog_refs
            )?;
        }
        Ok(())
    })
}
