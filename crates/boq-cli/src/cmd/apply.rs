//! `boq apply`: run one mutation against a project file.
//!
//! The mutation comes in as JSON, either inline (`--mutation`) or from a
//! file (`--mutation-file`). With `--write` the mutated state replaces the
//! project file; without it the command is a dry run that still reports
//! the outcome and recomputed totals.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Args;
use tracing::info;

use boq_core::config::RenderConfig;
use boq_core::engine::{Applied, Mutation};

use crate::output::{self, OutputMode};
use crate::project::ProjectFile;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Path to the project JSON file.
    pub file: PathBuf,

    /// Inline mutation JSON, e.g. '{"op": "addRootCategory", "name": "Earthworks"}'.
    #[arg(long, conflicts_with = "mutation_file")]
    pub mutation: Option<String>,

    /// Read the mutation JSON from a file.
    #[arg(long)]
    pub mutation_file: Option<PathBuf>,

    /// Write the mutated project back to the file.
    #[arg(long)]
    pub write: bool,
}

pub fn run_apply(args: &ApplyArgs, mode: OutputMode, cfg: &RenderConfig) -> anyhow::Result<()> {
    let mutation = parse_mutation(args)?;

    let mut project = ProjectFile::load(&args.file)?;
    let mut snapshot = project.snapshot()?;
    let outcome = snapshot.apply(mutation)?;

    if args.write {
        project.absorb(&snapshot);
        project.save(&args.file)?;
        info!(file = %args.file.display(), version = project.version, "project file updated");
    }

    output::render(mode, &outcome, |outcome, w| {
        writeln!(w, "{}", describe(&outcome.applied))?;
        writeln!(
            w,
            "Grand total: {}",
            cfg.format_money(outcome.totals.grand_total)
        )?;
        if !args.write {
            writeln!(w, "(dry run; pass --write to save)")?;
        }
        Ok(())
    })
}

fn parse_mutation(args: &ApplyArgs) -> anyhow::Result<Mutation> {
    let json = match (&args.mutation, &args.mutation_file) {
        (Some(inline), None) => inline.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => bail!("pass exactly one of --mutation or --mutation-file"),
    };
    serde_json::from_str(&json).context("Failed to parse mutation JSON")
}

fn describe(applied: &Applied) -> String {
    match applied {
        Applied::CategoryCreated { id } => format!("Created category {id}"),
        Applied::CategoryRenamed { id } => format!("Renamed category {id}"),
        Applied::CategoryDeleted {
            id,
            removed_categories,
            removed_items,
        } => format!(
            "Deleted category {id} ({removed_categories} categories, {removed_items} line items removed)"
        ),
        Applied::LineItemAttached { id } => format!("Attached line item {id}"),
        Applied::LineItemDetached { id } => format!("Detached line item {id}"),
        Applied::LineItemUpdated { id } => format!("Updated line item {id}"),
    }
}
