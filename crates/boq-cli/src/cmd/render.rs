//! `boq render`: the numbered presentation table.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;

use boq_core::config::RenderConfig;
use boq_core::render::Row;

use crate::output::{self, OutputMode};
use crate::project::ProjectFile;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Path to the project JSON file.
    pub file: PathBuf,
}

pub fn run_render(args: &RenderArgs, mode: OutputMode, cfg: &RenderConfig) -> anyhow::Result<()> {
    let project = ProjectFile::load(&args.file)?;
    let snapshot = project.snapshot()?;
    let rows = snapshot.rows(&project.resolver(), cfg);
    output::render(mode, &rows, |rows, w| print_table(rows, w))
}

const HEADERS: [&str; 6] = ["No.", "Description", "Qty", "Unit", "Unit Price", "Amount"];

/// Money columns are right-aligned, the rest left-aligned.
const RIGHT_ALIGNED: [bool; 6] = [false, false, true, false, true, true];

fn print_table(rows: &[Row], w: &mut dyn Write) -> io::Result<()> {
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    let cells: Vec<[&str; 6]> = rows.iter().map(row_cells).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    print_row(w, &HEADERS, &widths)?;
    let rule_len = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    writeln!(w, "{:-<rule_len$}", "")?;
    for row in &cells {
        print_row(w, row, &widths)?;
    }
    Ok(())
}

fn row_cells(row: &Row) -> [&str; 6] {
    [
        &row.label,
        &row.name,
        &row.quantity,
        &row.unit,
        &row.unit_price,
        &row.line_total,
    ]
}

fn print_row(w: &mut dyn Write, cells: &[&str; 6], widths: &[usize]) -> io::Result<()> {
    let mut line = String::new();
    for (i, (cell, &width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        if RIGHT_ALIGNED[i] {
            line.push_str(&format!("{cell:>width$}"));
        } else {
            line.push_str(&format!("{cell:<width$}"));
        }
    }
    writeln!(w, "{}", line.trim_end())
}
