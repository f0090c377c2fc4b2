#![forbid(unsafe_code)]

mod cmd;
mod output;
mod project;

use std::env;
use std::path::PathBuf;

use boq_core::config::{self, RenderConfig};
use boq_core::error::BoqError;
use clap::{Parser, Subcommand};
use output::{CliError, OutputMode};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "boq: hierarchical bill-of-quantities engine",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Path to a render config TOML (currency symbol, separators).
    #[arg(long, global = true, default_value = "boq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Render the numbered presentation table",
        long_about = "Render the project as the numbered table: Roman numerals for roots, letters for sub-categories, decimals below.",
        after_help = "EXAMPLES:\n    # Render a project file\n    boq render project.json\n\n    # Emit machine-readable output\n    boq render project.json --json"
    )]
    Render(cmd::render::RenderArgs),

    #[command(
        about = "Show per-category subtotals and the grand total",
        after_help = "EXAMPLES:\n    # Show the subtotal outline\n    boq totals project.json\n\n    # Emit machine-readable output\n    boq totals project.json --json"
    )]
    Totals(cmd::totals::TotalsArgs),

    #[command(
        about = "Validate a project file",
        long_about = "Validate a project file: orphaned parents, cycles, level mismatches, and dangling line items.",
        after_help = "EXAMPLES:\n    # Validate structure and references\n    boq check project.json"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        about = "Apply one mutation to a project file",
        after_help = "EXAMPLES:\n    # Add a root category and save\n    boq apply project.json --mutation '{\"op\": \"addRootCategory\", \"name\": \"Earthworks\"}' --write\n\n    # Dry-run a delete\n    boq apply project.json --mutation '{\"op\": \"deleteCategory\", \"id\": 3}'"
    )]
    Apply(cmd::apply::ApplyArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BOQ_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "boq=debug,info"
        } else {
            "boq=info,warn"
        })
    });

    let format = env::var("BOQ_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let mode = cli.output_mode();
    let render_cfg: RenderConfig = config::load_render_config(&cli.config)?;

    let result = match cli.command {
        Commands::Render(ref args) => cmd::render::run_render(args, mode, &render_cfg),
        Commands::Totals(ref args) => cmd::totals::run_totals(args, mode, &render_cfg),
        Commands::Check(ref args) => cmd::check::run_check(args, mode),
        Commands::Apply(ref args) => cmd::apply::run_apply(args, mode, &render_cfg),
    };

    if let Err(err) = result {
        let cli_error = match err.downcast_ref::<BoqError>() {
            Some(engine_err) => CliError::from(engine_err),
            None => CliError {
                message: format!("{err:#}"),
                hint: None,
                code: None,
            },
        };
        output::render_error(mode, &cli_error)?;
        std::process::exit(1);
    }
    Ok(())
}
