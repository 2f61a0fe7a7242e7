mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::debug;
use std::process;

use commands::export::ExportArgs;
use commands::presets::PresetsArgs;
use commands::project::ProjectArgs;
use commands::sweep::SweepArgs;
use commands::variants::{RunwayArgs, VariantsArgs};

/// Working capital and cash flow what-if projections
#[derive(Parser)]
#[command(
    name = "wcn",
    version,
    about = "Working capital and cash flow what-if projections",
    long_about = "Project revenue, working capital, free cash flow and debt service \
                  period by period with decimal precision, then compare scenario \
                  variants: payment terms, growth, operational risks and leverage."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Project a single scenario period by period
    Project(ProjectArgs),
    /// Sweep one parameter across a list or range of values
    Sweep(SweepArgs),
    /// Run a scenario family (wc, growth, risk, debt) against the base case
    Variants(VariantsArgs),
    /// Cash runway and maximum sustainable growth rate
    Runway(RunwayArgs),
    /// List presets, or print one preset's configuration
    Presets(PresetsArgs),
    /// Write every variant of a family to a CSV file
    Export(ExportArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Project(args) => commands::project::run_project(args),
        Commands::Sweep(args) => commands::sweep::run_sweep(args),
        Commands::Variants(args) => commands::variants::run_variants(args),
        Commands::Runway(args) => commands::variants::run_runway(args),
        Commands::Presets(args) => commands::presets::run_presets(args),
        Commands::Export(args) => commands::export::run_export(args),
        Commands::Version => {
            println!("wcn {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            debug!("formatting output as {:?}", cli.output);
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
