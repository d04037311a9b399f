//! Mosaic CLI — the command-line interface for the Mosaic floorplanner.
//!
//! Provides `mosaic plan` to run the shape, placement, and pin-alignment
//! pipeline on a project, and `mosaic check` to validate the configuration
//! and design inputs without floorplanning.

#![warn(missing_docs)]

mod check;
mod plan;
mod project;

use std::process;

use clap::{Parser, Subcommand};

/// Mosaic — a sequence-pair simulated-annealing macro floorplanner.
#[derive(Parser, Debug)]
#[command(name = "mosaic", version, about = "Mosaic macro floorplanner")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print report-level progress diagnostics.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `mosaic.toml` file or project directory.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the complete floorplanning pipeline.
    Plan(PlanArgs),
    /// Validate the configuration and design inputs.
    Check,
}

/// Arguments for the `mosaic plan` subcommand.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Output path for the floorplan dump, relative to the project root.
    #[arg(short, long, default_value = "floorplan.out")]
    pub output: String,

    /// Also write the run report as JSON to this path.
    #[arg(long)]
    pub json: Option<String>,

    /// Override the configured master seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print report-level diagnostics.
    pub verbose: bool,
    /// Optional path to a custom config file or project directory.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Plan(ref args) => plan::run(args, &global),
        Command::Check => check::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
