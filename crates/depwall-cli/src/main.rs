//! depwall CLI tool.
//!
//! Usage:
//! ```bash
//! depwall [check] [OPTIONS]
//! depwall init [--force]
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Checks that packages only import what their layer allows
#[derive(Parser)]
#[command(name = "depwall")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    check: CheckArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Check constraints (default)
    Check(CheckArgs),

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Options of the check command.
#[derive(Args, Clone, Debug, Default)]
pub struct CheckArgs {
    /// Skip packages outside the module (overrides config)
    #[arg(long, value_name = "BOOL")]
    ignore_external: Option<bool>,

    /// Follow imports transitively (overrides config)
    #[arg(long, value_name = "BOOL")]
    recursive: Option<bool>,

    /// Number of packages checked concurrently (overrides config)
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// When to color verdicts
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,
}

/// Color selection for report output.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Color when stdout is a terminal.
    #[default]
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command.unwrap_or(Commands::Check(cli.check)) {
        Commands::Check(args) => commands::check::run(cli.config.as_deref(), &args).await,
        Commands::Init { force } => commands::init::run(force).map(|()| true),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
