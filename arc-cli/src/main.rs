//! arc-check - command-line driver for the Arc type checker

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing::Level;

mod commands;
mod config;
mod problem;

use commands::{
    init_config_command, promote_command, solve_command, units_command, validate_config_command,
};

#[derive(Parser)]
#[command(name = "arc-check")]
#[command(about = "Solve Arc type constraints and check physical units")]
#[command(version = "0.1.0")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Checker configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a JSON constraint problem and validate its operations
    Solve {
        /// Problem file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the unit registry
    Units {
        /// Only show units of this quantity (e.g. pressure, velocity)
        #[arg(short, long)]
        dimension: Option<String>,
    },

    /// Show the type two numeric types promote to
    Promote {
        /// Left type (e.g. i32, "f32 psi")
        a: String,

        /// Right type
        b: String,
    },

    /// Write a default configuration file
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "arc-check.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    ValidateConfig {
        /// Configuration file path
        path: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Solve { input, format } => {
            let config = config::load(cli.config.as_deref())?;
            solve_command(&input, format, config)
        }
        Commands::Units { dimension } => units_command(dimension.as_deref()),
        Commands::Promote { a, b } => promote_command(&a, &b),
        Commands::InitConfig { output } => init_config_command(&output),
        Commands::ValidateConfig { path } => validate_config_command(&path),
    }
}
