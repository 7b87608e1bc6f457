//! kiln CLI - static site build tool.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Build a static site from templates, styles, scripts and images, then watch")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to kiln.toml config file
    #[arg(short, long, default_value = "kiln.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full build, then rebuild on changes (default)
    Watch,

    /// Run a full build once
    Build,

    /// Lint HTML templates only
    Lint,

    /// Scaffold a starter source tree
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let build_config = config::build_config(&cli.config)?;

    let success = match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => commands::watch::run(build_config).await?,
        Commands::Build => commands::build::run(build_config).await?,
        Commands::Lint => commands::lint::run(build_config).await?,
        Commands::Init { yes } => {
            commands::init::run(&build_config, &cli.config, yes).await?;
            true
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
