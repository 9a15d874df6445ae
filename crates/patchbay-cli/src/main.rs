//! Patchbay CLI - Command-line interface for the patchbay node graph engine.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "patchbay")]
#[command(author, version, about = "Patchbay node graph CLI", long_about = None)]
struct Cli {
    /// Engine settings file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available node types and their sockets
    Types(commands::types::TypesArgs),

    /// Validate a graph file without running it
    Check(commands::check::CheckArgs),

    /// Tick and draw a graph headlessly
    Run(commands::run::RunArgs),

    /// Render the output bus of a graph to a WAV file
    Render(commands::render::RenderArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::common::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Types(args) => commands::types::run(args, &config),
        Commands::Check(args) => commands::check::run(args, &config),
        Commands::Run(args) => commands::run::run(args, &config),
        Commands::Render(args) => commands::render::run(args, &config),
    }
}
