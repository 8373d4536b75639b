mod process;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "valuer-cli")]
#[command(about = "Auction-lot image pipeline command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch, optimize, and store images for every lot in a search dump
    Process {
        /// Path to the search-results JSON dump
        #[arg(long)]
        input: PathBuf,

        /// Process only the first N lots
        #[arg(long)]
        limit: Option<usize>,

        /// Write the lot-to-reference mapping as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = valuer_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Process {
            input,
            limit,
            output,
        } => process::run_process(&config, &input, limit, output.as_deref()).await,
    }
}
