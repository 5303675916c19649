//! forest-tracker - Main Entry Point

use clap::Parser;
use forest_tracker::cli::{cmd_info, cmd_runs, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forest_tracker=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => {
            cmd_train(&args)?;
        }
        Commands::Runs(args) => {
            cmd_runs(&args)?;
        }
        Commands::Info { data_path } => {
            cmd_info(&data_path)?;
        }
    }

    Ok(())
}
