mod booster;
mod cli;
mod config;
mod error;
mod extractor;
mod features;
mod fmt;
mod models;
mod pipeline;
mod report;
mod settings;
mod split;
mod store;
mod trainer;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ledgerlens=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    config::load_dotenv();

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cli::run::run(),
        Commands::Extract => cli::extract::run(),
        Commands::Train => cli::train::run(),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        tracing::error!(stage = %e.stage, "Pipeline failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
