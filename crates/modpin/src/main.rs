//! modpin: pin module dependencies to content hashes.

mod cli;
mod error;

use std::process::ExitCode;

use clap::Parser;
use console::style;
use modpin_fetch::{EngineConfig, FetchError};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, commands};
use crate::error::CliResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug; RUST_LOG wins when set
    let level = match cli.verbose {
        0 => "modpin=warn",
        1 => "modpin=info",
        _ => "modpin=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // verify never touches the network, so it runs without loading config
    let config = |path: Option<&std::path::Path>| EngineConfig::load(path).map_err(FetchError::from);

    match cli.command {
        Commands::Verify(args) => commands::verify(args),
        Commands::Fetch(args) => commands::fetch(args, &config(cli.config.as_deref())?).await,
        Commands::Lock(args) => commands::lock(args, &config(cli.config.as_deref())?).await,
        Commands::Update(args) => commands::update(args, &config(cli.config.as_deref())?).await,
        Commands::TreeHash(args) => commands::tree_hash(args, &config(cli.config.as_deref())?).await,
    }
}
