mod cli;
mod config;
mod error;
mod logging;
mod model;
mod orchestrator;
mod runner;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let _log_guard = logging::init(args.log_file.as_deref())?;

    let res = cli::run(args).await;
    if let Err(e) = &res {
        tracing::error!(error = %format!("{e:#}"), "exiting with error");
    }
    res
}
