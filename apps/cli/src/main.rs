//! Guidecraft CLI: turn a topic into a synthesized technical guide.
//!
//! Runs the generation pipeline locally or serves it over HTTP.

mod commands;
mod progress;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
