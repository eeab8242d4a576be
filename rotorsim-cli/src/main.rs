//! ## rotorsim-cli
//! **Command-line front end of the equipment simulator**
//!
//! `run` ticks in real time against an in-memory store until Ctrl-C;
//! `simulate` runs a fixed number of ticks back to back and prints the
//! state hash, so runs can be compared across builds.

use clap::Parser;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run(args).await,
        Commands::Simulate(args) => commands::simulate(args).await,
    }
}
