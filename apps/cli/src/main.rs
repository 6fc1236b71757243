//! edgepick CLI — carrier-grouped Cloudflare endpoint snapshots.
//!
//! Fetches candidate IPv4 addresses from two public sources, merges and
//! deduplicates them per carrier, and commits a threshold-guarded snapshot.

mod commands;

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
