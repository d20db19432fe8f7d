//! Track Fetch - turn catalog track ids into tagged audio files.
//!
//! Resolves a track's metadata from the catalog, locates a matching video
//! source, extracts its audio with yt-dlp, writes tags and cover art, and
//! serves the result over HTTP. The same pipeline is available as one-shot
//! CLI commands.

pub mod acquire;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod net;
pub mod organizer;
pub mod pipeline;
pub mod server;
pub mod source;
pub mod tagger;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("track_fetch=info,tower_http=info")),
        )
        .init();

    cli::run_command(&args)
}
