//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `serve`: the HTTP service (default when no subcommand is given)
//! - `fetch`: one-shot `download` and catalog `search` from the terminal
//! - `tools`: external tool and credential checks

mod fetch;
mod serve;
mod tools;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

pub use fetch::{cmd_download, cmd_search};
pub use serve::cmd_serve;
pub use tools::cmd_check_tools;

/// Track Fetch CLI
#[derive(Parser)]
#[command(author, version, about = "Fetch catalog tracks as tagged audio files", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file (defaults to the OS config directory)
    #[arg(long, global = true, env = "TRACK_FETCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind (overrides HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Download one track by catalog id and print the resulting path
    Download {
        /// Catalog track id (e.g. 4uLU6hMCjMI75M1A2tKUQC)
        track_id: String,
        /// Output directory (overrides SAVE_DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Search the catalog for tracks
    Search {
        /// Free-text query
        query: String,
        /// Maximum results to print
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Print the raw catalog response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that yt-dlp, ffmpeg and credentials are available
    CheckTools,
}

/// Run the selected command; no subcommand means `serve`.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let config_path = cli.config.as_deref();

    match &cli.command {
        None => cmd_serve(&rt, config_path, None, None),
        Some(Commands::Serve { host, port }) => cmd_serve(&rt, config_path, host.clone(), *port),
        Some(Commands::Download { track_id, output }) => {
            cmd_download(&rt, config_path, track_id, output.as_ref())
        }
        Some(Commands::Search { query, limit, json }) => {
            cmd_search(&rt, config_path, query, *limit, *json)
        }
        Some(Commands::CheckTools) => cmd_check_tools(config_path),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Print installation instructions for yt-dlp and ffmpeg
pub(crate) fn print_tool_install_instructions() {
    eprintln!("Install yt-dlp and ffmpeg:");
    eprintln!("  Windows: winget install yt-dlp.yt-dlp Gyan.FFmpeg");
    eprintln!("  macOS:   brew install yt-dlp ffmpeg");
    eprintln!("  Linux:   pip install yt-dlp && apt install ffmpeg");
}
