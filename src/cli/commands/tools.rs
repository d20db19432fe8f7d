//! External tool and credential checks.

use std::path::Path;

use crate::acquire;
use crate::config::{self, Config, SearchBackendKind};

/// Report yt-dlp/ffmpeg availability and which credentials are set
pub fn cmd_check_tools(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = config::layered(config_path)?;

    println!("Checking external tools...\n");

    let mut missing = false;
    let ytdlp = config
        .output
        .ytdlp_path
        .clone()
        .or_else(|| acquire::find_ytdlp().map(str::to_string));
    match ytdlp.as_deref().and_then(|p| acquire::ytdlp_version(p).map(|v| (p, v))) {
        Some((path, version)) => println!("✓ yt-dlp: {} ({})", version, path),
        None => {
            println!("✗ yt-dlp: NOT FOUND");
            missing = true;
        }
    }
    match acquire::ffmpeg_version() {
        Some(version) => println!("✓ ffmpeg: {}", version),
        None => {
            println!("✗ ffmpeg: NOT FOUND");
            missing = true;
        }
    }
    if missing {
        println!();
        super::print_tool_install_instructions();
    }

    println!();
    println!("Credentials:");
    for (name, present) in credential_status(&config) {
        if present {
            println!("✓ {}: set", name);
        } else {
            println!("✗ {}: not set", name);
        }
    }
    println!();
    println!("Search backend: {:?}", config.search.backend);

    Ok(())
}

/// Credentials the configured deployment needs, with presence flags
fn credential_status(config: &Config) -> Vec<(&'static str, bool)> {
    let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

    let mut status = vec![
        ("CLIENT_ID", set(&config.credentials.client_id)),
        ("CLIENT_SECRET", set(&config.credentials.client_secret)),
    ];
    match config.search.backend {
        SearchBackendKind::DataApi => status.push(("YT_API_KEY", set(&config.credentials.youtube_api_key))),
        SearchBackendKind::Invidious => status.push(("INVIDIOUS_URL", set(&config.search.invidious_url))),
        SearchBackendKind::Keyword => {}
    }
    status
}
