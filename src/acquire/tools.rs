//! External tool discovery for yt-dlp and ffmpeg.
//!
//! yt-dlp does the fetching and drives ffmpeg for audio extraction, so both
//! have to be installed:
//! - yt-dlp: `pip install yt-dlp`, `brew install yt-dlp`, `winget install yt-dlp`
//! - ffmpeg: `apt install ffmpeg`, `brew install ffmpeg`, `winget install ffmpeg`

use std::process::Command;

/// Common installation paths for yt-dlp on Windows
#[cfg(windows)]
const YTDLP_PATHS: &[&str] = &[
    "yt-dlp", // In PATH
    r"C:\Program Files\yt-dlp\yt-dlp.exe",
    r"C:\ProgramData\chocolatey\bin\yt-dlp.exe",
];

#[cfg(not(windows))]
const YTDLP_PATHS: &[&str] = &[
    "yt-dlp", // In PATH
    "/usr/bin/yt-dlp",
    "/usr/local/bin/yt-dlp",
    "/opt/homebrew/bin/yt-dlp",
];

/// Find the yt-dlp executable, checking common installation paths
pub fn find_ytdlp() -> Option<&'static str> {
    YTDLP_PATHS
        .iter()
        .find(|&path| tool_version(path, "--version").is_some())
        .copied()
}

/// yt-dlp version string, if `program` runs
pub fn ytdlp_version(program: &str) -> Option<String> {
    tool_version(program, "--version")
}

/// First line of `ffmpeg -version`, if ffmpeg is on PATH
pub fn ffmpeg_version() -> Option<String> {
    tool_version("ffmpeg", "-version")
}

fn tool_version(program: &str, flag: &str) -> Option<String> {
    Command::new(program)
        .arg(flag)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| {
            String::from_utf8_lossy(&o.stdout)
                .lines()
                .next()
                .map(|line| line.trim().to_string())
        })
}
