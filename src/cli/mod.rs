//! Command-line interface for track-fetch.
//!
//! The binary serves HTTP by default; the other commands run the same
//! components once from a terminal.

mod commands;

pub use commands::{Cli, Commands, run_command};
