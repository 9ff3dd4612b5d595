//! Command-line interface for captainslog.
//!
//! This module provides the CLI structure and command handlers for the
//! `caplog` binary.

mod commands;
pub mod panel;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, ProcessCommand, StatusCommand, WatchCommand};

/// caplog - Stamp your screenshots with where you took them
///
/// Watches the game's screenshot folder and, for every new capture, writes a
/// JSON record of the current location next to it and a downscaled copy with
/// the location printed on it.
#[derive(Debug, Parser)]
#[command(name = "caplog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch for new screenshots until Ctrl+C
    Watch(WatchCommand),

    /// Show the current location
    Status(StatusCommand),

    /// Process a single screenshot
    Process(ProcessCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// Whether the command reads game files and so needs them to exist.
    #[must_use]
    pub fn needs_game_files(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
