//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Write sidecars only; leave screenshots untouched
    #[arg(long)]
    pub no_images: bool,

    /// Do not process the newest existing screenshot at startup
    #[arg(long)]
    pub skip_latest: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Process command arguments.
#[derive(Debug, Args)]
pub struct ProcessCommand {
    /// The screenshot to process
    pub screenshot: PathBuf,

    /// Write the sidecar only
    #[arg(long)]
    pub no_image: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
