//! `captainslog` - Stamp flight-sim screenshots with live telemetry
//!
//! This library correlates each new screenshot with the game's status file and
//! journal, then writes a JSON sidecar and an annotated, downscaled copy.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod annotate;
pub mod cli;
pub mod config;
pub mod error;
pub mod flags;
pub mod journal;
pub mod location;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod sidecar;
pub mod status;

pub use annotate::{AnnotateOutcome, Annotator};
pub use config::Config;
pub use error::{Error, Result};
pub use location::{LocationAggregator, LocationSnapshot};
pub use logging::init_logging;
pub use monitor::{Monitor, MonitorHandle};
pub use pipeline::{Pipeline, ProcessReport};
pub use sidecar::{SidecarRecord, SidecarWriter};
pub use status::{StatusReader, StatusSnapshot};
