//! JSON sidecar records next to each screenshot.
//!
//! A screenshot `Screenshot_0001.bmp` gets `Screenshot_0001.json` holding the
//! location snapshot at capture time. The record is written once; an existing
//! sidecar is never touched again.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::location::LocationSnapshot;
use crate::output::{write_new, WriteOutcome};

/// On-disk sidecar layout.
///
/// Keys follow the game's own naming. Every key is always present; missing
/// values are written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidecarRecord {
    /// When the record was written.
    pub timestamp: DateTime<Local>,
    /// Current star system.
    #[serde(rename = "StarSystem")]
    pub star_system: Option<String>,
    /// Current planet or body.
    #[serde(rename = "Planet")]
    pub planet: Option<String>,
    /// Docked station.
    #[serde(rename = "Station")]
    pub station: Option<String>,
    /// Docked station type.
    #[serde(rename = "StationType")]
    pub station_type: Option<String>,
    /// Body name from the status file.
    #[serde(rename = "BodyName")]
    pub body_name: Option<String>,
    /// Body radius in metres.
    #[serde(rename = "PlanetRadius")]
    pub planet_radius: Option<f64>,
    /// Ambient temperature in kelvin.
    #[serde(rename = "Temperature")]
    pub temperature: Option<f64>,
    /// Local gravity.
    #[serde(rename = "Gravity")]
    pub gravity: Option<f64>,
    /// Latitude in degrees.
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    /// Heading in degrees.
    #[serde(rename = "Heading")]
    pub heading: Option<f64>,
    /// Altitude in metres.
    #[serde(rename = "Altitude")]
    pub altitude: Option<f64>,
    /// Legal state.
    #[serde(rename = "LegalState")]
    pub legal_state: Option<String>,
    /// Suit oxygen.
    #[serde(rename = "Oxygen")]
    pub oxygen: Option<f64>,
    /// Health.
    #[serde(rename = "Health")]
    pub health: Option<f64>,
    /// Raw `Flags` word.
    #[serde(rename = "Flags")]
    pub flags: u32,
    /// Raw `Flags2` word.
    #[serde(rename = "Flags2")]
    pub flags2: u32,
    /// Human-readable flags.
    #[serde(rename = "DecFlags")]
    pub decoded_flags: String,
}

impl SidecarRecord {
    /// Build a record from a snapshot, stamped with `timestamp`.
    #[must_use]
    pub fn new(snapshot: &LocationSnapshot, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            star_system: snapshot.star_system.clone(),
            planet: snapshot.planet.clone(),
            station: snapshot.station.clone(),
            station_type: snapshot.station_type.clone(),
            body_name: snapshot.body_name.clone(),
            planet_radius: snapshot.planet_radius,
            temperature: snapshot.temperature(),
            gravity: snapshot.gravity(),
            latitude: snapshot.latitude,
            longitude: snapshot.longitude,
            heading: snapshot.heading,
            altitude: snapshot.altitude,
            legal_state: snapshot.legal_state.clone(),
            oxygen: snapshot.oxygen(),
            health: snapshot.health(),
            flags: snapshot.flags,
            flags2: snapshot.flags2,
            decoded_flags: snapshot.decoded_flags.clone(),
        }
    }

    /// Pretty-printed JSON with 4-space indentation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        Ok(buf)
    }
}

/// Sidecar path for a screenshot.
#[must_use]
pub fn sidecar_path(screenshot: &Path) -> PathBuf {
    screenshot.with_extension("json")
}

/// Writes sidecar records, at most once per screenshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarWriter;

impl SidecarWriter {
    /// Create a writer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Write the sidecar for `screenshot` unless one already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn write(&self, screenshot: &Path, snapshot: &LocationSnapshot) -> Result<WriteOutcome> {
        let path = sidecar_path(screenshot);
        if path.exists() {
            debug!(sidecar = %path.display(), "Sidecar already exists; skipping");
            return Ok(WriteOutcome::AlreadyExists(path));
        }

        let record = SidecarRecord::new(snapshot, Local::now());
        let outcome = write_new(&path, &record.to_pretty_json()?)?;
        if outcome.is_written() {
            info!(sidecar = %path.display(), "Saved location data");
        }
        Ok(outcome)
    }
}
