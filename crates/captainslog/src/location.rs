//! Merging status telemetry and journal state into one location snapshot.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::flags::decode_flags;
use crate::journal::{self, LocationState};
use crate::status::StatusSnapshot;

/// Surface readings only meaningful while on foot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Suit oxygen, 0.0 to 1.0.
    pub oxygen: Option<f64>,
    /// Health, 0.0 to 1.0.
    pub health: Option<f64>,
    /// Ambient temperature in kelvin.
    pub temperature: Option<f64>,
    /// Local gravity.
    pub gravity: Option<f64>,
}

/// Everything known about where the player is at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    /// Current star system.
    pub star_system: Option<String>,
    /// Current planet or body, from the journal.
    pub planet: Option<String>,
    /// Docked station.
    pub station: Option<String>,
    /// Docked station type.
    pub station_type: Option<String>,
    /// Body name reported by the status file.
    pub body_name: Option<String>,
    /// Radius of that body in metres.
    pub planet_radius: Option<f64>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Heading in degrees.
    pub heading: Option<f64>,
    /// Altitude in metres.
    pub altitude: Option<f64>,
    /// Legal state.
    pub legal_state: Option<String>,
    /// Raw `Flags` word.
    pub flags: u32,
    /// Raw `Flags2` word.
    pub flags2: u32,
    /// Human-readable flags.
    pub decoded_flags: String,
    /// Present only when `Flags2` is non-zero.
    pub environment: Option<Environment>,
}

impl LocationSnapshot {
    /// Combine a status reading with replayed journal state.
    #[must_use]
    pub fn assemble(status: &StatusSnapshot, location: LocationState) -> Self {
        let environment = (status.flags2 != 0).then(|| Environment {
            oxygen: status.oxygen,
            health: status.health,
            temperature: status.temperature,
            gravity: status.gravity,
        });

        Self {
            star_system: non_empty(location.system),
            planet: non_empty(location.planet),
            station: non_empty(location.station),
            station_type: non_empty(location.station_type),
            body_name: status.body_name.clone(),
            planet_radius: status.planet_radius,
            latitude: status.latitude,
            longitude: status.longitude,
            heading: status.heading,
            altitude: status.altitude,
            legal_state: status.legal_state.clone(),
            flags: status.flags,
            flags2: status.flags2,
            decoded_flags: decode_flags(status.flags, status.flags2),
            environment,
        }
    }

    /// Temperature, when environment readings are present.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.environment.as_ref().and_then(|env| env.temperature)
    }

    /// Gravity, when environment readings are present.
    #[must_use]
    pub fn gravity(&self) -> Option<f64> {
        self.environment.as_ref().and_then(|env| env.gravity)
    }

    /// Oxygen, when environment readings are present.
    #[must_use]
    pub fn oxygen(&self) -> Option<f64> {
        self.environment.as_ref().and_then(|env| env.oxygen)
    }

    /// Health, when environment readings are present.
    #[must_use]
    pub fn health(&self) -> Option<f64> {
        self.environment.as_ref().and_then(|env| env.health)
    }
}

/// The game writes empty strings for names it does not know.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Builds location snapshots from the newest journal in a directory.
#[derive(Debug, Clone)]
pub struct LocationAggregator {
    journal_dir: PathBuf,
}

impl LocationAggregator {
    /// Create an aggregator reading journals from `journal_dir`.
    #[must_use]
    pub fn new(journal_dir: impl Into<PathBuf>) -> Self {
        Self {
            journal_dir: journal_dir.into(),
        }
    }

    /// Replay the newest journal and merge it with `status`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoJournal`](crate::Error::NoJournal) when the journal
    /// directory has no journal file; no snapshot is produced in that case.
    pub fn aggregate(&self, status: &StatusSnapshot) -> Result<LocationSnapshot> {
        let journal = journal::latest_journal(&self.journal_dir)?;
        debug!(journal = %journal.display(), "Using newest journal");

        let location = journal::replay_file(&journal)?;
        Ok(LocationSnapshot::assemble(status, location))
    }
}
