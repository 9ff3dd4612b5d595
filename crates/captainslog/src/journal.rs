//! Replaying the game journal into a location state.
//!
//! The game appends one JSON object per line to `Journal.<stamp>.log`. Only a
//! handful of event kinds move the player between systems, bodies and
//! stations; replaying those in order and keeping the latest value per field
//! gives the current location.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Journal events that affect the location state.
///
/// Every other event kind deserializes to [`JournalEvent::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event")]
pub enum JournalEvent {
    /// Written at startup and after respawns.
    Location {
        /// Current star system.
        #[serde(rename = "StarSystem")]
        star_system: Option<String>,
        /// Nearest body.
        #[serde(rename = "Body")]
        body: Option<String>,
    },
    /// Docked at a station or settlement.
    Docked {
        /// Station name.
        #[serde(rename = "StationName")]
        station_name: Option<String>,
        /// Station type such as `Coriolis` or `CraterOutpost`.
        #[serde(rename = "StationType")]
        station_type: Option<String>,
    },
    /// Left the station.
    Undocked,
    /// Hyperspace jump into a new system completed.
    #[serde(rename = "FSDJump")]
    FsdJump {
        /// Arrival system.
        #[serde(rename = "StarSystem")]
        star_system: Option<String>,
    },
    /// Landed on a body.
    Touchdown {
        /// Body landed on.
        #[serde(rename = "Body")]
        body: Option<String>,
    },
    /// Any event kind that does not move the player.
    #[serde(other)]
    Other,
}

/// Where the journal says the player is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationState {
    /// Current star system.
    pub system: Option<String>,
    /// Current planet or other body.
    pub planet: Option<String>,
    /// Station the ship is docked at.
    pub station: Option<String>,
    /// Type of that station.
    pub station_type: Option<String>,
}

impl LocationState {
    /// Fold one event into the state.
    #[must_use]
    pub fn apply(mut self, event: JournalEvent) -> Self {
        match event {
            JournalEvent::Location { star_system, body } => {
                self.system = star_system;
                self.planet = body;
            }
            JournalEvent::Docked {
                station_name,
                station_type,
            } => {
                self.station = station_name;
                self.station_type = station_type;
            }
            JournalEvent::Undocked => {
                self.station = None;
                self.station_type = None;
            }
            JournalEvent::FsdJump { star_system } => {
                self.system = star_system;
                self.planet = None;
                self.station = None;
                self.station_type = None;
            }
            JournalEvent::Touchdown { body } => {
                self.planet = body;
            }
            JournalEvent::Other => {}
        }
        self
    }
}

/// Replay events oldest first into a location state.
pub fn replay<I>(events: I) -> LocationState
where
    I: IntoIterator<Item = JournalEvent>,
{
    events
        .into_iter()
        .fold(LocationState::default(), LocationState::apply)
}

/// Parse journal text into events, skipping blank and malformed lines.
///
/// The last line may be a partial write by the game; it is skipped like any
/// other malformed line.
pub fn parse_events(contents: &[u8]) -> impl Iterator<Item = JournalEvent> + '_ {
    contents
        .split(|&b| b == b'\n')
        .enumerate()
        .filter(|(_, line)| !line.iter().all(u8::is_ascii_whitespace))
        .filter_map(|(index, line)| match serde_json::from_slice(line) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(line = index + 1, "Skipping malformed journal line: {err}");
                None
            }
        })
}

/// Read and replay a journal file.
///
/// # Errors
///
/// Returns [`Error::JournalRead`] if the file cannot be read.
pub fn replay_file(path: &Path) -> Result<LocationState> {
    let contents = std::fs::read(path).map_err(|source| Error::JournalRead {
        path: path.to_path_buf(),
        source,
    })?;

    let state = replay(parse_events(&contents));
    debug!(journal = %path.display(), ?state, "Replayed journal");
    Ok(state)
}

fn journal_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^Journal\..+\.log$").expect("Invalid journal file pattern")
    })
}

/// Check whether a file name looks like a journal file.
#[must_use]
pub fn is_journal_name(name: &str) -> bool {
    journal_name_pattern().is_match(name)
}

/// Find the most recently modified journal file in a directory.
///
/// # Errors
///
/// Returns [`Error::NoJournal`] if the directory holds no journal file, or an
/// I/O error if it cannot be listed.
pub fn latest_journal(dir: &Path) -> Result<PathBuf> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_str().is_some_and(is_journal_name) {
            continue;
        }

        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }

        let modified = metadata.modified()?;
        if newest.as_ref().map_or(true, |(time, _)| modified > *time) {
            newest = Some((modified, entry.path()));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| Error::NoJournal {
            dir: dir.to_path_buf(),
        })
}
