//! Reading the game's `Status.json`.
//!
//! The game rewrites the status file in place several times a second, so a
//! read can observe a truncated or half-written document. [`StatusReader`]
//! retries malformed reads a bounded number of times with a fixed delay and
//! reports a definitive failure afterwards. A torn read can also split a
//! multi-byte character, so the document is parsed from raw bytes and invalid
//! UTF-8 counts as malformed. Anything else (missing file, wrong shape) fails
//! immediately.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};

/// Point-in-time telemetry from the status file.
///
/// Only the fields consumed downstream are kept; everything else the game
/// writes is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusSnapshot {
    /// Packed ship/player state bits.
    #[serde(default)]
    pub flags: u32,
    /// Packed on-foot state bits (low 20 bits meaningful).
    #[serde(default)]
    pub flags2: u32,
    /// Legal state such as `Clean` or `Wanted`.
    pub legal_state: Option<String>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Heading in degrees.
    pub heading: Option<f64>,
    /// Altitude in metres.
    pub altitude: Option<f64>,
    /// Name of the body being approached or landed on.
    pub body_name: Option<String>,
    /// Radius of that body in metres.
    pub planet_radius: Option<f64>,
    /// Suit oxygen, 0.0 to 1.0.
    pub oxygen: Option<f64>,
    /// Health, 0.0 to 1.0.
    pub health: Option<f64>,
    /// Ambient temperature in kelvin.
    pub temperature: Option<f64>,
    /// Local gravity.
    pub gravity: Option<f64>,
}

/// Where raw status text comes from.
pub trait StatusSource {
    /// Path reported in errors and logs.
    fn path(&self) -> &Path;

    /// Read the whole document once, without decoding it.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn read_raw(&self) -> std::io::Result<Vec<u8>>;
}

/// Reads the status document from disk.
#[derive(Debug, Clone)]
pub struct FileStatusSource {
    path: PathBuf,
}

impl FileStatusSource {
    /// Create a source for the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StatusSource for FileStatusSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Delay before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// What a single read attempt produced.
enum Attempt {
    Parsed(StatusSnapshot),
    Malformed(serde_json::Error),
}

/// Reads and parses the status file, riding out concurrent rewrites.
#[derive(Debug)]
pub struct StatusReader<S = FileStatusSource> {
    source: S,
    policy: RetryPolicy,
}

impl StatusReader<FileStatusSource> {
    /// Build a reader for the configured status file.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            FileStatusSource::new(config.status_file()),
            RetryPolicy {
                attempts: config.status.read_attempts,
                delay: config.retry_delay(),
            },
        )
    }
}

impl<S: StatusSource> StatusReader<S> {
    /// Create a reader over an arbitrary source.
    #[must_use]
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// The retry policy in effect.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Read a snapshot, retrying while the document is malformed.
    ///
    /// # Errors
    ///
    /// - [`Error::StatusRead`] immediately if the file cannot be read.
    /// - [`Error::StatusSchema`] immediately if the JSON is complete but not a status object.
    /// - [`Error::StatusCorrupt`] once every attempt saw malformed JSON.
    pub async fn read(&self) -> Result<StatusSnapshot> {
        let attempts = self.policy.attempts.max(1);

        for attempt in 1..=attempts {
            match self.attempt()? {
                Attempt::Parsed(snapshot) => {
                    debug!(attempt, "Read status snapshot");
                    return Ok(snapshot);
                }
                Attempt::Malformed(err) if attempt < attempts => {
                    warn!(
                        path = %self.source.path().display(),
                        "Malformed status file (attempt {attempt}/{attempts}): {err}; retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
                Attempt::Malformed(err) => {
                    warn!(
                        path = %self.source.path().display(),
                        "Malformed status file after {attempts} attempts: {err}"
                    );
                }
            }
        }

        Err(Error::StatusCorrupt {
            path: self.source.path().to_path_buf(),
            attempts,
        })
    }

    fn attempt(&self) -> Result<Attempt> {
        let raw = self.source.read_raw().map_err(|source| Error::StatusRead {
            path: self.source.path().to_path_buf(),
            source,
        })?;

        match serde_json::from_slice(&raw) {
            Ok(snapshot) => Ok(Attempt::Parsed(snapshot)),
            Err(err) if err.is_syntax() || err.is_eof() => Ok(Attempt::Malformed(err)),
            Err(source) => Err(Error::StatusSchema {
                path: self.source.path().to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    const VALID: &str = r#"{ "timestamp":"3310-05-01T12:00:00Z", "event":"Status",
        "Flags":16842765, "Flags2":0, "Pips":[4,8,0], "FireGroup":0, "GuiFocus":0,
        "LegalState":"Clean", "Latitude":12.5, "Longitude":-45.25, "Heading":180,
        "Altitude":0, "BodyName":"Sol 3", "PlanetRadius":6371000.0 }"#;

    /// Hands out a fixed sequence of documents, then repeats the last one.
    struct ScriptedSource {
        path: PathBuf,
        reads: RefCell<VecDeque<std::io::Result<Vec<u8>>>>,
        count: RefCell<u32>,
    }

    impl ScriptedSource {
        fn new(reads: Vec<std::io::Result<Vec<u8>>>) -> Self {
            Self {
                path: PathBuf::from("Status.json"),
                reads: RefCell::new(reads.into()),
                count: RefCell::new(0),
            }
        }

        fn count(&self) -> u32 {
            *self.count.borrow()
        }
    }

    impl StatusSource for ScriptedSource {
        fn path(&self) -> &Path {
            &self.path
        }

        fn read_raw(&self) -> std::io::Result<Vec<u8>> {
            *self.count.borrow_mut() += 1;
            self.reads
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_reads_valid_status() {
        let reader = StatusReader::new(
            ScriptedSource::new(vec![Ok(VALID.into())]),
            fast_policy(),
        );

        let snapshot = reader.read().await.unwrap();
        assert_eq!(snapshot.flags, 16_842_765);
        assert_eq!(snapshot.flags2, 0);
        assert_eq!(snapshot.legal_state.as_deref(), Some("Clean"));
        assert_eq!(snapshot.latitude, Some(12.5));
        assert_eq!(snapshot.body_name.as_deref(), Some("Sol 3"));
        assert!(snapshot.temperature.is_none());
    }

    #[tokio::test]
    async fn test_recovers_after_two_malformed_reads() {
        let source = ScriptedSource::new(vec![
            Ok(r#"{ "Flags": 1"#.into()),
            Ok(Vec::new()),
            Ok(VALID.into()),
        ]);
        let reader = StatusReader::new(source, fast_policy());

        let snapshot = reader.read().await.unwrap();
        assert_eq!(snapshot.legal_state.as_deref(), Some("Clean"));
        assert_eq!(reader.source.count(), 3);
    }

    #[tokio::test]
    async fn test_fails_after_three_malformed_reads() {
        let source = ScriptedSource::new(vec![
            Ok("{".into()),
            Ok("{\"Fla".into()),
            Ok("not json".into()),
            Ok(VALID.into()),
        ]);
        let reader = StatusReader::new(source, fast_policy());

        let err = reader.read().await.unwrap_err();
        assert!(matches!(err, Error::StatusCorrupt { attempts: 3, .. }));
        assert!(err.is_transient());
        assert_eq!(reader.source.count(), 3);
    }

    #[tokio::test]
    async fn test_split_multibyte_character_is_retried() {
        let torn = b"{ \"BodyName\": \"\xC5".to_vec();
        let source = ScriptedSource::new(vec![Ok(torn), Ok(VALID.into())]);
        let reader = StatusReader::new(source, fast_policy());

        let snapshot = reader.read().await.unwrap();
        assert_eq!(snapshot.body_name.as_deref(), Some("Sol 3"));
        assert_eq!(reader.source.count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_utf8_on_disk_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Status.json");
        std::fs::write(&path, b"{ \"BodyName\": \"\xC5\" }").unwrap();

        let reader = StatusReader::new(FileStatusSource::new(&path), fast_policy());
        let err = reader.read().await.unwrap_err();
        assert!(matches!(err, Error::StatusCorrupt { attempts: 3, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_missing_file_fails_without_retry() {
        let source = ScriptedSource::new(vec![Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ))]);
        let reader = StatusReader::new(source, fast_policy());

        let err = reader.read().await.unwrap_err();
        assert!(matches!(err, Error::StatusRead { .. }));
        assert_eq!(reader.source.count(), 1);
    }

    #[tokio::test]
    async fn test_wrong_shape_fails_without_retry() {
        let source = ScriptedSource::new(vec![Ok(r#"{ "Flags": "docked" }"#.into())]);
        let reader = StatusReader::new(source, fast_policy());

        let err = reader.read().await.unwrap_err();
        assert!(matches!(err, Error::StatusSchema { .. }));
        assert_eq!(reader.source.count(), 1);
    }

    #[tokio::test]
    async fn test_missing_flags_default_to_zero() {
        let source = ScriptedSource::new(vec![Ok(r#"{ "event": "Status" }"#.into())]);
        let reader = StatusReader::new(source, fast_policy());

        let snapshot = reader.read().await.unwrap();
        assert_eq!(snapshot, StatusSnapshot::default());
    }

    #[tokio::test]
    async fn test_on_foot_fields() {
        let doc = r#"{ "Flags": 0, "Flags2": 17, "Oxygen": 1.0, "Health": 0.9,
            "Temperature": 293.5, "Gravity": 0.98, "BodyName": "Sol 3" }"#;
        let reader = StatusReader::new(ScriptedSource::new(vec![Ok(doc.into())]), fast_policy());

        let snapshot = reader.read().await.unwrap();
        assert_eq!(snapshot.flags2, 17);
        assert_eq!(snapshot.oxygen, Some(1.0));
        assert_eq!(snapshot.health, Some(0.9));
        assert_eq!(snapshot.temperature, Some(293.5));
        assert_eq!(snapshot.gravity, Some(0.98));
    }

    #[tokio::test]
    async fn test_file_source_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Status.json");
        std::fs::write(&path, VALID).unwrap();

        let reader = StatusReader::new(FileStatusSource::new(&path), fast_policy());
        let snapshot = reader.read().await.unwrap();
        assert_eq!(snapshot.planet_radius, Some(6_371_000.0));
    }

    #[test]
    fn test_from_config_uses_policy() {
        let mut config = Config::default();
        config.status.read_attempts = 5;
        config.status.retry_delay_ms = 20;

        let reader = StatusReader::from_config(&config);
        assert_eq!(
            reader.policy(),
            RetryPolicy {
                attempts: 5,
                delay: Duration::from_millis(20),
            }
        );
    }
}
