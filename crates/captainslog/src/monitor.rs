//! Watching the screenshot directory.
//!
//! The monitor polls for the newest screenshot and runs the [`Pipeline`] once
//! for every screenshot it has not seen before. Every screenshot already on
//! disk when it starts is marked as seen; only the newest one may still be
//! processed, and only when it is recent enough.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{debug, error, info, warn};

use crate::annotate::{Discard, TrashBin};
use crate::config::Config;
use crate::error::Result;
use crate::notify::{self, Notifier};
use crate::pipeline::Pipeline;
use crate::status::{FileStatusSource, StatusSource};

/// A handle to stop a running monitor.
///
/// This is a lightweight, cloneable handle that can be used to stop the
/// monitor from another task.
#[derive(Debug, Clone, Default)]
pub struct MonitorHandle {
    stop_signal: Arc<AtomicBool>,
}

impl MonitorHandle {
    /// Create a new monitor handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the monitor to stop.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }
}

/// List the screenshots in `dir` with their modification times.
///
/// Only regular files whose extension matches `extension` (case-insensitive)
/// are included.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be listed.
pub fn list_screenshots(dir: &Path, extension: &str) -> Result<Vec<(SystemTime, PathBuf)>> {
    let mut screenshots = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if !matches {
            continue;
        }

        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }

        screenshots.push((metadata.modified()?, path));
    }

    Ok(screenshots)
}

/// Find the most recently modified screenshot in `dir`.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be listed.
pub fn latest_screenshot(dir: &Path, extension: &str) -> Result<Option<PathBuf>> {
    Ok(newest(list_screenshots(dir, extension)?))
}

fn newest(screenshots: Vec<(SystemTime, PathBuf)>) -> Option<PathBuf> {
    screenshots
        .into_iter()
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}

/// Whether `path` was modified within `window` of `now`.
///
/// Files that cannot be inspected are never fresh. A modification time in the
/// future counts as fresh.
#[must_use]
pub fn is_fresh(path: &Path, window: Duration, now: SystemTime) -> bool {
    let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) else {
        return false;
    };
    now.duration_since(modified)
        .map_or(true, |age| age <= window)
}

/// Monitor settings taken from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Directory polled for screenshots.
    pub screenshots_dir: PathBuf,
    /// Screenshot file extension, without the dot.
    pub extension: String,
    /// Delay between polls.
    pub poll_interval: Duration,
    /// Maximum age of the startup screenshot for it to be processed.
    pub freshness_window: Duration,
    /// Process the newest screenshot found at startup if it is fresh.
    pub process_latest_on_start: bool,
}

impl MonitorSettings {
    /// Extract the monitor settings from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            screenshots_dir: config.screenshots_dir(),
            extension: config.screenshot_extension().to_string(),
            poll_interval: config.poll_interval(),
            freshness_window: config.freshness_window(),
            process_latest_on_start: config.monitor.process_latest_on_start,
        }
    }
}

/// Polls the screenshot directory and processes new screenshots.
pub struct Monitor<S = FileStatusSource, D = TrashBin> {
    settings: MonitorSettings,
    pipeline: Pipeline<S, D>,
    notifier: Box<dyn Notifier>,
    known: HashSet<PathBuf>,
    handle: MonitorHandle,
}

impl<S, D> std::fmt::Debug for Monitor<S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("settings", &self.settings)
            .field("known", &self.known.len())
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Monitor<FileStatusSource, TrashBin> {
    /// Build a monitor from `config`.
    #[must_use]
    pub fn from_config(config: &Config, process_images: bool) -> Self {
        Self::new(
            MonitorSettings::from_config(config),
            Pipeline::from_config(config, process_images),
            notify::from_config(config.monitor.beep),
        )
    }
}

impl<S: StatusSource, D: Discard> Monitor<S, D> {
    /// Create a monitor around an assembled pipeline.
    #[must_use]
    pub fn new(settings: MonitorSettings, pipeline: Pipeline<S, D>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            settings,
            pipeline,
            notifier,
            known: HashSet::new(),
            handle: MonitorHandle::new(),
        }
    }

    /// Get a handle that can stop this monitor.
    #[must_use]
    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    /// Whether `path` has already been seen.
    #[must_use]
    pub fn is_known(&self, path: &Path) -> bool {
        self.known.contains(path)
    }

    /// Record every existing screenshot as known.
    ///
    /// The newest one is processed as well when startup processing is enabled
    /// and the screenshot is within the freshness window. Returns the
    /// screenshot if it was processed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the screenshot directory cannot be listed.
    pub async fn prime(&mut self, now: SystemTime) -> Result<Option<PathBuf>> {
        let existing = list_screenshots(&self.settings.screenshots_dir, &self.settings.extension)?;
        self.known.extend(existing.iter().map(|(_, path)| path.clone()));
        debug!(count = existing.len(), "Existing screenshots marked as seen");

        let Some(latest) = newest(existing) else {
            return Ok(None);
        };
        if !self.settings.process_latest_on_start {
            return Ok(None);
        }
        if !is_fresh(&latest, self.settings.freshness_window, now) {
            info!(path = %latest.display(), "Latest screenshot is too old; skipping");
            return Ok(None);
        }

        self.process(&latest).await;
        Ok(Some(latest))
    }

    /// Run one poll cycle.
    ///
    /// Returns the screenshot that was processed, if a new one was found.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the screenshot directory cannot be listed.
    pub async fn tick(&mut self) -> Result<Option<PathBuf>> {
        let Some(latest) = latest_screenshot(&self.settings.screenshots_dir, &self.settings.extension)?
        else {
            return Ok(None);
        };
        if !self.known.insert(latest.clone()) {
            return Ok(None);
        }

        info!(path = %latest.display(), "New screenshot");
        self.process(&latest).await;
        Ok(Some(latest))
    }

    /// Process one screenshot. Failures are logged and never propagate.
    async fn process(&self, screenshot: &Path) {
        match self.pipeline.process(screenshot).await {
            Ok(report) => {
                if report.produced_output() {
                    self.notifier.notify();
                }
            }
            Err(e) if e.is_transient() => {
                warn!(path = %screenshot.display(), error = %e, "No status available; skipping screenshot");
            }
            Err(e) => {
                error!(path = %screenshot.display(), error = %e, "Failed to process screenshot");
            }
        }
    }

    /// Poll until Ctrl+C or until the handle is stopped.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the screenshot directory cannot be listed at
    /// startup. Listing failures during polling are logged and retried on
    /// the next cycle.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Stopping"),
                Err(e) => {
                    warn!(error = %e, "Could not listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
    }

    /// Poll until `shutdown` completes or until the handle is stopped.
    ///
    /// `shutdown` is raced against both the wait between polls and the
    /// processing itself, so a stop request never waits for a screenshot to
    /// finish. Outputs are written whole or not at all, so abandoning one
    /// mid-way leaves nothing behind.
    ///
    /// # Errors
    ///
    /// Same as [`Monitor::run`].
    pub async fn run_until<F: Future<Output = ()>>(&mut self, shutdown: F) -> Result<()> {
        tokio::pin!(shutdown);
        info!(
            dir = %self.settings.screenshots_dir.display(),
            extension = %self.settings.extension,
            interval = ?self.settings.poll_interval,
            "Watching for screenshots"
        );

        tokio::select! {
            primed = self.prime(SystemTime::now()) => { primed?; }
            () = &mut shutdown => return Ok(()),
        }

        while !self.handle.should_stop() {
            tokio::select! {
                () = tokio::time::sleep(self.settings.poll_interval) => {}
                () = &mut shutdown => break,
            }
            if self.handle.should_stop() {
                break;
            }

            tokio::select! {
                ticked = self.tick() => {
                    if let Err(e) = ticked {
                        error!(
                            dir = %self.settings.screenshots_dir.display(),
                            error = %e,
                            "Failed to scan screenshot directory"
                        );
                    }
                }
                () = &mut shutdown => break,
            }
        }

        Ok(())
    }
}
