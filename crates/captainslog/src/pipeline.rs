//! The per-screenshot pipeline: status, location, sidecar, annotated image.

use std::path::Path;

use tracing::info;

use crate::annotate::{AnnotateOutcome, Annotator, Discard, TrashBin};
use crate::config::Config;
use crate::error::Result;
use crate::location::{LocationAggregator, LocationSnapshot};
use crate::output::WriteOutcome;
use crate::sidecar::SidecarWriter;
use crate::status::{FileStatusSource, StatusReader, StatusSource};

/// What processing one screenshot produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    /// The location the screenshot was taken at.
    pub snapshot: LocationSnapshot,
    /// The sidecar write.
    pub sidecar: WriteOutcome,
    /// The annotated image, when image processing is enabled.
    pub image: Option<AnnotateOutcome>,
}

impl ProcessReport {
    /// Whether anything new was written for this screenshot.
    #[must_use]
    pub fn produced_output(&self) -> bool {
        self.sidecar.is_written() || self.image.as_ref().is_some_and(AnnotateOutcome::is_written)
    }
}

/// Runs every stage for one screenshot.
#[derive(Debug)]
pub struct Pipeline<S = FileStatusSource, D = TrashBin> {
    reader: StatusReader<S>,
    aggregator: LocationAggregator,
    sidecar: SidecarWriter,
    annotator: Option<Annotator<D>>,
}

impl Pipeline<FileStatusSource, TrashBin> {
    /// Build the pipeline described by `config`.
    ///
    /// Annotated images are produced only when `process_images` is set.
    #[must_use]
    pub fn from_config(config: &Config, process_images: bool) -> Self {
        let annotator = process_images
            .then(|| Annotator::new(config.image.clone(), config.overlay.clone()));
        Self::new(
            StatusReader::from_config(config),
            LocationAggregator::new(config.journal_dir()),
            annotator,
        )
    }
}

impl<S: StatusSource, D: Discard> Pipeline<S, D> {
    /// Assemble a pipeline from its stages.
    #[must_use]
    pub fn new(
        reader: StatusReader<S>,
        aggregator: LocationAggregator,
        annotator: Option<Annotator<D>>,
    ) -> Self {
        Self {
            reader,
            aggregator,
            sidecar: SidecarWriter::new(),
            annotator,
        }
    }

    /// Read the current location without writing anything.
    ///
    /// # Errors
    ///
    /// Returns the status reader's or the aggregator's error.
    pub async fn locate(&self) -> Result<LocationSnapshot> {
        let status = self.reader.read().await?;
        self.aggregator.aggregate(&status)
    }

    /// Process one screenshot.
    ///
    /// Annotation failures are logged and reported in the returned
    /// [`ProcessReport`]; they never surface as an error.
    ///
    /// # Errors
    ///
    /// Returns an error when no snapshot could be built (unreadable status,
    /// missing journal) or the sidecar could not be written.
    pub async fn process(&self, screenshot: &Path) -> Result<ProcessReport> {
        let snapshot = self.locate().await?;
        info!(
            path = %screenshot.display(),
            system = snapshot.star_system.as_deref().unwrap_or("-"),
            planet = snapshot.planet.as_deref().unwrap_or("-"),
            station = snapshot.station.as_deref().unwrap_or("-"),
            flags = %snapshot.decoded_flags,
            "Processing screenshot"
        );

        let sidecar = self.sidecar.write(screenshot, &snapshot)?;
        let image = self
            .annotator
            .as_ref()
            .map(|annotator| annotator.annotate(screenshot, &snapshot));

        Ok(ProcessReport {
            snapshot,
            sidecar,
            image,
        })
    }
}
