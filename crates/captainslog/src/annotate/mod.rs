//! Annotated, downscaled copies of screenshots.
//!
//! For every screenshot the annotator writes one derivative image next to the
//! original: downscaled, overlaid with the location text, re-encoded, and
//! carrying the same text as metadata. Once the derivative exists the original
//! can be moved to the trash.
//!
//! Nothing in here propagates per-screenshot failures. [`Annotator::annotate`]
//! logs them and reports [`AnnotateOutcome::Failed`] so the caller can carry
//! on with the next screenshot.

pub mod encode;
pub mod overlay;
pub mod render;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::{debug, error, info, warn};

use crate::config::{ImageConfig, OverlayConfig, ResampleFilter, SaveFormat};
use crate::error::{Error, Result};
use crate::location::LocationSnapshot;
use crate::output::{write_new, WriteOutcome};

pub use encode::METADATA_KEY;
pub use overlay::{game_timestamp, overlay_text, planet_label, GAME_YEAR_OFFSET};

/// Removes a source screenshot once its derivative is safely written.
pub trait Discard {
    /// Discard the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file could not be removed.
    fn discard(&self, path: &Path) -> Result<()>;
}

/// Moves files to the platform trash so they can be restored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrashBin;

impl Discard for TrashBin {
    fn discard(&self, path: &Path) -> Result<()> {
        trash::delete(path).map_err(|e| Error::Trash {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// What happened to one screenshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotateOutcome {
    /// The annotated image was written.
    Written(PathBuf),
    /// The annotated image already existed; nothing was done.
    AlreadyExists(PathBuf),
    /// Annotation failed; the error has been logged.
    Failed,
}

impl AnnotateOutcome {
    /// Whether this call created the annotated image.
    #[must_use]
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Path of the annotated image for a screenshot.
#[must_use]
pub fn annotated_path(screenshot: &Path, format: SaveFormat) -> PathBuf {
    screenshot.with_extension(format.extension())
}

/// Produces annotated images.
#[derive(Debug, Clone)]
pub struct Annotator<D = TrashBin> {
    image: ImageConfig,
    overlay: OverlayConfig,
    discard: D,
}

impl Annotator<TrashBin> {
    /// Create an annotator that trashes source screenshots.
    #[must_use]
    pub fn new(image: ImageConfig, overlay: OverlayConfig) -> Self {
        Self::with_discard(image, overlay, TrashBin)
    }
}

impl<D: Discard> Annotator<D> {
    /// Create an annotator with a custom discard strategy.
    #[must_use]
    pub fn with_discard(image: ImageConfig, overlay: OverlayConfig, discard: D) -> Self {
        Self {
            image,
            overlay,
            discard,
        }
    }

    /// Where the annotated image for `screenshot` goes.
    #[must_use]
    pub fn target_for(&self, screenshot: &Path) -> PathBuf {
        annotated_path(screenshot, self.image.format)
    }

    /// Annotate `screenshot` using the current time for the overlay.
    pub fn annotate(&self, screenshot: &Path, snapshot: &LocationSnapshot) -> AnnotateOutcome {
        self.annotate_at(screenshot, snapshot, Utc::now())
    }

    /// Annotate `screenshot` with the overlay timestamp taken from `now`.
    pub fn annotate_at(
        &self,
        screenshot: &Path,
        snapshot: &LocationSnapshot,
        now: DateTime<Utc>,
    ) -> AnnotateOutcome {
        let target = self.target_for(screenshot);
        if target.exists() {
            debug!(target = %target.display(), "Annotated image already exists; skipping");
            return AnnotateOutcome::AlreadyExists(target);
        }

        match self.try_annotate(screenshot, &target, snapshot, now) {
            Ok(WriteOutcome::Written(path)) => AnnotateOutcome::Written(path),
            Ok(WriteOutcome::AlreadyExists(path)) => AnnotateOutcome::AlreadyExists(path),
            Err(e) => {
                error!(path = %screenshot.display(), error = %e, "Failed to annotate screenshot");
                AnnotateOutcome::Failed
            }
        }
    }

    fn try_annotate(
        &self,
        screenshot: &Path,
        target: &Path,
        snapshot: &LocationSnapshot,
        now: DateTime<Utc>,
    ) -> Result<WriteOutcome> {
        let source = image::open(screenshot)?;
        let mut canvas = downscale(source, self.image.scale_divisor, self.image.resample).to_rgba8();

        let text = overlay_text(snapshot, now);
        if self.overlay.draw_text {
            let font = render::load_font(self.overlay.font_path.as_deref())?;
            render::draw_overlay(&mut canvas, &font, &self.overlay, &text);
        }

        let bytes = encode::encode(&canvas, self.image.format, self.image.jpeg_quality, &text)?;
        let outcome = write_new(target, &bytes)?;
        if !outcome.is_written() {
            return Ok(outcome);
        }
        info!(
            target = %target.display(),
            width = canvas.width(),
            height = canvas.height(),
            "Saved annotated image"
        );

        if self.image.delete_source && screenshot.exists() {
            match self.discard.discard(screenshot) {
                Ok(()) => debug!(path = %screenshot.display(), "Moved source screenshot to trash"),
                Err(e) => warn!(path = %screenshot.display(), error = %e, "Could not remove source screenshot"),
            }
        }

        Ok(outcome)
    }
}

fn downscale(source: DynamicImage, divisor: u32, filter: ResampleFilter) -> DynamicImage {
    if divisor <= 1 {
        return source;
    }
    let width = (source.width() / divisor).max(1);
    let height = (source.height() / divisor).max(1);
    match filter.filter_type() {
        Some(filter) => source.resize_exact(width, height, filter),
        None => DynamicImage::ImageRgba8(box_average(&source.to_rgba8(), divisor, width, height)),
    }
}

/// Average each `divisor`-sized block of `source` into one pixel.
fn box_average(source: &RgbaImage, divisor: u32, width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let columns = x * divisor..((x + 1) * divisor).min(source.width());
        let rows = y * divisor..((y + 1) * divisor).min(source.height());

        let mut sum = [0u64; 4];
        let mut count = 0u64;
        for sy in rows {
            for sx in columns.clone() {
                for (acc, channel) in sum.iter_mut().zip(source.get_pixel(sx, sy).0) {
                    *acc += u64::from(channel);
                }
                count += 1;
            }
        }

        let count = count.max(1);
        Rgba(sum.map(|acc| u8::try_from((acc + count / 2) / count).unwrap_or(u8::MAX)))
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::TimeZone;
    use image::{Rgb, RgbImage};

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingDiscard {
        discarded: RefCell<Vec<PathBuf>>,
    }

    impl Discard for &RecordingDiscard {
        fn discard(&self, path: &Path) -> Result<()> {
            self.discarded.borrow_mut().push(path.to_path_buf());
            std::fs::remove_file(path)?;
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap()
    }

    fn snapshot() -> LocationSnapshot {
        LocationSnapshot {
            star_system: Some("Sol".to_string()),
            planet: Some("Sol 3".to_string()),
            ..LocationSnapshot::default()
        }
    }

    fn no_text() -> OverlayConfig {
        OverlayConfig {
            draw_text: false,
            ..OverlayConfig::default()
        }
    }

    fn screenshot(dir: &Path) -> PathBuf {
        let path = dir.join("Screenshot_0001.bmp");
        RgbImage::from_pixel(64, 36, Rgb([120, 60, 30]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_annotated_path() {
        assert_eq!(
            annotated_path(Path::new("/s/Shot.bmp"), SaveFormat::Png),
            PathBuf::from("/s/Shot.png")
        );
        assert_eq!(
            annotated_path(Path::new("/s/Shot.bmp"), SaveFormat::Jpeg),
            PathBuf::from("/s/Shot.jpg")
        );
    }

    #[test]
    fn test_downscale_by_divisor() {
        let source = DynamicImage::ImageRgb8(RgbImage::new(1920, 1080));
        let scaled = downscale(source, 4, ResampleFilter::default());
        assert_eq!((scaled.width(), scaled.height()), (480, 270));
    }

    #[test]
    fn test_downscale_never_collapses() {
        let source = DynamicImage::ImageRgb8(RgbImage::new(3, 2));
        let scaled = downscale(source, 4, ResampleFilter::default());
        assert_eq!((scaled.width(), scaled.height()), (1, 1));
    }

    #[test]
    fn test_box_downscale_averages_blocks() {
        // Each 2x2 block holds two black and two white pixels.
        let source = RgbaImage::from_fn(4, 2, |x, _| {
            if x % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });

        let scaled = downscale(DynamicImage::ImageRgba8(source), 2, ResampleFilter::Box).to_rgba8();

        assert_eq!(scaled.dimensions(), (2, 1));
        assert!(scaled.pixels().all(|p| *p == Rgba([128, 128, 128, 255])));
    }

    #[test]
    fn test_box_downscale_small_source() {
        let source = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let scaled = downscale(DynamicImage::ImageRgba8(source), 4, ResampleFilter::Box).to_rgba8();
        assert_eq!(scaled.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_annotate_writes_and_discards() {
        let dir = tempfile::tempdir().unwrap();
        let source = screenshot(dir.path());
        let discard = RecordingDiscard::default();
        let annotator = Annotator::with_discard(ImageConfig::default(), no_text(), &discard);

        let outcome = annotator.annotate_at(&source, &snapshot(), now());

        let target = dir.path().join("Screenshot_0001.png");
        assert_eq!(outcome, AnnotateOutcome::Written(target.clone()));
        let written = image::open(&target).unwrap();
        assert_eq!((written.width(), written.height()), (16, 9));
        assert_eq!(discard.discarded.borrow().as_slice(), &[source.clone()]);
        assert!(!source.exists());
    }

    #[test]
    fn test_annotate_embeds_overlay_text() {
        let dir = tempfile::tempdir().unwrap();
        let source = screenshot(dir.path());
        let discard = RecordingDiscard::default();
        let annotator = Annotator::with_discard(ImageConfig::default(), no_text(), &discard);

        annotator.annotate_at(&source, &snapshot(), now());

        let bytes = std::fs::read(dir.path().join("Screenshot_0001.png")).unwrap();
        let reader = png::Decoder::new(bytes.as_slice()).read_info().unwrap();
        let chunk = &reader.info().uncompressed_latin1_text[0];
        assert_eq!(chunk.keyword, METADATA_KEY);
        assert_eq!(chunk.text, "3310-05-01 18:30\nSYSTEM: SOL\nPLANET: 3");
    }

    #[test]
    fn test_annotate_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let source = screenshot(dir.path());
        let discard = RecordingDiscard::default();
        let annotator = Annotator::with_discard(ImageConfig::default(), no_text(), &discard);

        let first = annotator.annotate_at(&source, &snapshot(), now());
        let target = annotator.target_for(&source);
        let bytes = std::fs::read(&target).unwrap();
        let second = annotator.annotate_at(&source, &snapshot(), now());

        assert!(first.is_written());
        assert_eq!(second, AnnotateOutcome::AlreadyExists(target.clone()));
        assert_eq!(std::fs::read(&target).unwrap(), bytes);
        assert_eq!(discard.discarded.borrow().len(), 1);
    }

    #[test]
    fn test_annotate_keeps_source_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let source = screenshot(dir.path());
        let discard = RecordingDiscard::default();
        let image = ImageConfig {
            delete_source: false,
            format: SaveFormat::Jpeg,
            ..ImageConfig::default()
        };
        let annotator = Annotator::with_discard(image, no_text(), &discard);

        let outcome = annotator.annotate_at(&source, &snapshot(), now());

        assert_eq!(
            outcome,
            AnnotateOutcome::Written(dir.path().join("Screenshot_0001.jpg"))
        );
        assert!(source.exists());
        assert!(discard.discarded.borrow().is_empty());
    }

    #[test]
    fn test_annotate_missing_font_fails_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let source = screenshot(dir.path());
        let discard = RecordingDiscard::default();
        let overlay = OverlayConfig {
            font_path: Some(dir.path().join("missing.ttf")),
            ..OverlayConfig::default()
        };
        let annotator = Annotator::with_discard(ImageConfig::default(), overlay, &discard);

        let outcome = annotator.annotate_at(&source, &snapshot(), now());

        assert_eq!(outcome, AnnotateOutcome::Failed);
        assert!(!annotator.target_for(&source).exists());
        assert!(source.exists());
        assert!(discard.discarded.borrow().is_empty());
    }

    #[test]
    fn test_annotate_undecodable_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Screenshot_0002.bmp");
        std::fs::write(&source, b"not an image").unwrap();
        let discard = RecordingDiscard::default();
        let annotator = Annotator::with_discard(ImageConfig::default(), no_text(), &discard);

        assert_eq!(
            annotator.annotate_at(&source, &snapshot(), now()),
            AnnotateOutcome::Failed
        );
        assert!(source.exists());
    }
}
