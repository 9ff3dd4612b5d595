//! Configuration management for captainslog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name.
const APP_DIR_NAME: &str = "captainslog";

/// Where the game keeps its data, relative to the platform base directories.
const GAME_DIR: [&str; 2] = ["Frontier Developments", "Elite Dangerous"];

/// Name of the game's status file inside the journal directory.
const STATUS_FILE_NAME: &str = "Status.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CAPTAINSLOG_`, sections split on `__`)
/// 2. TOML config file at `~/.config/captainslog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input locations.
    pub paths: PathsConfig,
    /// Monitor loop configuration.
    pub monitor: MonitorConfig,
    /// Status file reading configuration.
    pub status: StatusConfig,
    /// Output image configuration.
    pub image: ImageConfig,
    /// Text overlay configuration.
    pub overlay: OverlayConfig,
}

/// Input locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory the game saves screenshots to.
    /// Defaults to `~/Pictures/Frontier Developments/Elite Dangerous`
    pub screenshots_dir: Option<PathBuf>,
    /// Directory holding `Journal.*.log` files.
    /// Defaults to `~/Saved Games/Frontier Developments/Elite Dangerous`
    pub journal_dir: Option<PathBuf>,
    /// Path to the status file.
    /// Defaults to `Status.json` inside the journal directory.
    pub status_file: Option<PathBuf>,
    /// Extension of raw screenshots, without the dot.
    pub screenshot_extension: String,
}

/// Monitor loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between checks for a new screenshot.
    pub poll_interval_secs: u64,
    /// Maximum age in minutes of a pre-existing screenshot processed at startup.
    pub freshness_minutes: u64,
    /// Process the newest screenshot at startup if it is fresh.
    pub process_latest_on_start: bool,
    /// Produce annotated images (sidecars are always written).
    pub process_images: bool,
    /// Ring the terminal bell after a screenshot is processed.
    pub beep: bool,
}

/// Status file reading configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Number of read attempts before giving up on a malformed file.
    pub read_attempts: u32,
    /// Delay between attempts in milliseconds.
    pub retry_delay_ms: u64,
}

/// Output image configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Integer divisor applied to both axes.
    pub scale_divisor: u32,
    /// Resampling filter used for the downscale.
    pub resample: ResampleFilter,
    /// Output container format.
    pub format: SaveFormat,
    /// JPEG quality (1-100), ignored for PNG.
    pub jpeg_quality: u8,
    /// Move the raw screenshot to the trash once the output is written.
    pub delete_source: bool,
}

/// Text overlay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Draw the overlay text onto the image.
    pub draw_text: bool,
    /// Draw a background box behind the text.
    pub draw_background: bool,
    /// Corner the text is anchored to.
    pub position: TextPosition,
    /// Distance in pixels between text, box edge and image edge.
    pub margin: u32,
    /// Font size in pixels.
    pub font_size: f32,
    /// TrueType/OpenType font to use; well-known system fonts are tried when unset.
    pub font_path: Option<PathBuf>,
    /// Text fill color.
    pub font_color: [u8; 3],
    /// Color of the 1px outline around glyphs.
    pub stroke_color: [u8; 3],
    /// Background box color.
    pub background_color: [u8; 3],
    /// Background box opacity, 0 (transparent) to 255 (solid).
    pub background_opacity: u8,
}

/// Resampling filter for the downscale.
///
/// `box` averages each `scale_divisor`-sized block of source pixels, which is
/// exact for the integer ratios used here. A Hamming window is not offered;
/// `bilinear` is the nearest substitute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    /// Nearest neighbour.
    Nearest,
    /// Block average.
    Box,
    /// Linear (triangle) filter.
    Bilinear,
    /// Cubic (Catmull-Rom) filter.
    #[default]
    Bicubic,
    /// Gaussian filter.
    Gaussian,
    /// Lanczos with window 3.
    Lanczos,
}

impl ResampleFilter {
    /// The matching `image` filter, or `None` for [`ResampleFilter::Box`],
    /// which `image` has no filter for.
    #[must_use]
    pub fn filter_type(self) -> Option<image::imageops::FilterType> {
        use image::imageops::FilterType;

        match self {
            Self::Nearest => Some(FilterType::Nearest),
            Self::Box => None,
            Self::Bilinear => Some(FilterType::Triangle),
            Self::Bicubic => Some(FilterType::CatmullRom),
            Self::Gaussian => Some(FilterType::Gaussian),
            Self::Lanczos => Some(FilterType::Lanczos3),
        }
    }
}

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Lossy JPEG.
    Jpeg,
}

impl SaveFormat {
    /// File extension for this format, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Whether `ext` names this format, ignoring case.
    #[must_use]
    pub fn matches_extension(self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        match self {
            Self::Png => ext == "png",
            Self::Jpeg => ext == "jpg" || ext == "jpeg",
        }
    }
}

/// Image corner the overlay text is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextPosition {
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-right corner.
    BottomRight,
    /// Bottom-left corner.
    #[default]
    BottomLeft,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            screenshots_dir: None, // Resolved at runtime
            journal_dir: None,
            status_file: None,
            screenshot_extension: "bmp".to_string(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            freshness_minutes: 15,
            process_latest_on_start: true,
            process_images: true,
            beep: true,
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            read_attempts: 3,
            retry_delay_ms: 500,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            scale_divisor: 4,
            resample: ResampleFilter::default(),
            format: SaveFormat::default(),
            jpeg_quality: 90,
            delete_source: true,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            draw_text: true,
            draw_background: true,
            position: TextPosition::default(),
            margin: 15,
            font_size: 20.0,
            font_path: None,
            font_color: [255, 255, 255],
            stroke_color: [0, 0, 0],
            background_color: [0, 0, 0],
            background_opacity: 160,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("CAPTAINSLOG_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.image.scale_divisor == 0 {
            return Err(Error::config_validation(
                "scale_divisor must be greater than 0",
            ));
        }

        if !(1..=100).contains(&self.image.jpeg_quality) {
            return Err(Error::config_validation(format!(
                "jpeg_quality ({}) must be between 1 and 100",
                self.image.jpeg_quality
            )));
        }

        if self.status.read_attempts == 0 {
            return Err(Error::config_validation(
                "read_attempts must be greater than 0",
            ));
        }

        if self.monitor.poll_interval_secs == 0 {
            return Err(Error::config_validation(
                "poll_interval_secs must be greater than 0",
            ));
        }

        if !(self.overlay.font_size > 0.0) {
            return Err(Error::config_validation(format!(
                "font_size ({}) must be positive",
                self.overlay.font_size
            )));
        }

        if self.paths.screenshot_extension.trim_start_matches('.').is_empty() {
            return Err(Error::config_validation(
                "screenshot_extension must not be empty",
            ));
        }

        if self.image.format.matches_extension(self.screenshot_extension()) {
            return Err(Error::config_validation(format!(
                "screenshot_extension ({}) must differ from the output format",
                self.screenshot_extension()
            )));
        }

        Ok(())
    }

    /// Verify that every input location exists.
    ///
    /// Run once at startup, before any processing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPath`] for the first location that is absent.
    pub fn check_paths(&self) -> Result<()> {
        let screenshots = self.screenshots_dir();
        if !screenshots.is_dir() {
            return Err(Error::MissingPath {
                what: "screenshot directory",
                path: screenshots,
            });
        }

        let journal = self.journal_dir();
        if !journal.is_dir() {
            return Err(Error::MissingPath {
                what: "journal directory",
                path: journal,
            });
        }

        let status = self.status_file();
        if !status.is_file() {
            return Err(Error::MissingPath {
                what: "status file",
                path: status,
            });
        }

        Ok(())
    }

    /// Get the screenshot directory, resolving defaults if not set.
    #[must_use]
    pub fn screenshots_dir(&self) -> PathBuf {
        self.paths.screenshots_dir.clone().unwrap_or_else(|| {
            let base = dirs::picture_dir()
                .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
                .unwrap_or_else(|| PathBuf::from("Pictures"));
            game_dir(&base)
        })
    }

    /// Get the journal directory, resolving defaults if not set.
    #[must_use]
    pub fn journal_dir(&self) -> PathBuf {
        self.paths.journal_dir.clone().unwrap_or_else(|| {
            let base = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Saved Games");
            game_dir(&base)
        })
    }

    /// Get the status file path, resolving defaults if not set.
    #[must_use]
    pub fn status_file(&self) -> PathBuf {
        self.paths
            .status_file
            .clone()
            .unwrap_or_else(|| self.journal_dir().join(STATUS_FILE_NAME))
    }

    /// Screenshot extension without a leading dot.
    #[must_use]
    pub fn screenshot_extension(&self) -> &str {
        self.paths.screenshot_extension.trim_start_matches('.')
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.poll_interval_secs)
    }

    /// Get the freshness window as a Duration.
    #[must_use]
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.monitor.freshness_minutes * 60)
    }

    /// Get the status retry delay as a Duration.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.status.retry_delay_ms)
    }
}

fn game_dir(base: &Path) -> PathBuf {
    GAME_DIR.iter().fold(base.to_path_buf(), |dir, part| dir.join(part))
}
