//! End-to-end run over a scratch game directory.

use std::path::{Path, PathBuf};

use captainslog::annotate::{Annotator, Discard, METADATA_KEY};
use captainslog::config::{ImageConfig, OverlayConfig, SaveFormat};
use captainslog::status::{FileStatusSource, RetryPolicy, StatusReader};
use captainslog::{AnnotateOutcome, Config, LocationAggregator, Pipeline};
use image::{Rgb, RgbImage};

const STATUS: &str = r#"{ "timestamp":"2024-05-01T18:30:00Z", "event":"Status",
    "Flags":2097152, "Flags2":16, "Oxygen":1.0, "Health":1.0,
    "Temperature":293.5, "Gravity":0.98, "LegalState":"Clean",
    "Latitude":-12.5, "Longitude":101.25, "Heading":90, "Altitude":0,
    "BodyName":"Sol 3", "PlanetRadius":6371000.0 }"#;

const JOURNAL: &str = concat!(
    "{\"timestamp\":\"2024-05-01T18:00:00Z\",\"event\":\"Fileheader\",\"part\":1}\n",
    "{\"timestamp\":\"2024-05-01T18:01:00Z\",\"event\":\"Location\",\"StarSystem\":\"Achenar\",\"Body\":\"Achenar 2\"}\n",
    "{\"timestamp\":\"2024-05-01T18:05:00Z\",\"event\":\"FSDJump\",\"StarSystem\":\"Sol\"}\n",
    "this line is not json\n",
    "{\"timestamp\":\"2024-05-01T18:20:00Z\",\"event\":\"Touchdown\",\"Body\":\"Sol 3\"}\n",
);

struct Trashed(std::cell::RefCell<Vec<PathBuf>>);

impl Discard for &Trashed {
    fn discard(&self, path: &Path) -> captainslog::Result<()> {
        self.0.borrow_mut().push(path.to_path_buf());
        std::fs::remove_file(path)?;
        Ok(())
    }
}

struct Game {
    _dir: tempfile::TempDir,
    shots: PathBuf,
    journals: PathBuf,
}

fn game() -> Game {
    let dir = tempfile::tempdir().unwrap();
    let shots = dir.path().join("Screenshots");
    let journals = dir.path().join("Saved Games");
    std::fs::create_dir_all(&shots).unwrap();
    std::fs::create_dir_all(&journals).unwrap();
    std::fs::write(journals.join("Status.json"), STATUS).unwrap();
    std::fs::write(journals.join("Journal.2024-05-01T180000.01.log"), JOURNAL).unwrap();
    Game {
        _dir: dir,
        shots,
        journals,
    }
}

fn pipeline<'a>(game: &Game, image: ImageConfig, trash: &'a Trashed) -> Pipeline<FileStatusSource, &'a Trashed> {
    let overlay = OverlayConfig {
        draw_text: false,
        ..OverlayConfig::default()
    };
    Pipeline::new(
        StatusReader::new(
            FileStatusSource::new(game.journals.join("Status.json")),
            RetryPolicy::default(),
        ),
        LocationAggregator::new(&game.journals),
        Some(Annotator::with_discard(image, overlay, trash)),
    )
}

#[tokio::test]
async fn test_screenshot_becomes_sidecar_and_png() {
    let game = game();
    let screenshot = game.shots.join("Screenshot_0001.bmp");
    RgbImage::from_pixel(160, 90, Rgb([30, 60, 90]))
        .save(&screenshot)
        .unwrap();
    let trash = Trashed(std::cell::RefCell::new(Vec::new()));

    let report = pipeline(&game, ImageConfig::default(), &trash)
        .process(&screenshot)
        .await
        .unwrap();

    // Sidecar
    let sidecar: serde_json::Value =
        serde_json::from_slice(&std::fs::read(game.shots.join("Screenshot_0001.json")).unwrap())
            .unwrap();
    assert_eq!(sidecar["StarSystem"], "Sol");
    assert_eq!(sidecar["Planet"], "Sol 3");
    assert!(sidecar["Station"].is_null());
    assert_eq!(sidecar["Temperature"], 293.5);
    assert_eq!(sidecar["Flags2"], 16);
    assert_eq!(sidecar["DecFlags"], "Has Lat and Long | On Foot On Planet");

    // Annotated image
    let target = game.shots.join("Screenshot_0001.png");
    assert_eq!(report.image, Some(AnnotateOutcome::Written(target.clone())));
    let bytes = std::fs::read(&target).unwrap();
    let reader = png::Decoder::new(bytes.as_slice()).read_info().unwrap();
    assert_eq!((reader.info().width, reader.info().height), (40, 22));
    let chunk = &reader.info().uncompressed_latin1_text[0];
    assert_eq!(chunk.keyword, METADATA_KEY);
    assert!(chunk.text.contains("\nSYSTEM: SOL\nPLANET: 3\n"));
    assert!(chunk.text.contains("TEMP: 293.5 K"));
    assert!(chunk.text.ends_with("LAT: -12.5000 | LON: 101.2500 | ALT: 0 m"));

    // Source trashed after the write
    assert_eq!(trash.0.borrow().as_slice(), &[screenshot.clone()]);
    assert!(!screenshot.exists());
}

#[tokio::test]
async fn test_rerun_leaves_outputs_alone() {
    let game = game();
    let screenshot = game.shots.join("Screenshot_0002.bmp");
    RgbImage::from_pixel(80, 80, Rgb([0, 0, 0]))
        .save(&screenshot)
        .unwrap();
    let trash = Trashed(std::cell::RefCell::new(Vec::new()));
    let image = ImageConfig {
        format: SaveFormat::Jpeg,
        delete_source: false,
        ..ImageConfig::default()
    };
    let pipeline = pipeline(&game, image, &trash);

    let first = pipeline.process(&screenshot).await.unwrap();
    let sidecar = std::fs::read(game.shots.join("Screenshot_0002.json")).unwrap();
    let second = pipeline.process(&screenshot).await.unwrap();

    assert!(first.produced_output());
    assert!(!second.produced_output());
    assert_eq!(
        std::fs::read(game.shots.join("Screenshot_0002.json")).unwrap(),
        sidecar
    );
    assert!(game.shots.join("Screenshot_0002.jpg").exists());
    assert!(screenshot.exists());
    assert!(trash.0.borrow().is_empty());
}

#[test]
fn test_default_config_is_valid() {
    assert!(Config::default().validate().is_ok());
}
