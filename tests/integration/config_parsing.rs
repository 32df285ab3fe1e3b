//! Integration tests for configuration file parsing.

use std::path::PathBuf;
use std::time::Duration;

use pf::config::{FrameConfig, load_config, load_or_default, save_config};
use pf::error::FrameError;
use image::GenericImageView;
use pf::normalize::{CANVAS_HEIGHT, CANVAS_WIDTH, ResizeStrategy, decode_record};
use tempfile::TempDir;

use crate::common::fixtures::png_bytes;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_full_toml() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "frame.toml",
        r#"
database = "gallery.db"
interval_ms = 2500
slots = ["main", "left", "right"]
output_dir = "out"
reload_interval_ms = 60000

[canvas]
strategy = "fill"
"#,
    );

    let config = load_config(&path).unwrap();
    let base = dir.path().canonicalize().unwrap();

    assert_eq!(config.database, Some(base.join("gallery.db")));
    assert_eq!(config.output_dir, Some(base.join("out")));
    assert_eq!(config.interval(), Duration::from_millis(2500));
    assert_eq!(config.reload_interval(), Some(Duration::from_secs(60)));
    assert_eq!(config.primary_slot(), Some("main"));
    assert_eq!(config.canvas.strategy, ResizeStrategy::Fill);
    assert_eq!(config.normalizer().strategy(), ResizeStrategy::Fill);
}

#[test]
fn test_config_cannot_change_stored_canvas() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "frame.toml", "[canvas]\nwidth = 100\nheight = 100\n");
    assert!(matches!(load_config(&path), Err(FrameError::ConfigParse(_))));

    // Whatever strategy is configured, records land on the canonical canvas.
    let path = write(&dir, "fill.toml", "[canvas]\nstrategy = \"fill\"\n");
    let config = load_config(&path).unwrap();
    let record = config.normalizer().normalize(&png_bytes(100, 50, [9, 9, 9])).unwrap();
    let img = decode_record(&record).unwrap();
    assert_eq!(img.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
}

#[test]
fn test_yaml_with_home_path() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "frame.yml",
        "database: ~/frame/gallery.db\nslots: [hero]\n",
    );

    let config = load_config(&path).unwrap();
    let home = dirs::home_dir().unwrap();
    assert_eq!(config.database, Some(home.join("frame/gallery.db")));
    assert_eq!(config.slots, vec!["hero"]);
}

#[test]
fn test_bad_files() {
    let dir = TempDir::new().unwrap();

    let unknown = write(&dir, "frame.ini", "interval_ms = 1");
    assert!(matches!(load_config(&unknown), Err(FrameError::ConfigParse(_))));

    let broken = write(&dir, "broken.toml", "slots = [\"main\"");
    assert!(matches!(load_config(&broken), Err(FrameError::ConfigParse(_))));

    let invalid = write(&dir, "dup.yaml", "slots: [a, b, a]\n");
    assert!(matches!(load_config(&invalid), Err(FrameError::ConfigInvalid(_))));

    let missing = dir.path().join("missing.toml");
    assert!(matches!(
        load_or_default(Some(&missing)),
        Err(FrameError::ConfigNotFound { .. })
    ));
}

#[test]
fn test_saved_defaults_load_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    save_config(&FrameConfig::default(), &path).unwrap();
    let loaded = load_or_default(Some(&path)).unwrap();

    assert_eq!(loaded.source, Some(path));
    assert_eq!(loaded.config, FrameConfig::default());
}
