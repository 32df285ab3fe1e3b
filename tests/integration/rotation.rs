//! Integration tests for the rotation scheduler driven by a live gallery.

use std::sync::Arc;
use std::time::Duration;

use image::GenericImageView;
use pf::display::DirectoryRenderer;
use pf::display::mock::MockRenderer;
use pf::gallery::GalleryModel;
use pf::rotation::{RotationPhase, RotationScheduler};
use pf::store::SqliteImageStore;
use tempfile::TempDir;

use crate::common::fixtures::{canonical_record, stub_record};

const INTERVAL: Duration = Duration::from_millis(1000);

fn slots(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

async fn sqlite_gallery(dir: &TempDir, ids: &[i64]) -> GalleryModel<SqliteImageStore> {
    let mut gallery = GalleryModel::load(SqliteImageStore::open(dir.path().join("g.db")))
        .await
        .unwrap();
    for &id in ids {
        gallery.insert(stub_record(id)).await.unwrap();
    }
    gallery
}

#[tokio::test(start_paused = true)]
async fn test_primary_cycles_through_every_image() {
    let dir = TempDir::new().unwrap();
    let gallery = sqlite_gallery(&dir, &[1, 2, 3]).await;
    let renderer = Arc::new(MockRenderer::new());
    let scheduler = RotationScheduler::new(
        slots(&["main"]),
        INTERVAL,
        Arc::clone(&renderer),
        gallery.subscribe(),
    );

    assert_eq!(scheduler.start(), RotationPhase::Running);
    let mut shown = vec![renderer.current("main").flatten()];
    // Sample just after each tick.
    tokio::time::sleep(Duration::from_millis(1)).await;
    for _ in 0..5 {
        tokio::time::sleep(INTERVAL).await;
        shown.push(renderer.current("main").flatten());
    }

    assert_eq!(
        shown,
        vec![Some(3), Some(1), Some(2), Some(3), Some(1), Some(2)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_insert_during_rotation_is_picked_up() {
    let dir = TempDir::new().unwrap();
    let mut gallery = sqlite_gallery(&dir, &[10, 20]).await;
    let renderer = Arc::new(MockRenderer::new());
    let names = ["main", "side-1", "side-2"];
    let scheduler = RotationScheduler::new(
        slots(&names),
        INTERVAL,
        Arc::clone(&renderer),
        gallery.subscribe(),
    );

    scheduler.start();
    assert_eq!(renderer.showing(&names), vec![Some(20), Some(10), Some(20)]);

    gallery.insert(stub_record(30)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;
    // Position 1 is kept; the new image fills the last side slot.
    assert_eq!(renderer.showing(&names), vec![Some(20), Some(30), Some(10)]);

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(renderer.showing(&names), vec![Some(30), Some(10), Some(20)]);
}

#[tokio::test(start_paused = true)]
async fn test_gallery_emptied_then_restarted() {
    let dir = TempDir::new().unwrap();
    let mut gallery = sqlite_gallery(&dir, &[1]).await;
    let renderer = Arc::new(MockRenderer::new());
    let scheduler = RotationScheduler::new(
        slots(&["main", "side-1"]),
        INTERVAL,
        Arc::clone(&renderer),
        gallery.subscribe(),
    );

    scheduler.start();
    gallery.remove(1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(!scheduler.is_running());
    renderer.assert_slot_empty("main");
    renderer.assert_slot_empty("side-1");

    gallery.insert(stub_record(5)).await.unwrap();
    assert_eq!(scheduler.start(), RotationPhase::Running);
    renderer.assert_slot_shows("main", 5);
    renderer.assert_slot_shows("side-1", 5);
}

#[tokio::test(start_paused = true)]
async fn test_directory_renderer_writes_slot_files() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("frame");
    let mut gallery = GalleryModel::load(SqliteImageStore::open(dir.path().join("g.db")))
        .await
        .unwrap();
    gallery.insert(canonical_record(1)).await.unwrap();
    gallery.insert(canonical_record(2)).await.unwrap();

    let renderer = DirectoryRenderer::new(&out, ["main", "side-1", "side-2"]).unwrap();
    let scheduler = RotationScheduler::new(
        slots(&["main", "side-1", "side-2", "side-3"]),
        INTERVAL,
        renderer,
        gallery.subscribe(),
    );

    let frame = scheduler.reset();
    assert_eq!(frame.len(), 4);
    assert_eq!(frame[0].image_id, Some(2));

    for slot in ["main", "side-1", "side-2"] {
        let bytes = std::fs::read(out.join(format!("{slot}.webp"))).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.dimensions(), (6, 6));
    }
    // side-3 is not a known output slot; it is skipped, not fatal.
    assert!(!out.join("side-3.webp").exists());

    gallery.remove(1).await.unwrap();
    gallery.remove(2).await.unwrap();
    scheduler.render();
    assert!(!out.join("main.webp").exists());
}
