//! Integration tests for the `SQLite` image store.

use pf::error::FrameError;
use pf::record::ImageRecord;
use pf::store::{ImageStore, SqliteImageStore};
use tempfile::TempDir;

use crate::common::fixtures::stub_record;
use crate::common::init_test_logging;

fn ids(records: &[ImageRecord]) -> Vec<i64> {
    let mut ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_contents_survive_reopen() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gallery.db");

    {
        let store = SqliteImageStore::open(&path);
        store.put(&stub_record(1)).await.unwrap();
        store.put(&stub_record(2)).await.unwrap();
        store.delete(1).await.unwrap();
    }

    let store = SqliteImageStore::open(&path);
    let records = store.get_all().await.unwrap();
    assert_eq!(ids(&records), vec![2]);
    assert_eq!(records[0], stub_record(2));
}

#[tokio::test]
async fn test_put_overwrites_payload() {
    let dir = TempDir::new().unwrap();
    let store = SqliteImageStore::open(dir.path().join("gallery.db"));

    store.put(&stub_record(5)).await.unwrap();
    let replacement = ImageRecord::new(5, "data:image/webp;base64,BBBB");
    store.put(&replacement).await.unwrap();

    assert_eq!(store.get_all().await.unwrap(), vec![replacement]);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_put_all_is_atomic() {
    let dir = TempDir::new().unwrap();
    let store = SqliteImageStore::open(dir.path().join("gallery.db"));
    store
        .put_all(&[stub_record(1), stub_record(2)])
        .await
        .unwrap();

    let err = store
        .put_all(&[stub_record(7), stub_record(8), stub_record(7)])
        .await
        .unwrap_err();
    assert!(matches!(err, FrameError::Storage { .. }));

    // The failed batch left the previous contents in place.
    assert_eq!(ids(&store.get_all().await.unwrap()), vec![1, 2]);
}

#[tokio::test]
async fn test_concurrent_writers_share_one_connection() {
    let dir = TempDir::new().unwrap();
    let store = std::sync::Arc::new(SqliteImageStore::open(dir.path().join("gallery.db")));

    let mut handles = Vec::new();
    for id in 0..16 {
        let store = std::sync::Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let record = stub_record(id);
            store.put(&record).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.count().await.unwrap(), 16);
}

#[tokio::test]
async fn test_unwritable_location_reports_storage_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let store = SqliteImageStore::open(blocker.join("gallery.db"));
    let err = store.get_all().await.unwrap_err();
    assert!(matches!(err, FrameError::StorageIo { .. }), "{err:?}");
    assert_eq!(err.code(), "storage_error");
    let source = std::error::Error::source(&err).expect("io error attached");
    assert!(source.is::<std::io::Error>());
    assert!(!store.is_open());
}
