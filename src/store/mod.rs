//! Durable image storage.
//!
//! The [`ImageStore`] trait abstracts over the SQLite-backed store used by the
//! CLI and the in-memory [`mock::MockStore`] used by tests.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.local/share/photo-frame/
//! └── gallery.db        # SQLite database, one `images` table keyed by id
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use pf::store::{ImageStore, SqliteImageStore};
//!
//! // Nothing touches the disk until the first operation.
//! let store = SqliteImageStore::open_default()?;
//! store.put(&record).await?;
//! let all = store.get_all().await?;
//! ```

mod db;
pub mod mock;

pub use db::{default_db_path, SqliteImageStore, StoreLocation, SCHEMA_VERSION};

use std::future::Future;

use crate::error::Result;
use crate::record::ImageRecord;

/// Keyed collection of [`ImageRecord`]s.
///
/// Every operation resolves only after the change is durable (or has failed);
/// callers that await each operation before issuing the next get their writes
/// applied in order.
pub trait ImageStore: Send + Sync {
    /// Insert or overwrite one record by id.
    fn put(&self, record: &ImageRecord) -> impl Future<Output = Result<()>> + Send;

    /// Replace the whole collection with `records`, all-or-nothing.
    ///
    /// Duplicate ids within `records` make the replacement fail and leave
    /// the previous contents untouched.
    fn put_all(&self, records: &[ImageRecord]) -> impl Future<Output = Result<()>> + Send;

    /// Every stored record, in no particular order.
    fn get_all(&self) -> impl Future<Output = Result<Vec<ImageRecord>>> + Send;

    /// Remove a record. Removing an absent id is not an error.
    fn delete(&self, id: i64) -> impl Future<Output = Result<()>> + Send;

    /// Number of stored records.
    fn count(&self) -> impl Future<Output = Result<usize>> + Send;
}
