//! SQLite-backed image store.
//!
//! The connection is opened lazily on the first operation and shared by every
//! later one. Blocking SQLite calls run on tokio's blocking pool.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{Connection, params};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, trace};

use super::ImageStore;
use crate::error::{FrameError, Result};
use crate::record::ImageRecord;

/// Schema version stamped into `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// SQLite schema for image storage.
const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY,
    encoded_image TEXT NOT NULL
);
";

/// How long a writer waits on a database locked by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A database file; parent directories are created on first open.
    File(PathBuf),
    /// A private in-memory database (useful for testing).
    InMemory,
}

type SharedConnection = Arc<Mutex<Connection>>;

/// Image store persisted in a single SQLite table.
pub struct SqliteImageStore {
    location: StoreLocation,
    conn: OnceCell<SharedConnection>,
}

impl SqliteImageStore {
    /// Creates a store backed by the database file at `path`.
    ///
    /// The file is not touched until the first operation.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::with_location(StoreLocation::File(path.as_ref().to_path_buf()))
    }

    /// Creates a store at the standard location.
    ///
    /// Location: `~/.local/share/photo-frame/gallery.db`
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(default_db_path()?))
    }

    /// Creates a store backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self::with_location(StoreLocation::InMemory)
    }

    /// Creates a store for an explicit location.
    pub fn with_location(location: StoreLocation) -> Self {
        Self {
            location,
            conn: OnceCell::new(),
        }
    }

    /// The configured location.
    pub const fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// True once the first operation has opened the database.
    pub fn is_open(&self) -> bool {
        self.conn.initialized()
    }

    /// Returns the shared connection, opening it on first use.
    ///
    /// Concurrent first callers wait for the same open.
    async fn connection(&self) -> Result<SharedConnection> {
        let conn = self
            .conn
            .get_or_try_init(|| {
                let location = self.location.clone();
                async move {
                    let conn = tokio::task::spawn_blocking(move || open_connection(&location))
                        .await
                        .map_err(|e| {
                            FrameError::StorageUnavailable(format!("open task failed: {e}"))
                        })??;
                    Ok::<_, FrameError>(Arc::new(Mutex::new(conn)))
                }
            })
            .await?;
        Ok(Arc::clone(conn))
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.connection().await?;
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| {
                FrameError::StorageUnavailable("connection lock poisoned".to_string())
            })?;
            f(&mut guard)
        })
        .await
        .map_err(|e| FrameError::StorageUnavailable(format!("storage task failed: {e}")))?
    }
}

impl ImageStore for SqliteImageStore {
    #[instrument(skip_all, fields(id = record.id))]
    async fn put(&self, record: &ImageRecord) -> Result<()> {
        let record = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO images (id, encoded_image) VALUES (?1, ?2)",
                params![record.id, record.encoded_image],
            )
            .map_err(|e| FrameError::storage("store image", e))?;
            trace!(id = record.id, "Image stored");
            Ok(())
        })
        .await
    }

    #[instrument(skip_all, fields(count = records.len()))]
    async fn put_all(&self, records: &[ImageRecord]) -> Result<()> {
        let records = records.to_vec();
        self.with_conn(move |conn| {
            let tx = conn
                .transaction()
                .map_err(|e| FrameError::storage("start transaction", e))?;

            tx.execute("DELETE FROM images", [])
                .map_err(|e| FrameError::storage("clear images", e))?;

            {
                let mut stmt = tx
                    .prepare("INSERT INTO images (id, encoded_image) VALUES (?1, ?2)")
                    .map_err(|e| FrameError::storage("prepare insert", e))?;
                for record in &records {
                    stmt.execute(params![record.id, record.encoded_image])
                        .map_err(|e| FrameError::storage("insert image", e))?;
                }
            }

            // Dropping the transaction without committing rolls it back.
            tx.commit()
                .map_err(|e| FrameError::storage("commit transaction", e))?;

            info!(count = records.len(), "Image collection replaced");
            Ok(())
        })
        .await
    }

    #[instrument(skip_all)]
    async fn get_all(&self) -> Result<Vec<ImageRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, encoded_image FROM images")
                .map_err(|e| FrameError::storage("prepare query", e))?;

            let records = stmt
                .query_map([], |row| {
                    Ok(ImageRecord {
                        id: row.get(0)?,
                        encoded_image: row.get(1)?,
                    })
                })
                .map_err(|e| FrameError::storage("query images", e))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| FrameError::storage("read images", e))?;

            debug!(count = records.len(), "Loaded images");
            Ok(records)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<()> {
        self.with_conn(move |conn| {
            let deleted = conn
                .execute("DELETE FROM images WHERE id = ?1", params![id])
                .map_err(|e| FrameError::storage("delete image", e))?;

            if deleted > 0 {
                info!(id, "Image deleted");
            } else {
                debug!(id, "Image not found for deletion");
            }
            Ok(())
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))
                .map_err(|e| FrameError::storage("count images", e))?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
        .await
    }
}

/// Opens the database and brings its schema up to date.
fn open_connection(location: &StoreLocation) -> Result<Connection> {
    let conn = match location {
        StoreLocation::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| FrameError::StorageIo {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
            debug!(path = %path.display(), "Opening image database");
            Connection::open(path).map_err(|e| FrameError::storage("open database", e))?
        }
        StoreLocation::InMemory => Connection::open_in_memory()
            .map_err(|e| FrameError::storage("open in-memory database", e))?,
    };

    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| FrameError::storage("set busy timeout", e))?;
    init_schema(&conn)?;

    info!(?location, "Image database ready");
    Ok(conn)
}

/// Creates the `images` table if missing and stamps the schema version.
fn init_schema(conn: &Connection) -> Result<()> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| FrameError::storage("read schema version", e))?;

    if version > SCHEMA_VERSION {
        return Err(FrameError::StorageUnavailable(format!(
            "database schema version {version} is newer than supported version {SCHEMA_VERSION}"
        )));
    }

    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| FrameError::storage("initialize schema", e))?;

    if version < SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
            .map_err(|e| FrameError::storage("write schema version", e))?;
        info!(from = version, to = SCHEMA_VERSION, "Image database schema upgraded");
    }
    Ok(())
}

/// Returns the default database path.
///
/// Location: `~/.local/share/photo-frame/gallery.db`
pub fn default_db_path() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir().ok_or_else(|| {
        FrameError::ConfigInvalid("Could not determine local data directory".to_string())
    })?;
    Ok(data_dir.join("photo-frame").join("gallery.db"))
}
