//! Adding new images to the gallery.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::{FrameError, Result};
use crate::gallery::GalleryModel;
use crate::normalize::ImageNormalizer;
use crate::record::ImageRecord;
use crate::store::ImageStore;

/// Normalize `bytes` and insert the result into the gallery.
///
/// Decoding and encoding run on a blocking thread. If normalization or the
/// store write fails, the gallery is unchanged.
#[instrument(skip_all, fields(len = bytes.len()))]
pub async fn ingest_bytes<S: ImageStore>(
    normalizer: &Arc<ImageNormalizer>,
    gallery: &mut GalleryModel<S>,
    bytes: Vec<u8>,
) -> Result<ImageRecord> {
    if let Some(max) = gallery.max_id() {
        normalizer.ids().observe(max);
    }

    let worker = Arc::clone(normalizer);
    let record = tokio::task::spawn_blocking(move || worker.normalize(&bytes))
        .await
        .map_err(|e| FrameError::Other(format!("Normalization task failed: {e}")))??;

    gallery.insert(record.clone()).await?;
    info!(id = record.id, total = gallery.len(), "Image added");
    Ok(record)
}

/// Read an image file and ingest it.
#[instrument(skip(normalizer, gallery))]
pub async fn ingest_file<S: ImageStore>(
    normalizer: &Arc<ImageNormalizer>,
    gallery: &mut GalleryModel<S>,
    path: &Path,
) -> Result<ImageRecord> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FrameError::ImageNotFound {
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    ingest_bytes(normalizer, gallery, bytes).await
}
