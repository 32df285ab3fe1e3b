//! The durable unit of the gallery: one normalized image.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME type of the canonical encoding.
pub const CANONICAL_MIME: &str = "image/webp";

/// Data-URI prefix every stored payload starts with.
pub const DATA_URI_PREFIX: &str = "data:image/webp;base64,";

/// A stored image.
///
/// `id` is the creation time in milliseconds since the Unix epoch, which makes
/// ids unique in practice and naturally sortable by age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Primary key.
    pub id: i64,
    /// Canonical payload as a `data:image/webp;base64,...` URI.
    #[serde(rename = "encodedImage", alias = "base64")]
    pub encoded_image: String,
}

impl ImageRecord {
    /// Create a record from an id and an already-encoded payload.
    #[must_use]
    pub fn new(id: i64, encoded_image: impl Into<String>) -> Self {
        Self {
            id,
            encoded_image: encoded_image.into(),
        }
    }

    /// True if the payload carries the canonical data-URI prefix.
    #[must_use]
    pub fn has_canonical_prefix(&self) -> bool {
        self.encoded_image.starts_with(DATA_URI_PREFIX)
    }

    /// The base64 body of the payload, without the data-URI prefix.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.encoded_image.strip_prefix(DATA_URI_PREFIX)
    }

    /// Creation time derived from the id, if it is a plausible timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.id)
    }
}

/// Sort records ascending by id, the one order the gallery ever uses.
pub fn sort_by_id(records: &mut [ImageRecord]) {
    records.sort_unstable_by_key(|r| r.id);
}
