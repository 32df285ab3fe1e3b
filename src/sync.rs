//! JSON export and import of the whole gallery.
//!
//! The document is a JSON array of `{"id": <integer>, "encodedImage": "<data URI>"}`
//! objects. Import is all-or-nothing: the document is fully validated before
//! the store is touched, and the store replaces its contents in a single
//! transaction.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::{FrameError, Result};
use crate::gallery::GalleryModel;
use crate::record::{DATA_URI_PREFIX, ImageRecord};
use crate::store::ImageStore;

/// Field name used on export.
const ENCODED_FIELD: &str = "encodedImage";
/// Older documents carry the payload under this name.
const LEGACY_ENCODED_FIELD: &str = "base64";

/// Serialize records as a pretty-printed document.
pub fn export_all(records: &[ImageRecord]) -> Result<String> {
    serde_json::to_string_pretty(records)
        .map_err(|e| FrameError::Other(format!("Failed to serialize gallery: {e}")))
}

/// Parse and validate a document.
///
/// # Errors
///
/// Returns [`FrameError::Validation`] naming the first offending element if
/// the text is not a JSON array, an element lacks an integer `id` or an
/// encoded image string with the WebP data URI prefix, or two elements share
/// an id.
pub fn import_all(document: &str) -> Result<Vec<ImageRecord>> {
    let value: Value = serde_json::from_str(document)
        .map_err(FrameError::malformed_document)?;

    let Value::Array(elements) = value else {
        return Err(FrameError::validation(format!(
            "expected a JSON array, found {}",
            kind_of(&value)
        )));
    };

    let mut seen = HashSet::with_capacity(elements.len());
    let mut records = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let record = parse_element(element)
            .map_err(|reason| FrameError::validation(format!("element {index}: {reason}")))?;

        if !seen.insert(record.id) {
            return Err(FrameError::validation(format!(
                "element {index}: duplicate id {}",
                record.id
            )));
        }
        records.push(record);
    }

    debug!(count = records.len(), "Document validated");
    Ok(records)
}

fn parse_element(element: &Value) -> std::result::Result<ImageRecord, String> {
    let Value::Object(fields) = element else {
        return Err(format!("expected an object, found {}", kind_of(element)));
    };

    let id = match fields.get("id") {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| format!("id {n} is not an integer"))?,
        Some(other) => return Err(format!("id must be an integer, found {}", kind_of(other))),
        None => return Err("missing id".to_string()),
    };

    let encoded = fields
        .get(ENCODED_FIELD)
        .or_else(|| fields.get(LEGACY_ENCODED_FIELD))
        .ok_or_else(|| format!("missing {ENCODED_FIELD}"))?;
    let Value::String(encoded) = encoded else {
        return Err(format!(
            "{ENCODED_FIELD} must be a string, found {}",
            kind_of(encoded)
        ));
    };

    let record = ImageRecord::new(id, encoded.as_str());
    if !record.has_canonical_prefix() {
        return Err(format!("{ENCODED_FIELD} must start with {DATA_URI_PREFIX}"));
    }
    Ok(record)
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Validate `document` and replace the gallery with its records.
///
/// Returns the number of imported records. On any error the gallery and its
/// store are unchanged.
#[instrument(skip_all, fields(len = document.len()))]
pub async fn import_into<S: ImageStore>(
    gallery: &mut GalleryModel<S>,
    document: &str,
) -> Result<usize> {
    let records = import_all(document)?;
    let count = records.len();
    gallery.replace_all(records).await?;
    info!(count, "Gallery imported");
    Ok(count)
}

/// Write the gallery document to `path`.
#[instrument(skip(records), fields(count = records.len()))]
pub async fn export_to_file(records: &[ImageRecord], path: &Path) -> Result<()> {
    let document = export_all(records)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, document).await?;
    info!(path = %path.display(), "Gallery exported");
    Ok(())
}

/// Read a document from `path` without validating it.
pub async fn read_document(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FrameError::Other(format!(
            "Import file not found: {}",
            path.display()
        ))),
        Err(e) => Err(e.into()),
    }
}
