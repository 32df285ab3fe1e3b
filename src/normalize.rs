//! Image normalization: arbitrary input to the canonical stored form.
//!
//! Every ingested image is decoded, resized onto a fixed 720×1280 canvas and
//! re-encoded as lossless WebP wrapped in a data URI.

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use clap::ValueEnum;
use image::codecs::webp::WebPEncoder;
use image::error::{DecodingError, ImageFormatHint};
use image::{DynamicImage, ExtendedColorType, ImageError, ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{FrameError, Result};
use crate::record::{DATA_URI_PREFIX, ImageRecord};

/// Canonical canvas width in pixels.
pub const CANVAS_WIDTH: u32 = 720;

/// Canonical canvas height in pixels.
pub const CANVAS_HEIGHT: u32 = 1280;

/// Strategy for mapping a source image onto the canvas.
///
/// Both strategies cover the whole canvas; neither leaves bars.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeStrategy {
    /// Stretch to fill (may distort).
    #[default]
    Stretch,
    /// Fill canvas, maintain aspect ratio (may crop).
    Fill,
}

/// Hands out record ids.
///
/// Ids are the current time in milliseconds, bumped past the last id handed
/// out (or observed) so that two images normalized within the same
/// millisecond still get distinct, increasing ids.
#[derive(Debug, Default)]
pub struct IdAllocator {
    last: AtomicI64,
}

impl IdAllocator {
    /// Create an allocator with no floor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id based on the wall clock.
    pub fn next_id(&self) -> i64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    /// Next id given the current time in milliseconds.
    pub fn next_at(&self, now_millis: i64) -> i64 {
        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now_millis.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }

    /// Raise the floor so later ids are greater than `id`.
    pub fn observe(&self, id: i64) {
        self.last.fetch_max(id, Ordering::SeqCst);
    }

    /// The highest id handed out or observed so far.
    pub fn last(&self) -> i64 {
        self.last.load(Ordering::SeqCst)
    }
}

/// Converts source images into canonical [`ImageRecord`]s.
#[derive(Debug)]
pub struct ImageNormalizer {
    strategy: ResizeStrategy,
    ids: IdAllocator,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageNormalizer {
    /// Normalizer for the canonical 720×1280 canvas with the stretch strategy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategy: ResizeStrategy::default(),
            ids: IdAllocator::new(),
        }
    }

    /// Use a different resize strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: ResizeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Canvas dimensions as `(width, height)`. Always the canonical size.
    pub const fn canvas(&self) -> (u32, u32) {
        (CANVAS_WIDTH, CANVAS_HEIGHT)
    }

    pub const fn strategy(&self) -> ResizeStrategy {
        self.strategy
    }

    /// The id allocator, shared with the gallery to seed its floor.
    pub const fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Normalize raw image bytes (an uploaded file or pasted clipboard data).
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Decode`] if the bytes are not a decodable image.
    #[instrument(skip_all, fields(len = bytes.len()))]
    pub fn normalize(&self, bytes: &[u8]) -> Result<ImageRecord> {
        let source = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()
            .map_err(FrameError::Decode)?;

        debug!(
            width = source.width(),
            height = source.height(),
            strategy = ?self.strategy,
            "Decoded source image"
        );

        let canvas = resize_to_canvas(&source, self.strategy);
        let encoded_image = encode_canonical(&canvas)?;

        // The id is taken at encoding time, after the expensive work.
        let id = self.ids.next_id();
        debug!(id, bytes = encoded_image.len(), "Image normalized");
        Ok(ImageRecord { id, encoded_image })
    }

    /// Read and normalize an image file.
    pub fn normalize_file(&self, path: &Path) -> Result<ImageRecord> {
        if !path.exists() {
            return Err(FrameError::ImageNotFound {
                path: path.display().to_string(),
            });
        }
        let bytes = std::fs::read(path)?;
        self.normalize(&bytes)
    }
}

/// Resize `img` onto the canonical canvas according to `strategy`.
pub fn resize_to_canvas(img: &DynamicImage, strategy: ResizeStrategy) -> DynamicImage {
    let filter = image::imageops::FilterType::Lanczos3;

    match strategy {
        // resize_exact() ignores aspect ratio
        ResizeStrategy::Stretch => img.resize_exact(CANVAS_WIDTH, CANVAS_HEIGHT, filter),
        // resize_to_fill() maintains aspect ratio and fills bounds (cropping)
        ResizeStrategy::Fill => img.resize_to_fill(CANVAS_WIDTH, CANVAS_HEIGHT, filter),
    }
}

/// Encode an image as a lossless WebP data URI.
pub fn encode_canonical(img: &DynamicImage) -> Result<String> {
    let rgba = img.to_rgba8();
    let mut webp = Vec::new();
    WebPEncoder::new_lossless(&mut webp)
        .encode(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| FrameError::Encode(e.to_string()))?;

    let mut uri = String::with_capacity(DATA_URI_PREFIX.len() + webp.len() * 4 / 3 + 4);
    uri.push_str(DATA_URI_PREFIX);
    STANDARD.encode_string(&webp, &mut uri);
    Ok(uri)
}

/// The raw WebP bytes carried by a record.
pub fn decode_payload(record: &ImageRecord) -> Result<Vec<u8>> {
    let payload = record
        .payload()
        .ok_or_else(|| webp_decode_error("payload is not a WebP data URI"))?;
    STANDARD.decode(payload).map_err(webp_decode_error)
}

/// Decode a stored record back into pixels.
pub fn decode_record(record: &ImageRecord) -> Result<DynamicImage> {
    let bytes = decode_payload(record)?;
    image::load_from_memory_with_format(&bytes, ImageFormat::WebP).map_err(FrameError::Decode)
}

fn webp_decode_error<E>(err: E) -> FrameError
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    FrameError::Decode(ImageError::Decoding(DecodingError::new(
        ImageFormatHint::Exact(ImageFormat::WebP),
        err,
    )))
}
