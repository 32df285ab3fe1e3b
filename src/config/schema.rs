//! Configuration file schema.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{FrameError, Result};
use crate::normalize::{ImageNormalizer, ResizeStrategy};

/// Default time between rotation ticks.
pub const DEFAULT_INTERVAL_MS: u64 = 5000;

/// Slot ids used when the config names none: one primary and six side slots.
pub const DEFAULT_SLOTS: [&str; 7] = [
    "main", "side-1", "side-2", "side-3", "side-4", "side-5", "side-6",
];

/// Top-level photo frame configuration.
///
/// # Example TOML
///
/// ```toml
/// database = "~/photos/gallery.db"
/// interval_ms = 8000
/// slots = ["main", "left", "right"]
/// output_dir = "/run/photo-frame"
///
/// [canvas]
/// strategy = "fill"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Gallery database file. Defaults to the per-user data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Milliseconds between rotation ticks.
    pub interval_ms: u64,

    /// Display slot ids, primary first.
    pub slots: Vec<String>,

    pub canvas: CanvasConfig,

    /// Where `pf run` and `pf show` write slot files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// How often `pf run` re-reads the database for changes made elsewhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_interval_ms: Option<u64>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            database: None,
            interval_ms: DEFAULT_INTERVAL_MS,
            slots: DEFAULT_SLOTS.iter().map(ToString::to_string).collect(),
            canvas: CanvasConfig::default(),
            output_dir: None,
            reload_interval_ms: None,
        }
    }
}

/// How ingested images are mapped onto the fixed 720×1280 canvas.
///
/// The canvas size itself is not configurable; every stored record has the
/// same dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub strategy: ResizeStrategy,
}

impl FrameConfig {
    /// Check the configuration for values the frame cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ConfigInvalid`] for an empty or duplicated slot
    /// list or a zero interval.
    pub fn validate(&self) -> Result<()> {
        trace!("Validating frame config");

        if self.slots.is_empty() {
            return Err(FrameError::ConfigInvalid(
                "at least one display slot is required".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.slots.len());
        for slot in &self.slots {
            if slot.trim().is_empty() {
                return Err(FrameError::ConfigInvalid(
                    "slot ids must not be blank".to_string(),
                ));
            }
            if !seen.insert(slot.as_str()) {
                return Err(FrameError::ConfigInvalid(format!(
                    "duplicate slot id '{slot}'"
                )));
            }
        }

        if self.interval_ms == 0 {
            return Err(FrameError::ConfigInvalid(
                "interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.reload_interval_ms == Some(0) {
            return Err(FrameError::ConfigInvalid(
                "reload_interval_ms must be greater than 0".to_string(),
            ));
        }
        debug!(slots = self.slots.len(), "Frame config validated");
        Ok(())
    }

    /// Rotation tick interval.
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Database reload interval for long-running rotation, if enabled.
    pub fn reload_interval(&self) -> Option<Duration> {
        self.reload_interval_ms.map(Duration::from_millis)
    }

    /// A normalizer using this config's resize strategy.
    pub fn normalizer(&self) -> ImageNormalizer {
        ImageNormalizer::new().with_strategy(self.canvas.strategy)
    }

    /// The primary slot id.
    pub fn primary_slot(&self) -> Option<&str> {
        self.slots.first().map(String::as_str)
    }
}
