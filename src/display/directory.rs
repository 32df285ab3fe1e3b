//! Renders slots as WebP files in a directory.
//!
//! Each slot `name` maps to `<dir>/<name>.webp`. A viewer (kiosk browser,
//! image viewer with auto-reload) watches the directory. Empty slots have no
//! file.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::{SlotContent, SlotRenderer};
use crate::error::{FrameError, Result};
use crate::normalize::decode_payload;

/// Slot renderer writing one file per slot.
#[derive(Debug)]
pub struct DirectoryRenderer {
    dir: PathBuf,
    slots: HashSet<String>,
}

impl DirectoryRenderer {
    /// Create a renderer for `slots`, creating `dir` if needed.
    pub fn new<I, S>(dir: impl Into<PathBuf>, slots: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            FrameError::Other(format!(
                "Failed to create output directory {}: {e}",
                dir.display()
            ))
        })?;
        debug!(dir = %dir.display(), "Directory renderer ready");
        Ok(Self {
            dir,
            slots: slots.into_iter().map(Into::into).collect(),
        })
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `slot`.
    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.webp"))
    }
}

impl SlotRenderer for DirectoryRenderer {
    fn render_slot(&self, slot: &str, content: SlotContent<'_>) -> Result<()> {
        if !self.slots.contains(slot) {
            return Err(FrameError::SlotNotFound {
                slot: slot.to_string(),
            });
        }

        let path = self.slot_path(slot);
        match content {
            SlotContent::Image(record) => {
                let bytes = decode_payload(record)?;
                // Write then rename so a viewer never reads a half-written file.
                let tmp = self.dir.join(format!(".{slot}.webp.tmp"));
                std::fs::write(&tmp, bytes)?;
                std::fs::rename(&tmp, &path)?;
                trace!(slot, id = record.id, "Slot file written");
            }
            SlotContent::Empty => match std::fs::remove_file(&path) {
                Ok(()) => trace!(slot, "Slot file removed"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}
