//! Mock renderer for unit testing.
//!
//! Records every frame the scheduler draws and supports assertions on what
//! each slot currently shows.
//!
//! # Example
//!
//! ```rust,ignore
//! use pf::display::mock::MockRenderer;
//!
//! let renderer = Arc::new(MockRenderer::new().with_missing_slot("side-3"));
//! // ... run a scheduler with Arc::clone(&renderer) ...
//! renderer.assert_slot_shows("main", 3);
//! renderer.assert_slot_empty("side-1");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use super::{SlotContent, SlotRenderer};
use crate::error::{FrameError, Result};

/// One recorded render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub slot: String,
    /// `None` for the empty placeholder.
    pub image_id: Option<i64>,
}

/// Renderer that remembers what it was asked to draw.
#[derive(Debug, Default)]
pub struct MockRenderer {
    frames: Mutex<Vec<RenderedFrame>>,
    current: Mutex<HashMap<String, Option<i64>>>,
    missing: HashSet<String>,
}

impl MockRenderer {
    /// Create a renderer that accepts every slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `slot` does not exist on the display.
    #[must_use]
    pub fn with_missing_slot(mut self, slot: impl Into<String>) -> Self {
        self.missing.insert(slot.into());
        self
    }

    /// All successful render calls in order.
    #[must_use]
    pub fn frames(&self) -> Vec<RenderedFrame> {
        self.frames_log().clone()
    }

    /// Number of successful render calls.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames_log().len()
    }

    /// Forget recorded frames (current slot contents are kept).
    pub fn clear_frames(&self) {
        self.frames_log().clear();
    }

    /// What `slot` shows: `None` if never rendered, `Some(None)` if empty.
    #[must_use]
    pub fn current(&self, slot: &str) -> Option<Option<i64>> {
        self.current_map().get(slot).copied()
    }

    /// Current image ids for `slots`, in order; empty or unrendered is `None`.
    #[must_use]
    pub fn showing(&self, slots: &[&str]) -> Vec<Option<i64>> {
        let current = self.current_map();
        slots
            .iter()
            .map(|slot| current.get(*slot).copied().flatten())
            .collect()
    }

    /// Assert `slot` currently shows image `id`.
    ///
    /// # Panics
    ///
    /// Panics if the slot shows something else.
    pub fn assert_slot_shows(&self, slot: &str, id: i64) {
        match self.current(slot) {
            Some(Some(shown)) if shown == id => {}
            other => panic!("Slot {slot} expected to show {id}, but has: {other:?}"),
        }
    }

    /// Assert `slot` currently shows the empty placeholder.
    ///
    /// # Panics
    ///
    /// Panics if the slot shows an image or was never rendered.
    pub fn assert_slot_empty(&self, slot: &str) {
        match self.current(slot) {
            Some(None) => {}
            other => panic!("Slot {slot} expected to be empty, but has: {other:?}"),
        }
    }

    fn frames_log(&self) -> MutexGuard<'_, Vec<RenderedFrame>> {
        self.frames.lock().expect("mock renderer frames poisoned")
    }

    fn current_map(&self) -> MutexGuard<'_, HashMap<String, Option<i64>>> {
        self.current.lock().expect("mock renderer state poisoned")
    }
}

impl SlotRenderer for MockRenderer {
    fn render_slot(&self, slot: &str, content: SlotContent<'_>) -> Result<()> {
        if self.missing.contains(slot) {
            return Err(FrameError::SlotNotFound {
                slot: slot.to_string(),
            });
        }

        let image_id = content.record().map(|r| r.id);
        trace!(slot, ?image_id, "Recording frame");
        self.frames_log().push(RenderedFrame {
            slot: slot.to_string(),
            image_id,
        });
        self.current_map().insert(slot.to_string(), image_id);
        Ok(())
    }
}
