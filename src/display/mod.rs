//! Rendering seam between the rotation scheduler and whatever shows images.
//!
//! The scheduler only ever calls [`SlotRenderer::render_slot`] with a slot id
//! and either a record or the explicit empty placeholder.

mod directory;
pub mod mock;

pub use directory::DirectoryRenderer;

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::record::ImageRecord;

/// What a single slot should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotContent<'a> {
    /// Show this image.
    Image(&'a ImageRecord),
    /// Show the empty placeholder.
    Empty,
}

impl<'a> SlotContent<'a> {
    /// The record being shown, if any.
    pub const fn record(&self) -> Option<&'a ImageRecord> {
        match self {
            Self::Image(record) => Some(record),
            Self::Empty => None,
        }
    }

    /// Short caption, e.g. `Primary ID: 12`.
    pub fn describe(&self, primary: bool) -> String {
        match (self, primary) {
            (Self::Image(record), true) => format!("Primary ID: {}", record.id),
            (Self::Image(record), false) => format!("Side ID: {}", record.id),
            (Self::Empty, _) => "Empty".to_string(),
        }
    }
}

/// A display that can show one image per slot.
pub trait SlotRenderer: Send + Sync + 'static {
    /// Show `content` in `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::SlotNotFound`](crate::error::FrameError::SlotNotFound)
    /// if the display has no such slot, or any error from the output itself.
    fn render_slot(&self, slot: &str, content: SlotContent<'_>) -> Result<()>;
}

impl<R: SlotRenderer + ?Sized> SlotRenderer for Arc<R> {
    fn render_slot(&self, slot: &str, content: SlotContent<'_>) -> Result<()> {
        (**self).render_slot(slot, content)
    }
}

impl<R: SlotRenderer + ?Sized> SlotRenderer for Box<R> {
    fn render_slot(&self, slot: &str, content: SlotContent<'_>) -> Result<()> {
        (**self).render_slot(slot, content)
    }
}

/// Renderer that only logs what each slot would show.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRenderer;

impl SlotRenderer for LogRenderer {
    fn render_slot(&self, slot: &str, content: SlotContent<'_>) -> Result<()> {
        match content.record() {
            Some(record) => info!(slot, id = record.id, "Slot updated"),
            None => info!(slot, "Slot empty"),
        }
        Ok(())
    }
}
