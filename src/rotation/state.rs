//! Cyclic slot assignment arithmetic.

use serde::Serialize;

/// Euclidean modulo: maps any `x` into `[0, total)`.
///
/// Returns 0 when `total` is 0, where no index is valid anyway.
pub fn wrap(x: i64, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let total = i64::try_from(total).unwrap_or(i64::MAX);
    // rem_euclid with a positive modulus is always in [0, total).
    usize::try_from(x.rem_euclid(total)).unwrap_or_default()
}

fn as_offset(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Which image the primary slot shows, relative to the gallery size.
///
/// Slot 0 shows `order[active_index]`; slot `i` shows
/// `order[wrap(active_index + i, total)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RotationState {
    pub active_index: usize,
    pub total: usize,
    /// Number of slots including the primary one.
    pub slot_count: usize,
}

impl RotationState {
    /// Initial state: the newest image (last in order) goes first.
    pub const fn starting(total: usize, slot_count: usize) -> Self {
        Self {
            active_index: total.saturating_sub(1),
            total,
            slot_count,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Move the primary slot one image forward within a gallery of `total`.
    #[must_use]
    pub fn advanced(self, total: usize) -> Self {
        Self {
            active_index: wrap(as_offset(self.active_index) + 1, total),
            total,
            ..self
        }
    }

    /// Keep the current position, re-wrapped into a gallery of `total`.
    #[must_use]
    pub fn resized(self, total: usize) -> Self {
        Self {
            active_index: wrap(as_offset(self.active_index), total),
            total,
            ..self
        }
    }

    /// Gallery index shown by `slot`, or `None` when the gallery is empty.
    pub fn index_for_slot(&self, slot: usize) -> Option<usize> {
        (!self.is_empty()).then(|| wrap(as_offset(self.active_index) + as_offset(slot), self.total))
    }

    /// Gallery index for every slot, primary first.
    pub fn assignments(&self) -> Vec<Option<usize>> {
        (0..self.slot_count)
            .map(|slot| self.index_for_slot(slot))
            .collect()
    }
}
