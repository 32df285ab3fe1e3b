//! Timer-driven rotation of gallery images across display slots.
//!
//! The scheduler owns at most one background timer. Each tick moves the
//! primary slot one image forward and redraws every slot from the latest
//! gallery snapshot. The timer also wakes on gallery changes, so inserts,
//! removals and imports show up without waiting for the next tick.
//!
//! ```text
//!            start() with images
//!   Idle ─────────────────────────▶ Running ──┐ tick / gallery change
//!    ▲                                 │  ▲   │
//!    └──── stop() / gallery empty ─────┘  └───┘
//! ```
//!
//! Timer steps draw on tokio's blocking pool. The synchronous methods
//! ([`RotationScheduler::start`], [`tick`](RotationScheduler::tick),
//! [`reset`](RotationScheduler::reset), [`render`](RotationScheduler::render))
//! draw on the calling thread.

mod state;

pub use state::{RotationState, wrap};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::display::{SlotContent, SlotRenderer};
use crate::gallery::GallerySnapshot;
use crate::record::ImageRecord;

/// Whether a timer is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPhase {
    Idle,
    Running,
}

/// What one slot was assigned during a render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAssignment {
    pub slot: String,
    pub primary: bool,
    /// `None` when the slot shows the empty placeholder.
    pub image_id: Option<i64>,
}

/// What woke the timer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    Tick,
    GalleryChanged,
}

/// State shared between the scheduler handle and its timer task.
struct Shared<R> {
    slots: Vec<String>,
    renderer: R,
    gallery: watch::Receiver<GallerySnapshot>,
    state: Mutex<RotationState>,
    /// Bumped by every start and stop. A timer only acts for its own value.
    generation: AtomicU64,
}

impl<R: SlotRenderer> Shared<R> {
    fn latest(&self) -> GallerySnapshot {
        self.gallery.borrow().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, RotationState> {
        // RotationState is plain data and never left half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidate any running timer and return the new generation.
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Jump to the starting position and draw it.
    fn reset(&self) -> (RotationState, Vec<SlotAssignment>) {
        let mut state = self.lock_state();
        let snapshot = self.latest();
        *state = RotationState::starting(snapshot.len(), self.slots.len());
        let frame = self.draw(&snapshot, *state);
        (*state, frame)
    }

    fn tick(&self) -> RotationPhase {
        self.advance(&mut self.lock_state())
    }

    /// Redraw the current position against the latest snapshot.
    fn refresh(&self) -> (RotationState, Vec<SlotAssignment>) {
        let mut state = self.lock_state();
        let frame = self.resize(&mut state);
        (*state, frame)
    }

    /// One step of the timer task started as `generation`.
    ///
    /// Returns `None` without touching the slots if a later start or stop
    /// has superseded that timer.
    fn timer_step(&self, generation: u64, event: TimerEvent) -> Option<RotationPhase> {
        let mut state = self.lock_state();
        if self.current_generation() != generation {
            return None;
        }
        Some(match event {
            TimerEvent::Tick => self.advance(&mut state),
            TimerEvent::GalleryChanged => {
                self.resize(&mut state);
                phase_of(*state)
            }
        })
    }

    fn advance(&self, state: &mut RotationState) -> RotationPhase {
        let snapshot = self.latest();
        *state = state.advanced(snapshot.len());
        trace!(active_index = state.active_index, total = state.total, "Rotation tick");
        self.draw(&snapshot, *state);
        phase_of(*state)
    }

    fn resize(&self, state: &mut RotationState) -> Vec<SlotAssignment> {
        let snapshot = self.latest();
        if state.total != snapshot.len() {
            debug!(from = state.total, to = snapshot.len(), "Gallery size changed");
        }
        *state = state.resized(snapshot.len());
        self.draw(&snapshot, *state)
    }

    fn assign(&self, snapshot: &[ImageRecord], state: RotationState) -> Vec<SlotAssignment> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| SlotAssignment {
                slot: slot.clone(),
                primary: i == 0,
                image_id: state
                    .index_for_slot(i)
                    .and_then(|idx| snapshot.get(idx))
                    .map(|r| r.id),
            })
            .collect()
    }

    /// Render every slot. A slot that fails is logged and skipped.
    fn draw(&self, snapshot: &[ImageRecord], state: RotationState) -> Vec<SlotAssignment> {
        for (i, slot) in self.slots.iter().enumerate() {
            let content = state
                .index_for_slot(i)
                .and_then(|idx| snapshot.get(idx))
                .map_or(SlotContent::Empty, SlotContent::Image);

            if let Err(e) = self.renderer.render_slot(slot, content) {
                warn!(slot = %slot, error = %e, "Failed to render slot");
            }
        }
        self.assign(snapshot, state)
    }
}

const fn phase_of(state: RotationState) -> RotationPhase {
    if state.is_empty() {
        RotationPhase::Idle
    } else {
        RotationPhase::Running
    }
}

/// Cycles gallery images through a fixed list of display slots.
///
/// Slot 0 is the primary slot; the rest are secondary slots showing the
/// images that follow it.
pub struct RotationScheduler<R: SlotRenderer> {
    shared: Arc<Shared<R>>,
    interval: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<R: SlotRenderer> RotationScheduler<R> {
    /// Create an idle scheduler.
    ///
    /// `slots` lists display slot ids, primary first. `gallery` is a
    /// subscription from [`GalleryModel::subscribe`](crate::gallery::GalleryModel::subscribe).
    pub fn new(
        slots: Vec<String>,
        interval: Duration,
        renderer: R,
        gallery: watch::Receiver<GallerySnapshot>,
    ) -> Self {
        let state = RotationState::starting(0, slots.len());
        Self {
            shared: Arc::new(Shared {
                slots,
                renderer,
                gallery,
                state: Mutex::new(state),
                generation: AtomicU64::new(0),
            }),
            interval,
            timer: Mutex::new(None),
        }
    }

    /// Display slot ids, primary first.
    pub fn slots(&self) -> &[String] {
        &self.shared.slots
    }

    /// Time between ticks.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    pub fn renderer(&self) -> &R {
        &self.shared.renderer
    }

    /// Current rotation position.
    pub fn state(&self) -> RotationState {
        *self.shared.lock_state()
    }

    pub fn phase(&self) -> RotationPhase {
        if self.is_running() {
            RotationPhase::Running
        } else {
            RotationPhase::Idle
        }
    }

    /// True while a timer task is alive.
    pub fn is_running(&self) -> bool {
        self.lock_timer()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start rotating from the newest image.
    ///
    /// Draws immediately, then ticks every [`interval`](Self::interval).
    /// Any previous timer is cancelled first, so calling this repeatedly
    /// never leaves more than one timer. With an empty gallery every slot is
    /// drawn empty and no timer is started.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self) -> RotationPhase {
        let mut timer = self.lock_timer();
        let generation = self.shared.next_generation();
        if let Some(handle) = timer.take() {
            handle.abort();
            debug!("Cancelled previous rotation timer");
        }

        // Mark the view as seen before drawing it: anything published from
        // here on wakes the new timer.
        let mut gallery = self.shared.gallery.clone();
        drop(gallery.borrow_and_update());

        let (state, _) = self.shared.reset();
        if state.is_empty() {
            info!("No images to rotate");
            return RotationPhase::Idle;
        }

        *timer = Some(tokio::spawn(run_timer(
            Arc::clone(&self.shared),
            gallery,
            self.interval,
            generation,
        )));
        info!(
            images = state.total,
            slots = state.slot_count,
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "Rotation started"
        );
        RotationPhase::Running
    }

    /// Advance one step and redraw.
    ///
    /// If the gallery has become empty every slot is drawn empty and the
    /// timer, if any, is stopped.
    pub fn tick(&self) -> RotationPhase {
        let phase = self.shared.tick();
        if phase == RotationPhase::Idle {
            self.stop();
        }
        phase
    }

    /// Jump to the starting position and draw it once, without a timer.
    pub fn reset(&self) -> Vec<SlotAssignment> {
        self.shared.reset().1
    }

    /// Redraw the current position against the latest gallery snapshot.
    pub fn render(&self) -> Vec<SlotAssignment> {
        self.shared.refresh().1
    }

    /// What each slot shows at the current position, without drawing.
    pub fn assignments(&self) -> Vec<SlotAssignment> {
        let snapshot = self.shared.latest();
        let state = self.state().resized(snapshot.len());
        self.shared.assign(&snapshot, state)
    }

    /// Cancel the timer. The slots keep showing their last frame.
    pub fn stop(&self) {
        let mut timer = self.lock_timer();
        self.shared.next_generation();
        if let Some(handle) = timer.take() {
            handle.abort();
            info!("Rotation stopped");
        }
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: SlotRenderer> Drop for RotationScheduler<R> {
    fn drop(&mut self) {
        self.shared.next_generation();
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
    }
}

/// Timer loop: ticks every `period` and redraws on gallery changes.
///
/// `gallery` must already be marked seen for the frame drawn by `start`.
async fn run_timer<R: SlotRenderer>(
    shared: Arc<Shared<R>>,
    mut gallery: watch::Receiver<GallerySnapshot>,
    period: Duration,
    generation: u64,
) {
    let mut gallery_open = true;

    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let event = tokio::select! {
            _ = ticker.tick() => TimerEvent::Tick,
            changed = gallery.changed(), if gallery_open => {
                if changed.is_err() {
                    // The gallery is gone; keep rotating its last snapshot.
                    debug!("Gallery closed");
                    gallery_open = false;
                    continue;
                }
                drop(gallery.borrow_and_update());
                TimerEvent::GalleryChanged
            }
        };

        // Renderers may write files; keep that off the async workers.
        let step = Arc::clone(&shared);
        let phase =
            match tokio::task::spawn_blocking(move || step.timer_step(generation, event)).await {
                Ok(Some(phase)) => phase,
                Ok(None) => {
                    debug!(generation, "Rotation timer superseded");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Rotation step failed");
                    break;
                }
            };

        if phase == RotationPhase::Idle {
            info!("Gallery is empty, rotation stopped");
            break;
        }
    }
}
