#![forbid(unsafe_code)]

//! Per-window tick loops driven once per display frame.
//!
//! [`AnimationScheduler`] holds one loop per active cooldown window. Each
//! [`frame`](AnimationScheduler::frame) samples every loop's
//! [`ProgressSource`], calls `on_tick` with the progress, and when the
//! window completes calls `on_complete` exactly once and drops the loop.
//!
//! # Invariants
//!
//! 1. At most one loop per window id; starting an id that is already
//!    running replaces the old loop without completing it.
//! 2. `on_complete` runs at most once per loop, and only after an
//!    `on_tick(1.0)`.
//! 3. A loop whose window disappeared from the source (cancelled,
//!    superseded, item gone) is dropped silently.
//! 4. Loops are driven in start order.

use tracing::{debug, trace};

use satchel_core::InstanceId;

use crate::cooldown::{CooldownReconciler, Sample};

/// Loops are keyed by the owning item instance.
pub type WindowId = InstanceId;

/// Anything that can be sampled for a window's progress.
pub trait ProgressSource {
    /// Sample `id` at `now_ms`. `None` means the window no longer exists.
    fn sample(&mut self, id: WindowId, now_ms: u64) -> Option<Sample>;
}

impl ProgressSource for CooldownReconciler {
    fn sample(&mut self, id: WindowId, now_ms: u64) -> Option<Sample> {
        CooldownReconciler::sample(self, id, now_ms)
    }
}

type TickFn = Box<dyn FnMut(f32)>;
type CompleteFn = Box<dyn FnOnce()>;

struct TickLoop {
    id: WindowId,
    on_tick: TickFn,
    on_complete: Option<CompleteFn>,
    ticks: u64,
}

impl std::fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickLoop")
            .field("id", &self.id)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

/// What one frame did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub ticked: usize,
    pub completed: Vec<WindowId>,
    /// Loops dropped because their window vanished.
    pub dropped: Vec<WindowId>,
}

/// Drives one tick loop per active window.
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    loops: Vec<TickLoop>,
}

impl AnimationScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a loop for `id`. Returns `true` if it replaced a running one.
    pub fn start(
        &mut self,
        id: WindowId,
        on_tick: impl FnMut(f32) + 'static,
        on_complete: impl FnOnce() + 'static,
    ) -> bool {
        let replaced = self.remove(id);
        self.loops.push(TickLoop {
            id,
            on_tick: Box::new(on_tick),
            on_complete: Some(Box::new(on_complete)),
            ticks: 0,
        });
        debug!(window = id, replaced, "tick loop started");
        replaced
    }

    /// Stop `id` without completing it.
    pub fn stop(&mut self, id: WindowId) -> bool {
        let stopped = self.remove(id);
        if stopped {
            debug!(window = id, "tick loop stopped");
        }
        stopped
    }

    /// Drive every loop once.
    pub fn frame(&mut self, now_ms: u64, source: &mut impl ProgressSource) -> FrameReport {
        let mut report = FrameReport::default();
        let loops = std::mem::take(&mut self.loops);
        let mut survivors = Vec::with_capacity(loops.len());

        for mut tick_loop in loops {
            let Some(Sample {
                progress,
                completed,
            }) = source.sample(tick_loop.id, now_ms)
            else {
                trace!(window = tick_loop.id, "window gone; loop dropped");
                report.dropped.push(tick_loop.id);
                continue;
            };

            (tick_loop.on_tick)(progress);
            tick_loop.ticks += 1;
            report.ticked += 1;

            if completed {
                if let Some(done) = tick_loop.on_complete.take() {
                    done();
                }
                debug!(window = tick_loop.id, ticks = tick_loop.ticks, "tick loop completed");
                report.completed.push(tick_loop.id);
            } else {
                survivors.push(tick_loop);
            }
        }

        self.loops = survivors;
        report
    }

    #[must_use]
    pub fn is_running(&self, id: WindowId) -> bool {
        self.loops.iter().any(|l| l.id == id)
    }

    /// Running window ids in start order.
    #[must_use]
    pub fn running(&self) -> Vec<WindowId> {
        self.loops.iter().map(|l| l.id).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Stop every loop without completing any.
    pub fn clear(&mut self) {
        self.loops.clear();
    }

    fn remove(&mut self, id: WindowId) -> bool {
        let before = self.loops.len();
        self.loops.retain(|l| l.id != id);
        self.loops.len() != before
    }
}
