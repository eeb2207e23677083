// THEORY:
// `FrameChannel` is the hand-off point between whatever produces frames (a capture
// task on a background runtime) and whatever consumes them (probes running on their
// own threads). It holds exactly one frame: the latest.
//
// Publishing swaps a freshly built `Arc<ColorGrid>` into the slot in one atomic
// step, so a reader either sees the previous frame or the new one, never a grid
// that is still being filled in. Nothing queues; an unread frame is simply replaced
// and dropped once the last reader lets go of it. Neither side ever waits on a lock.

use crate::core_modules::color_grid::color_grid::ColorGrid;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Single-slot, last-write-wins publish point for the most recent frame.
#[derive(Debug, Default)]
pub struct FrameChannel {
    latest: ArcSwapOption<ColorGrid>,
    published: AtomicU64,
}

impl FrameChannel {
    pub fn new() -> Self {
        Self {
            latest: ArcSwapOption::empty(),
            published: AtomicU64::new(0),
        }
    }

    /// Replaces the current frame.
    pub fn publish(&self, grid: ColorGrid) {
        self.publish_shared(Arc::new(grid));
    }

    /// Replaces the current frame with one that is already shared.
    pub fn publish_shared(&self, grid: Arc<ColorGrid>) {
        self.latest.store(Some(grid));
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// The most recently published frame, or `None` before the first publish.
    pub fn latest(&self) -> Option<Arc<ColorGrid>> {
        self.latest.load_full()
    }

    pub fn image_available(&self) -> bool {
        self.latest.load().is_some()
    }

    /// How many frames have been published so far.
    pub fn frames_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
