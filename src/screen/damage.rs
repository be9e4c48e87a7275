//! Damage accumulation
//!
//! Tracks the minimal bounding rectangle of cells changed since the last
//! flush. Every mutating screen operation widens the rectangle; the paint
//! path flushes it and repaints only that region.
//!
//! The tracker is shared between the event path and the paint path, so the
//! accumulator sits behind a lock. Over-damaging is always safe (repaint is
//! idempotent); the only unacceptable error is a missed update, so a flush
//! racing a mutation may observe a rectangle one update wider than strictly
//! required.

use std::sync::Mutex;

/// Flushed damage extent in cell coordinates (inclusive-exclusive columns
/// and rows: x..x+width, y..y+height)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Accumulator state: min/max corners plus the grid bounds used as the
/// empty sentinel (min = bounds, max = 0)
#[derive(Debug, Clone, Copy)]
struct DamageRegion {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
    cols: usize,
    rows: usize,
}

impl DamageRegion {
    fn empty(cols: usize, rows: usize) -> Self {
        Self { min_x: cols, min_y: rows, max_x: 0, max_y: 0, cols, rows }
    }
}

/// Shared damage accumulator
pub struct DamageTracker {
    region: Mutex<DamageRegion>,
}

impl DamageTracker {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            region: Mutex::new(DamageRegion::empty(cols, rows)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DamageRegion> {
        // A poisoned accumulator is still usable: the worst outcome of
        // half-applied bounds is over-damage
        match self.region.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Record new grid bounds (called on resize). Resets the accumulator's
    /// empty sentinel; callers mark the whole grid dirty separately.
    pub fn set_bounds(&self, cols: usize, rows: usize) {
        let mut region = self.lock();
        *region = DamageRegion::empty(cols, rows);
    }

    /// Widen the accumulated rectangle by the given cell-space rectangle
    pub fn mark_dirty(&self, x: usize, y: usize, width: usize, height: usize) {
        if width == 0 || height == 0 {
            return;
        }
        let mut region = self.lock();
        if x < region.min_x {
            region.min_x = x;
        }
        if y < region.min_y {
            region.min_y = y;
        }
        if x + width > region.max_x {
            region.max_x = x + width;
        }
        if y + height > region.max_y {
            region.max_y = y + height;
        }
    }

    /// Mark the entire grid dirty
    pub fn mark_all_dirty(&self) {
        let mut region = self.lock();
        region.min_x = 0;
        region.min_y = 0;
        region.max_x = region.cols;
        region.max_y = region.rows;
    }

    /// Take the accumulated rectangle and reset to empty.
    /// None means nothing needs repainting.
    pub fn take_and_reset(&self) -> Option<DamageRect> {
        let mut region = self.lock();
        let taken = *region;
        *region = DamageRegion::empty(taken.cols, taken.rows);
        if taken.max_x <= taken.min_x || taken.max_y <= taken.min_y {
            return None;
        }
        Some(DamageRect {
            x: taken.min_x,
            y: taken.min_y,
            width: taken.max_x - taken.min_x,
            height: taken.max_y - taken.min_y,
        })
    }

    /// Peek at the accumulated rectangle without resetting
    pub fn current(&self) -> Option<DamageRect> {
        let region = self.lock();
        if region.max_x <= region.min_x || region.max_y <= region.min_y {
            return None;
        }
        Some(DamageRect {
            x: region.min_x,
            y: region.min_y,
            width: region.max_x - region.min_x,
            height: region.max_y - region.min_y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_flush_is_none() {
        let tracker = DamageTracker::new(80, 24);
        assert_eq!(tracker.take_and_reset(), None);
    }

    #[test]
    fn test_union_of_marks() {
        let tracker = DamageTracker::new(80, 24);
        tracker.mark_dirty(4, 2, 3, 1);
        tracker.mark_dirty(10, 5, 1, 2);
        let rect = tracker.take_and_reset().unwrap();
        assert_eq!(rect, DamageRect { x: 4, y: 2, width: 7, height: 5 });
        // Flush resets to empty
        assert_eq!(tracker.take_and_reset(), None);
    }

    #[test]
    fn test_mark_all_dirty_covers_grid() {
        let tracker = DamageTracker::new(80, 24);
        tracker.mark_all_dirty();
        let rect = tracker.take_and_reset().unwrap();
        assert_eq!(rect, DamageRect { x: 0, y: 0, width: 80, height: 24 });
    }

    #[test]
    fn test_zero_size_mark_is_ignored() {
        let tracker = DamageTracker::new(80, 24);
        tracker.mark_dirty(5, 5, 0, 3);
        tracker.mark_dirty(5, 5, 3, 0);
        assert_eq!(tracker.take_and_reset(), None);
    }

    #[test]
    fn test_set_bounds_resets_sentinel() {
        let tracker = DamageTracker::new(10, 10);
        tracker.mark_dirty(1, 1, 2, 2);
        tracker.set_bounds(20, 5);
        assert_eq!(tracker.take_and_reset(), None);
        tracker.mark_all_dirty();
        let rect = tracker.take_and_reset().unwrap();
        assert_eq!(rect, DamageRect { x: 0, y: 0, width: 20, height: 5 });
    }
}
