//! Cue point tracking
//!
//! Maintains the ordered cue point list and the currently active cue
//! as the playback clock advances. The active cue is the one with the
//! greatest `time` not exceeding the current playback time, or none.
//! Marker counts are typically small, so a linear scan per time
//! update is fine.

use crate::types::CuePoint;

/// Tracks the cue point list and the active cue across time updates
#[derive(Debug, Default)]
pub struct CuePointTracker {
    points: Vec<CuePoint>,
    active: Option<usize>,
}

impl CuePointTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cue point collection
    ///
    /// Caller-supplied ordering is preserved. The active cue is not
    /// recomputed here; the next time update drives that.
    pub fn replace(&mut self, points: Vec<CuePoint>) {
        self.points = points;
        self.active = None;
    }

    /// Clear the collection and the active cue (source change)
    ///
    /// Never produces a change notification.
    pub fn reset(&mut self) {
        self.points.clear();
        self.active = None;
    }

    /// Advance the playback clock
    ///
    /// Returns `Some(new_active)` when the active cue changed (the
    /// payload for the change notification, `None` inside meaning no
    /// cue qualifies), or `None` when nothing changed.
    pub fn advance(&mut self, time: f64) -> Option<Option<CuePoint>> {
        if self.points.is_empty() {
            return None;
        }

        let mut best: Option<usize> = None;
        for (idx, point) in self.points.iter().enumerate() {
            if point.time <= time {
                match best {
                    Some(b) if self.points[b].time >= point.time => {}
                    _ => best = Some(idx),
                }
            }
        }

        if best == self.active {
            return None;
        }
        self.active = best;
        Some(best.map(|idx| self.points[idx].clone()))
    }

    /// Current cue point collection
    pub fn points(&self) -> &[CuePoint] {
        &self.points
    }

    /// Currently active cue point, if any
    pub fn active(&self) -> Option<&CuePoint> {
        self.active.map(|idx| &self.points[idx])
    }
}
