//! Timestamp alignment — positions for elements anchored by abstract
//! timestamp rather than by a concrete event.
//!
//! Abstract timestamps count beats from 1.0 (the first beat), so values in
//! 0..1 fall before the measure. Internally they are shifted down by one so
//! that the position axis matches musical time, with "before the measure"
//! mapping to negative positions.

use crate::style::times_equal;

/// One timestamp position shared by every element anchored to it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampAttr {
    pos: f64,
}

impl TimestampAttr {
    /// Position on the musical time axis (abstract timestamp − 1.0).
    pub fn actual_dur_pos(&self) -> f64 {
        self.pos
    }
}

/// Ordered registry of timestamp positions, one entry per distinct
/// adjusted position.
#[derive(Debug, Clone, Default)]
pub struct TimestampAligner {
    timestamps: Vec<TimestampAttr>,
}

impl TimestampAligner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.timestamps.clear();
    }

    pub fn timestamps(&self) -> &[TimestampAttr] {
        &self.timestamps
    }

    /// The entry for the given abstract timestamp, creating and inserting
    /// it in position order when it does not exist yet.
    pub fn get_timestamp_at_time(&mut self, time: f64) -> &mut TimestampAttr {
        // timestamps 0..1.0 denote "before the measure"
        let time = time - 1.0;
        let mut idx = self.timestamps.len();
        let mut found = None;
        for (i, timestamp) in self.timestamps.iter().enumerate() {
            if times_equal(timestamp.pos, time) {
                found = Some(i);
                break;
            }
            if timestamp.pos > time {
                idx = i;
                break;
            }
        }
        if let Some(i) = found {
            return &mut self.timestamps[i];
        }
        self.timestamps.insert(idx, TimestampAttr { pos: time });
        &mut self.timestamps[idx]
    }
}
