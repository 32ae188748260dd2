//! Scheduling horizon.
//!
//! Working hours are the half-open range `[start_hour, end_hour)`.
//! Slots are addressed two ways: the absolute `hour` (what users see)
//! and the zero-based `slot` offset (what variable indexing uses).

use serde::{Deserialize, Serialize};

/// A contiguous range of hourly time slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    /// First working hour (inclusive).
    pub start_hour: u32,
    /// End of working hours (exclusive).
    pub end_hour: u32,
}

impl Horizon {
    /// Creates a horizon over `[start_hour, end_hour)`.
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.end_hour.saturating_sub(self.start_hour) as usize
    }

    /// Whether the horizon has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Absolute hour of a slot offset.
    #[inline]
    pub fn hour(&self, slot: usize) -> u32 {
        self.start_hour + slot as u32
    }

    /// Slot offset of an absolute hour, if it is inside the horizon.
    pub fn slot(&self, hour: u32) -> Option<usize> {
        (self.start_hour..self.end_hour)
            .contains(&hour)
            .then(|| (hour - self.start_hour) as usize)
    }

    /// Slots that can host a changeover (all but the last).
    pub fn transition_slots(&self) -> std::ops::Range<usize> {
        0..self.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_horizon() {
        let h = Horizon::new(6, 10);
        assert_eq!(h.len(), 4);
        assert_eq!(h.hour(0), 6);
        assert_eq!(h.hour(3), 9);
        assert_eq!(h.slot(6), Some(0));
        assert_eq!(h.slot(9), Some(3));
        assert_eq!(h.slot(10), None);
        assert_eq!(h.slot(5), None);
    }

    #[test]
    fn test_transition_slots_skip_last() {
        assert_eq!(Horizon::new(0, 4).transition_slots(), 0..3);
        assert_eq!(Horizon::new(8, 9).transition_slots(), 0..0);
        assert!(Horizon::new(3, 3).is_empty());
        assert_eq!(Horizon::new(3, 3).transition_slots(), 0..0);
    }
}
