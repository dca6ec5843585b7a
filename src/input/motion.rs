//! Bounded pointer motion history.

use std::collections::VecDeque;

use crate::protocol::replies::MotionHistoryEntry;
use crate::protocol::types::{Timestamp, WindowId};

/// Ring of recent pointer positions, advertised as `motionBufferSize` in
/// the setup reply.
#[derive(Debug)]
pub struct MotionHistory {
    entries: VecDeque<(Timestamp, i16, i16, WindowId)>,
    capacity: usize,
}

impl MotionHistory {
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn record(&mut self, time: Timestamp, x: i16, y: i16, window: WindowId) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((time, x, y, window));
    }

    /// Entries with `start <= time <= stop`, oldest first.
    pub fn between(&self, start: Timestamp, stop: Timestamp) -> Vec<MotionHistoryEntry> {
        self.entries
            .iter()
            .filter(|(time, _, _, _)| *time >= start && *time <= stop)
            .map(|&(time, x, y, _)| MotionHistoryEntry { time, x, y })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_is_bounded() {
        let mut history = MotionHistory::new(4);
        for t in 0..10u32 {
            history.record(t, t as i16, 0, 1);
        }
        assert_eq!(history.len(), 4);
        let entries = history.between(0, 100);
        assert_eq!(entries.first().unwrap().time, 6);
        assert_eq!(entries.last().unwrap().time, 9);
    }

    #[test]
    fn time_window_is_inclusive() {
        let mut history = MotionHistory::new(16);
        for t in [10u32, 20, 30, 40] {
            history.record(t, 0, 0, 1);
        }
        let entries = history.between(20, 30);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].time, 20);
        assert_eq!(entries[1].time, 30);
    }
}
