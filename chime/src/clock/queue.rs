//! Timestamp-ordered scheduling queue

use chrono::{DateTime, Utc};

use crate::event::Event;

/// One pending event, keyed by its next fire time.
///
/// Entries exist only inside the scheduler loop and are destroyed when the
/// event retires or the queue is rebuilt.
#[derive(Debug)]
pub(crate) struct QueueEntry {
    /// Next fire time for this event.
    pub at: DateTime<Utc>,
    pub event: Event,
    /// Insertion order. Entries with identical fire times pop in insertion
    /// order; an entry re-keyed in place keeps its original rank.
    seq: u64,
}

/// Array-backed binary min-heap over `(at, seq)`.
///
/// The minimum entry can be re-keyed in place ([`ScheduleQueue::reschedule_min`])
/// so an event's identity is preserved across a reschedule instead of being
/// popped and reinserted.
#[derive(Debug, Default)]
pub(crate) struct ScheduleQueue {
    entries: Vec<QueueEntry>,
    next_seq: u64,
}

impl ScheduleQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, at: DateTime<Utc>, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(QueueEntry { at, event, seq });
        self.sift_up(self.entries.len() - 1);
    }

    pub fn peek(&self) -> Option<&QueueEntry> {
        self.entries.first()
    }

    /// Fire time of the earliest entry, if any.
    pub fn next_at(&self) -> Option<DateTime<Utc>> {
        self.entries.first().map(|entry| entry.at)
    }

    /// Re-key the minimum entry and restore heap order.
    pub fn reschedule_min(&mut self, at: DateTime<Utc>) {
        if let Some(entry) = self.entries.first_mut() {
            entry.at = at;
            self.sift_down(0);
        }
    }

    /// Remove and return the minimum entry.
    pub fn pop_min(&mut self) -> Option<QueueEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let entry = self.entries.swap_remove(0);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some(entry)
    }

    fn less(&self, i: usize, j: usize) -> bool {
        let (a, b) = (&self.entries[i], &self.entries[j]);
        (a.at, a.seq) < (b.at, b.seq)
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.less(i, parent) {
                break;
            }
            self.entries.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * i + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut min = left;
            if right < len && self.less(right, left) {
                min = right;
            }
            if !self.less(min, i) {
                break;
            }
            self.entries.swap(i, min);
            i = min;
        }
    }
}
