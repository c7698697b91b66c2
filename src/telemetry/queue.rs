//! Bounded FIFO of lifecycle events.
//!
//! Enqueueing never blocks and never fails. When the queue is full the oldest
//! record is evicted to make room, and the eviction is only counted.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use super::event::{EventRecord, Snapshot};

#[derive(Debug)]
pub struct EventQueue {
    records: VecDeque<EventRecord>,
    capacity: usize,
    next_seq: u64,
    dropped: u64,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
            dropped: 0,
        }
    }

    /// Append a record, evicting the oldest if full. Returns its sequence number.
    pub fn enqueue(
        &mut self,
        event: &str,
        snapshot: Snapshot,
        message: Option<String>,
        timestamp: Option<DateTime<Utc>>,
    ) -> u64 {
        if self.records.len() >= self.capacity && self.records.pop_front().is_some() {
            self.dropped += 1;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.push_back(EventRecord {
            seq,
            event: event.to_string(),
            snapshot,
            message,
            timestamp,
        });
        seq
    }

    pub fn head(&self) -> Option<&EventRecord> {
        self.records.front()
    }

    /// Remove the head only if it is still the record with `seq`.
    pub fn pop_if_head(&mut self, seq: u64) -> bool {
        if self.records.front().is_some_and(|head| head.seq == seq) {
            self.records.pop_front();
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records evicted by overflow since startup.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: Snapshot = Snapshot {
        lights_on: false,
        brightness: 0,
        motion: false,
    };

    fn names(queue: &EventQueue) -> Vec<String> {
        queue.iter().map(|r| r.event.clone()).collect()
    }

    #[test]
    fn test_overflow_drops_exactly_the_oldest() {
        let mut queue = EventQueue::new(3);
        for name in ["a", "b", "c", "d"] {
            queue.enqueue(name, SNAPSHOT, None, None);
        }

        assert_eq!(names(&queue), vec!["b", "c", "d"]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dropped(), 1);
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let mut queue = EventQueue::new(2);
        let first = queue.enqueue("a", SNAPSHOT, None, None);
        let second = queue.enqueue("b", SNAPSHOT, None, None);
        let third = queue.enqueue("c", SNAPSHOT, None, None);

        assert!(first < second && second < third);
        assert_eq!(queue.head().unwrap().seq, second);
    }

    #[test]
    fn test_pop_if_head_checks_sequence() {
        let mut queue = EventQueue::new(2);
        let first = queue.enqueue("a", SNAPSHOT, None, None);
        queue.enqueue("b", SNAPSHOT, None, None);
        queue.enqueue("c", SNAPSHOT, None, None);

        // "a" was evicted; popping it must not remove "b".
        assert!(!queue.pop_if_head(first));
        assert_eq!(names(&queue), vec!["b", "c"]);

        let head = queue.head().unwrap().seq;
        assert!(queue.pop_if_head(head));
        assert_eq!(names(&queue), vec!["c"]);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut queue = EventQueue::new(0);
        queue.enqueue("a", SNAPSHOT, None, None);
        queue.enqueue("b", SNAPSHOT, Some("x".into()), None);

        assert_eq!(queue.capacity(), 1);
        assert_eq!(names(&queue), vec!["b"]);
        assert_eq!(queue.head().unwrap().message.as_deref(), Some("x"));
    }
}
