//! Ready queue
//!
//! Unordered set of Ready threads kept in insertion order. Priorities
//! change under MLFQS while threads wait, so the queue stores ids only and
//! selection scans for the maximum at pick time (O(n)).
//!
//! Among equal maximum priorities the earliest-inserted thread wins.

use crate::scheduler::thread::{Priority, ThreadId};
use alloc::collections::VecDeque;

pub struct ReadyQueue {
    threads: VecDeque<ThreadId>,
}

impl ReadyQueue {
    pub const fn new() -> Self {
        Self {
            threads: VecDeque::new(),
        }
    }

    pub fn push(&mut self, tid: ThreadId) {
        self.threads.push_back(tid);
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Highest priority currently queued
    pub fn max_priority(&self, priority_of: impl Fn(ThreadId) -> Priority) -> Option<Priority> {
        self.position_of_max(&priority_of).map(|(_, p)| p)
    }

    /// Remove and return the highest-priority thread
    pub fn pop_highest(&mut self, priority_of: impl Fn(ThreadId) -> Priority) -> Option<ThreadId> {
        let (index, _) = self.position_of_max(&priority_of)?;
        self.threads.remove(index)
    }

    fn position_of_max(
        &self,
        priority_of: &impl Fn(ThreadId) -> Priority,
    ) -> Option<(usize, Priority)> {
        let mut best: Option<(usize, Priority)> = None;
        for (index, &tid) in self.threads.iter().enumerate() {
            let priority = priority_of(tid);
            match best {
                Some((_, p)) if priority <= p => {}
                _ => best = Some((index, priority)),
            }
        }
        best
    }
}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priority_of(tid: ThreadId) -> Priority {
        match tid {
            1 => 5,
            2 => 9,
            3 => 3,
            4 => 9,
            _ => 0,
        }
    }

    #[test]
    fn test_pop_highest_priority() {
        let mut queue = ReadyQueue::new();
        for tid in [1, 2, 3] {
            queue.push(tid);
        }
        assert_eq!(queue.max_priority(priority_of), Some(9));
        assert_eq!(queue.pop_highest(priority_of), Some(2));
        assert_eq!(queue.pop_highest(priority_of), Some(1));
        assert_eq!(queue.pop_highest(priority_of), Some(3));
        assert_eq!(queue.pop_highest(priority_of), None);
    }

    #[test]
    fn test_ties_go_to_earliest_inserted() {
        let mut queue = ReadyQueue::new();
        for tid in [1, 4, 2] {
            queue.push(tid);
        }
        assert_eq!(queue.pop_highest(priority_of), Some(4));
        assert_eq!(queue.pop_highest(priority_of), Some(2));
    }

    #[test]
    fn test_empty_queue() {
        let queue = ReadyQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.max_priority(priority_of), None);
    }
}
