//! Sleep queue
//!
//! Threads blocked until an absolute tick. Scanned on every timer tick.

use crate::scheduler::thread::ThreadId;
use alloc::vec::Vec;

pub struct SleepQueue {
    sleepers: Vec<(ThreadId, u64)>,
}

impl SleepQueue {
    pub const fn new() -> Self {
        Self {
            sleepers: Vec::new(),
        }
    }

    pub fn push(&mut self, tid: ThreadId, wakeup_tick: u64) {
        self.sleepers.push((tid, wakeup_tick));
    }

    pub fn len(&self) -> usize {
        self.sleepers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sleepers.is_empty()
    }

    pub fn contains(&self, tid: ThreadId) -> bool {
        self.sleepers.iter().any(|&(t, _)| t == tid)
    }

    /// Drop `tid` from the queue; true if it was sleeping
    pub fn remove(&mut self, tid: ThreadId) -> bool {
        let before = self.sleepers.len();
        self.sleepers.retain(|&(t, _)| t != tid);
        self.sleepers.len() != before
    }

    /// Remove every thread whose wakeup tick is `<= now`, in queue order
    pub fn take_due(&mut self, now: u64) -> Vec<ThreadId> {
        let mut due = Vec::new();
        self.sleepers.retain(|&(tid, wakeup)| {
            if wakeup <= now {
                due.push(tid);
                false
            } else {
                true
            }
        });
        due
    }
}

impl Default for SleepQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_take_due_keeps_future_sleepers() {
        let mut queue = SleepQueue::new();
        queue.push(1, 10);
        queue.push(2, 5);
        queue.push(3, 12);
        assert_eq!(queue.take_due(9), alloc::vec![2]);
        assert_eq!(queue.take_due(10), alloc::vec![1]);
        assert_eq!(queue.len(), 1);
        assert!(queue.contains(3));
    }

    #[test]
    fn test_remove() {
        let mut queue = SleepQueue::new();
        queue.push(4, 1);
        assert!(queue.remove(4));
        assert!(!queue.remove(4));
        assert!(queue.is_empty());
    }

    proptest! {
        #[test]
        fn prop_woken_exactly_at_wakeup_tick(wakeups in proptest::collection::vec(1u64..50, 1..20)) {
            let mut queue = SleepQueue::new();
            for (tid, &wakeup) in wakeups.iter().enumerate() {
                queue.push(tid as ThreadId, wakeup);
            }
            for now in 0..60u64 {
                // Scanned every tick: never early, never late
                for tid in queue.take_due(now) {
                    prop_assert_eq!(wakeups[tid as usize], now);
                }
            }
            prop_assert!(queue.is_empty());
        }
    }
}
