//! Thread records and the all-threads list
//!
//! A record lives from creation until it is reclaimed after its final
//! switch. The all-threads list is shorter-lived: a thread leaves it when
//! it starts exiting, before its record is freed.

use crate::scheduler::thread::{Thread, ThreadId};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

pub struct ThreadRegistry {
    /// Boxed so a record never moves while its context is being switched
    records: BTreeMap<ThreadId, Box<Thread>>,

    /// Live threads in creation order
    all: Vec<ThreadId>,
}

impl ThreadRegistry {
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            all: Vec::new(),
        }
    }

    /// Register a new thread in both the record table and the live list
    pub fn insert(&mut self, thread: Box<Thread>) {
        let tid = thread.id();
        self.all.push(tid);
        self.records.insert(tid, thread);
    }

    pub fn get(&self, tid: ThreadId) -> Option<&Thread> {
        self.records.get(&tid).map(|t| &**t)
    }

    pub fn get_mut(&mut self, tid: ThreadId) -> Option<&mut Thread> {
        self.records.get_mut(&tid).map(|t| &mut **t)
    }

    /// Remove from the live list only; the record stays until reclaimed
    pub fn unlink(&mut self, tid: ThreadId) {
        self.all.retain(|&t| t != tid);
    }

    pub fn is_live(&self, tid: ThreadId) -> bool {
        self.all.contains(&tid)
    }

    /// Take ownership of an unlinked record so it can be freed
    pub fn reclaim(&mut self, tid: ThreadId) -> Option<Box<Thread>> {
        debug_assert!(!self.is_live(tid));
        self.records.remove(&tid)
    }

    /// Live thread ids in creation order
    pub fn live(&self) -> &[ThreadId] {
        &self.all
    }

    pub fn live_count(&self) -> usize {
        self.all.len()
    }

    /// Apply `f` to every live thread
    pub fn for_each_live_mut(&mut self, mut f: impl FnMut(&mut Thread)) {
        for tid in &self.all {
            if let Some(thread) = self.records.get_mut(tid) {
                f(thread);
            }
        }
    }
}

impl Default for ThreadRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::thread::{ThreadStack, MIN_STACK_SIZE, PRI_DEFAULT};

    fn record(tid: ThreadId) -> Box<Thread> {
        let stack = ThreadStack::allocate(MIN_STACK_SIZE).unwrap();
        Box::new(Thread::new(tid, "t", PRI_DEFAULT, stack))
    }

    #[test]
    fn test_unlink_keeps_record_until_reclaim() {
        let mut registry = ThreadRegistry::new();
        registry.insert(record(1));
        registry.insert(record(2));
        registry.unlink(1);
        assert_eq!(registry.live(), &[2]);
        assert!(registry.get(1).is_some());
        let freed = registry.reclaim(1).map(|t| t.id());
        assert_eq!(freed, Some(1));
        assert!(registry.get(1).is_none());
    }

    #[test]
    fn test_for_each_visits_live_only() {
        let mut registry = ThreadRegistry::new();
        for tid in 1..=3 {
            registry.insert(record(tid));
        }
        registry.unlink(2);
        let mut seen = Vec::new();
        registry.for_each_live_mut(|t| seen.push(t.id()));
        assert_eq!(seen, alloc::vec![1, 3]);
    }
}
