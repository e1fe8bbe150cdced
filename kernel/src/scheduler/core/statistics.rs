//! Statistics - Scheduler accounting
//!
//! Tick attribution (idle/kernel/user) plus lifecycle counters. Atomic so
//! they can be read without taking the scheduler lock.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Who the CPU was working for during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Idle,
    Kernel,
    User,
}

pub struct SchedulerStats {
    /// Timer ticks since boot
    pub ticks: AtomicU64,

    pub idle_ticks: AtomicU64,

    pub kernel_ticks: AtomicU64,

    pub user_ticks: AtomicU64,

    /// Context switches that changed the running thread
    pub total_switches: AtomicU64,

    /// Threads created
    pub total_spawns: AtomicU64,

    /// Thread records freed after exit
    pub total_reclaimed: AtomicU64,

    /// Time slices that ran out
    pub preemptions: AtomicU64,

    /// Yields, voluntary or forced
    pub yields: AtomicU64,
}

impl SchedulerStats {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            idle_ticks: AtomicU64::new(0),
            kernel_ticks: AtomicU64::new(0),
            user_ticks: AtomicU64::new(0),
            total_switches: AtomicU64::new(0),
            total_spawns: AtomicU64::new(0),
            total_reclaimed: AtomicU64::new(0),
            preemptions: AtomicU64::new(0),
            yields: AtomicU64::new(0),
        }
    }

    /// Count one timer tick; returns the new tick count
    pub fn record_tick(&self, kind: TickKind) -> u64 {
        let counter = match kind {
            TickKind::Idle => &self.idle_ticks,
            TickKind::Kernel => &self.kernel_ticks,
            TickKind::User => &self.user_ticks,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn record_switch(&self) {
        self.total_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_spawn(&self) {
        self.total_spawns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reclaim(&self) {
        self.total_reclaimed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record preemption
    pub fn record_preemption(&self) {
        self.preemptions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_yield(&self) {
        self.yields.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TickStats {
        TickStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            idle_ticks: self.idle_ticks.load(Ordering::Relaxed),
            kernel_ticks: self.kernel_ticks.load(Ordering::Relaxed),
            user_ticks: self.user_ticks.load(Ordering::Relaxed),
            total_switches: self.total_switches.load(Ordering::Relaxed),
            total_spawns: self.total_spawns.load(Ordering::Relaxed),
            total_reclaimed: self.total_reclaimed.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            yields: self.yields.load(Ordering::Relaxed),
        }
    }
}

impl Default for SchedulerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickStats {
    pub ticks: u64,
    pub idle_ticks: u64,
    pub kernel_ticks: u64,
    pub user_ticks: u64,
    pub total_switches: u64,
    pub total_spawns: u64,
    pub total_reclaimed: u64,
    pub preemptions: u64,
    pub yields: u64,
}

impl fmt::Display for TickStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Thread: {} idle ticks, {} kernel ticks, {} user ticks",
            self.idle_ticks, self.kernel_ticks, self.user_ticks
        )
    }
}
