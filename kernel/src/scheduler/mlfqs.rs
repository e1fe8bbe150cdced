//! MLFQS - Multi-level feedback queue scheduling
//!
//! Priorities are derived, not assigned:
//! - every tick the running thread is charged one unit of `recent_cpu`
//! - every 4th tick all priorities are recomputed
//! - once per second the load average is updated, then every thread's
//!   `recent_cpu` decays by `2·load / (2·load + 1)`
//!
//! All arithmetic is 17.14 fixed point.

use crate::arch::Cpu;
use crate::scheduler::core::{Scheduler, SchedulerState};
use crate::scheduler::fixed_point::FixedPoint;
use crate::scheduler::thread::{Priority, NICE_MAX, NICE_MIN, PRI_MAX, PRI_MIN};
use log::trace;

/// Ticks between priority recalculations
pub const PRIORITY_PERIOD: u64 = 4;

/// `PRI_MAX - recent_cpu/4 - 2·nice`, clamped to the priority range
pub fn priority_for(recent_cpu: FixedPoint, nice: i32) -> Priority {
    let priority = PRI_MAX - (recent_cpu / 4).to_int() - nice * 2;
    priority.clamp(PRI_MIN, PRI_MAX)
}

/// `(59/60)·load_avg + (1/60)·ready_threads`
pub fn next_load_avg(load_avg: FixedPoint, ready_threads: i32) -> FixedPoint {
    (load_avg * 59) / 60 + FixedPoint::int_div_int(ready_threads, 60)
}

/// `(2·load_avg)/(2·load_avg + 1)·recent_cpu + nice`
pub fn decayed_recent_cpu(recent_cpu: FixedPoint, load_avg: FixedPoint, nice: i32) -> FixedPoint {
    let twice_load = load_avg * 2;
    let coefficient = twice_load / (twice_load + 1);
    coefficient * recent_cpu + nice
}

impl SchedulerState {
    /// Threads ready to run, counting the running one unless it is idle
    fn ready_threads(&self) -> i32 {
        let running = if self.is_idle(self.current) { 0 } else { 1 };
        self.ready.len() as i32 + running
    }

    /// Per-tick MLFQS bookkeeping. `now` is the tick just counted.
    pub(crate) fn mlfqs_tick(&mut self, now: u64, timer_freq: u64) {
        let cur = self.current;
        if !self.is_idle(cur) {
            self.thread_mut(cur).charge_tick();
        }

        if now % PRIORITY_PERIOD == 0 {
            self.recompute_priorities();
        }

        if now % timer_freq == 0 {
            self.load_avg = next_load_avg(self.load_avg, self.ready_threads());
            self.decay_recent_cpu();
            trace!("[MLFQS] tick {}: load_avg {}", now, self.load_avg);
        }
    }

    fn recompute_priorities(&mut self) {
        self.registry.for_each_live_mut(|t| {
            t.set_priority(priority_for(t.recent_cpu(), t.nice()));
        });
    }

    fn decay_recent_cpu(&mut self) {
        let load_avg = self.load_avg;
        self.registry.for_each_live_mut(|t| {
            t.set_recent_cpu(decayed_recent_cpu(t.recent_cpu(), load_avg, t.nice()));
        });
    }
}

impl<C: Cpu> Scheduler<C> {
    /// Set the running thread's nice value, clamped to `NICE_MIN..=NICE_MAX`.
    ///
    /// Under MLFQS the thread's priority is recomputed at once, and it
    /// yields if a ready thread now outranks it.
    pub fn set_nice(&self, nice: i32) {
        let nice = nice.clamp(NICE_MIN, NICE_MAX);
        let mlfqs = self.config().is_mlfqs();
        let preempted = self.with_scheduler_lock(|s| {
            let thread = s.current_mut();
            thread.set_nice(nice);
            if mlfqs {
                thread.set_priority(priority_for(thread.recent_cpu(), nice));
            }
            let priority = thread.priority();
            s.ready_max().map_or(false, |max| max > priority)
        });

        if preempted {
            self.thread_yield();
        }
    }

    pub fn current_nice(&self) -> i32 {
        self.with_current(|t| t.nice())
    }

    pub fn load_avg(&self) -> FixedPoint {
        self.with_scheduler_lock(|s| s.load_avg)
    }

    /// 100 times the load average, truncated
    pub fn load_avg_x100(&self) -> i32 {
        self.load_avg().to_int_x100()
    }

    /// 100 times the running thread's `recent_cpu`, truncated
    pub fn recent_cpu_x100(&self) -> i32 {
        self.with_current(|t| t.recent_cpu().to_int_x100())
    }
}
