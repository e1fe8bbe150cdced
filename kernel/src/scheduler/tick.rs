//! Timer tick dispatch
//!
//! Called from the timer interrupt handler, once per tick, in this order:
//! 1. count the tick (idle / kernel / user)
//! 2. MLFQS bookkeeping, when enabled
//! 3. request a yield on interrupt return if the time slice ran out
//! 4. wake every sleeper whose wakeup tick has been reached

use super::core::statistics::TickKind;
use super::core::{Scheduler, SchedulerState};
use crate::arch::Cpu;
use crate::sched_assert;
use crate::scheduler::thread::ThreadState;
use log::trace;

impl<C: Cpu> Scheduler<C> {
    /// Timer interrupt entry point
    pub fn tick(&self) {
        let mut state = self.lock_state();
        let cur = state.current;

        let kind = if state.is_idle(cur) {
            TickKind::Idle
        } else if state.thread(cur).address_space().is_some() {
            TickKind::User
        } else {
            TickKind::Kernel
        };
        let now = self.stats.record_tick(kind);

        if self.config().is_mlfqs() {
            state.mlfqs_tick(now, self.config().timer_freq);
        }

        state.slice_ticks += 1;
        if state.slice_ticks >= self.config().time_slice && !self.request_yield_on_return() {
            self.stats.record_preemption();
        }

        let woken = state.wake_sleepers(now);
        if woken > 0 {
            trace!("[SCHED] tick {}: woke {} thread(s)", now, woken);
        }
    }
}

impl SchedulerState {
    /// Move every due sleeper to the ready queue; returns how many woke
    pub(crate) fn wake_sleepers(&mut self, now: u64) -> usize {
        let due = self.sleeping.take_due(now);
        for &tid in &due {
            sched_assert!(
                self.thread(tid).state() == ThreadState::Blocked,
                "sleeping thread {} is not blocked",
                tid
            );
            self.make_ready(tid);
        }
        due.len()
    }
}
