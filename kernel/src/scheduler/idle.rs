//! Idle Thread Implementation
//!
//! The idle thread runs only when no other thread is ready. It is never
//! placed in the ready queue: the scheduler falls back to it when the
//! queue is empty.
//!
//! # Design
//! - Created by `start`, lowest priority
//! - Each pass blocks itself, then halts until the next interrupt
//! - Enabling interrupts and halting is a single step, so a wakeup
//!   arriving in between cannot be lost

use super::core::{Scheduler, SchedulerResult};
use super::thread::{ThreadFunc, ThreadId, PRI_MIN};
use crate::arch::Cpu;
use crate::sched_assert;
use log::info;

impl<C: Cpu> Scheduler<C> {
    /// Create the idle thread and turn on preemption.
    ///
    /// `idle_entry` is the platform's idle thread body; it must end up in
    /// [`Scheduler::idle_loop`].
    pub fn start(&self, idle_entry: ThreadFunc, arg: usize) -> SchedulerResult<ThreadId> {
        let started = self.with_scheduler_lock(|s| s.idle.is_some());
        sched_assert!(!started, "scheduler started twice");

        let tid = self.spawn_blocked("idle", PRI_MIN, idle_entry, arg)?;
        self.with_scheduler_lock(|s| s.idle = Some(tid));
        info!("[SCHED] Idle thread ready (TID {})", tid);

        self.cpu().enable_interrupts();
        Ok(tid)
    }

    pub fn idle_tid(&self) -> Option<ThreadId> {
        self.with_scheduler_lock(|s| s.idle)
    }

    /// Body of the idle thread
    pub fn idle_loop(&self) -> ! {
        loop {
            self.idle_once();
        }
    }

    /// One idle pass: let others run, then halt until an interrupt
    pub fn idle_once(&self) {
        self.cpu().disable_interrupts();
        self.thread_block();
        self.cpu().wait_for_interrupt();
    }
}
