//! Scheduler Core - priority round-robin / MLFQS on a single CPU
//!
//! # Design
//! - One `SchedulerState` behind a `spin::Mutex`, only ever locked with
//!   interrupts masked (`with_scheduler_lock`)
//! - Ready threads are picked by highest priority; the idle thread runs
//!   when nothing is ready and is never queued
//! - The context switch happens after the lock is released but before
//!   interrupts are restored
//! - A dying thread's record is freed by whichever thread runs next,
//!   never by the dying thread itself

use super::error::{SchedulerError, SchedulerResult};
use super::ready_queue::ReadyQueue;
use super::registry::ThreadRegistry;
use super::sleep_queue::SleepQueue;
use super::statistics::{SchedulerStats, TickStats};
use crate::arch::{ContextHandle, Cpu, InterruptGuard};
use crate::config::SchedConfig;
use crate::scheduler::fixed_point::FixedPoint;
use crate::scheduler::mlfqs;
use crate::scheduler::thread::{
    Priority, Thread, ThreadFunc, ThreadId, ThreadStack, ThreadState, TidAllocator, NICE_DEFAULT,
    PRI_DEFAULT, PRI_MIN,
};
use crate::{sched_assert, sched_error, sched_fatal};
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};
use log::{debug, info, warn};
use spin::{Mutex, MutexGuard};

/// Process-wide scheduling state
pub struct SchedulerState {
    pub(crate) registry: ThreadRegistry,
    pub(crate) ready: ReadyQueue,
    pub(crate) sleeping: SleepQueue,

    /// Thread owning the CPU
    pub(crate) current: ThreadId,

    pub(crate) idle: Option<ThreadId>,

    /// Bootstrap thread; its record is never freed
    pub(crate) initial: ThreadId,

    pub(crate) load_avg: FixedPoint,

    /// Ticks since the running thread was switched in
    pub(crate) slice_ticks: u32,

    /// Thread we are switching away from, consumed at the end of the switch
    pub(crate) switching_from: Option<ThreadId>,
}

impl SchedulerState {
    fn new(initial: ThreadId) -> Self {
        Self {
            registry: ThreadRegistry::new(),
            ready: ReadyQueue::new(),
            sleeping: SleepQueue::new(),
            current: initial,
            idle: None,
            initial,
            load_avg: FixedPoint::ZERO,
            slice_ticks: 0,
            switching_from: None,
        }
    }

    pub fn current(&self) -> ThreadId {
        self.current
    }

    pub fn idle(&self) -> Option<ThreadId> {
        self.idle
    }

    pub fn is_idle(&self, tid: ThreadId) -> bool {
        self.idle == Some(tid)
    }

    pub fn load_avg(&self) -> FixedPoint {
        self.load_avg
    }

    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Record of `tid`; the thread must not have been reclaimed
    pub fn thread(&self, tid: ThreadId) -> &Thread {
        match self.registry.get(tid) {
            Some(thread) => thread,
            None => sched_fatal!("no record for thread {}", tid),
        }
    }

    pub(crate) fn thread_mut(&mut self, tid: ThreadId) -> &mut Thread {
        match self.registry.get_mut(tid) {
            Some(thread) => thread,
            None => sched_fatal!("no record for thread {}", tid),
        }
    }

    /// The running thread, after checking it is intact
    pub(crate) fn current_mut(&mut self) -> &mut Thread {
        let tid = self.current;
        let thread = self.thread_mut(tid);
        sched_assert!(
            thread.is_valid(),
            "thread {} record corrupted (stack overflow?)",
            tid
        );
        sched_assert!(
            thread.state() == ThreadState::Running,
            "current thread {} is {}",
            tid,
            thread.state()
        );
        thread
    }

    /// Highest priority among ready threads
    pub(crate) fn ready_max(&self) -> Option<Priority> {
        let registry = &self.registry;
        self.ready
            .max_priority(|tid| registry.get(tid).map_or(PRI_MIN, |t| t.priority()))
    }

    /// Remove the highest-priority ready thread, or fall back to idle
    pub(crate) fn pick_next(&mut self) -> ThreadId {
        let registry = &self.registry;
        let next = self
            .ready
            .pop_highest(|tid| registry.get(tid).map_or(PRI_MIN, |t| t.priority()));
        match (next, self.idle) {
            (Some(tid), _) => tid,
            (None, Some(idle)) => idle,
            (None, None) => sched_fatal!("nothing to run and no idle thread"),
        }
    }

    /// Blocked -> Ready, queued at the back
    pub(crate) fn make_ready(&mut self, tid: ThreadId) {
        sched_assert!(!self.is_idle(tid), "idle thread {} cannot be queued", tid);
        let thread = self.thread_mut(tid);
        sched_assert!(thread.is_valid(), "unblocking corrupted thread {}", tid);
        sched_assert!(
            thread.state() == ThreadState::Blocked,
            "unblocking thread {} which is {}",
            tid,
            thread.state()
        );
        thread.set_wakeup_tick(None);
        thread.set_state(ThreadState::Ready);
        self.ready.push(tid);
    }
}

/// Kernel thread scheduler for one CPU
pub struct Scheduler<C: Cpu> {
    cpu: C,
    config: SchedConfig,
    state: Mutex<SchedulerState>,
    tids: TidAllocator,
    pub(crate) stats: SchedulerStats,
    yield_on_return: AtomicBool,
}

impl<C: Cpu> Scheduler<C> {
    /// Turn the code that is running now into the bootstrap thread "main".
    ///
    /// Must be called with interrupts disabled, before any other thread
    /// exists. `boot_stack` describes the stack we are running on.
    pub fn new(cpu: C, config: SchedConfig, boot_stack: ThreadStack) -> SchedulerResult<Self> {
        config.validate()?;
        sched_assert!(
            !cpu.interrupts_enabled(),
            "scheduler initialised with interrupts enabled"
        );

        let tids = TidAllocator::new();
        let tid = tids.allocate();
        let mut main = Box::new(Thread::new(tid, "main", PRI_DEFAULT, boot_stack));
        if config.is_mlfqs() {
            main.set_priority(mlfqs::priority_for(FixedPoint::ZERO, NICE_DEFAULT));
        }
        main.set_state(ThreadState::Running);

        let mut state = SchedulerState::new(tid);
        state.registry.insert(main);

        info!(
            "[SCHED] Initialized ({:?}, slice {} ticks, {} Hz)",
            config.policy, config.time_slice, config.timer_freq
        );

        Ok(Self {
            cpu,
            config,
            state: Mutex::new(state),
            tids,
            stats: SchedulerStats::new(),
            yield_on_return: AtomicBool::new(false),
        })
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn config(&self) -> &SchedConfig {
        &self.config
    }

    /// Mask interrupts until the guard is dropped
    pub fn disable_interrupts(&self) -> InterruptGuard<'_, C> {
        InterruptGuard::new(&self.cpu)
    }

    /// Run `f` on the scheduler state with interrupts masked.
    ///
    /// Nesting is fatal: `f` must not call back into the scheduler.
    pub fn with_scheduler_lock<R>(&self, f: impl FnOnce(&mut SchedulerState) -> R) -> R {
        let _guard = InterruptGuard::new(&self.cpu);
        let mut state = self.lock_state();
        f(&mut state)
    }

    /// Caller has masked interrupts
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        sched_assert!(
            !self.cpu.interrupts_enabled(),
            "scheduler state touched with interrupts enabled"
        );
        match self.state.try_lock() {
            Some(state) => state,
            None => sched_fatal!("scheduler state re-entered"),
        }
    }

    // ── Creation ──────────────────────────────────────────────────────────

    /// Create a kernel thread running `entry(arg)` and make it ready.
    ///
    /// If the new thread outranks the caller, the caller yields before
    /// this returns. The relative start order of threads created back to
    /// back is otherwise unspecified.
    pub fn thread_create(
        &self,
        name: &str,
        priority: Priority,
        entry: ThreadFunc,
        arg: usize,
    ) -> SchedulerResult<ThreadId> {
        let tid = self.spawn_blocked(name, priority, entry, arg)?;
        self.unblock(tid);
        self.yield_if_preempted();
        Ok(tid)
    }

    /// Allocate, initialise and register a thread, leaving it Blocked
    pub(crate) fn spawn_blocked(
        &self,
        name: &str,
        priority: Priority,
        entry: ThreadFunc,
        arg: usize,
    ) -> SchedulerResult<ThreadId> {
        if let Some(max) = self.config.max_threads {
            let live = self.with_scheduler_lock(|s| s.registry.live_count());
            if live >= max {
                return Err(sched_error!(SchedulerError::ThreadLimitReached { current: live, max }));
            }
        }

        let stack = ThreadStack::allocate(self.config.stack_size).map_err(|e| sched_error!(e))?;
        let tid = self.tids.allocate();
        let mut thread = Box::new(Thread::new(tid, name, priority, stack));
        if self.config.is_mlfqs() {
            thread.set_nice(NICE_DEFAULT);
            thread.set_recent_cpu(FixedPoint::ZERO);
            thread.set_priority(mlfqs::priority_for(FixedPoint::ZERO, NICE_DEFAULT));
        }

        // The first-run frame must never be observed half built
        self.with_scheduler_lock(|s| {
            let context = self.cpu.prepare_initial_context(thread.stack(), entry, arg);
            thread.set_context(context);
            s.registry.insert(thread);
        });
        self.stats.record_spawn();

        debug!("[SCHED] Thread '{}' (TID {}) created, priority {}", name, tid, priority);
        Ok(tid)
    }

    /// Entered by a thread's first-run frame on its own stack
    pub fn run_thread(&self, entry: ThreadFunc, arg: usize) -> ! {
        self.schedule_tail();
        self.cpu.enable_interrupts();
        entry(arg);
        self.thread_exit()
    }

    // ── Core scheduling ───────────────────────────────────────────────────

    /// Remove and return the next thread to run: the highest-priority
    /// ready thread, or the idle thread when none is ready.
    ///
    /// Interrupts must be off; the result must be passed to `switch_to`.
    pub fn pick_next(&self) -> ThreadId {
        self.lock_state().pick_next()
    }

    /// Switch the CPU to `next` and finish the switch.
    ///
    /// Interrupts must be off and the running thread must already have
    /// left the Running state.
    pub fn switch_to(&self, next: ThreadId) {
        let switch: Option<(*mut ContextHandle, *const ContextHandle)> = {
            let mut state = self.lock_state();
            let cur = state.current;
            sched_assert!(
                state.thread(cur).state() != ThreadState::Running,
                "scheduling while thread {} is still running",
                cur
            );
            sched_assert!(state.thread(next).is_valid(), "switching to corrupted thread {}", next);

            if cur == next {
                None
            } else {
                state.current = next;
                state.switching_from = Some(cur);
                let from = state.thread_mut(cur).context_ptr();
                let to = state.thread_mut(next).context_ptr() as *const ContextHandle;
                Some((from, to))
            }
            // Lock released here, interrupts stay off
        };

        if let Some((from, to)) = switch {
            self.stats.record_switch();
            // SAFETY: interrupts are off and both records are boxed in the
            // registry; neither is freed before `schedule_tail` runs.
            unsafe { self.cpu.switch_context(from, to) };
        }
        self.schedule_tail();
    }

    fn schedule(&self) {
        let next = self.pick_next();
        self.switch_to(next);
    }

    /// End-of-switch bookkeeping, run by the thread that now owns the CPU
    fn schedule_tail(&self) {
        let reclaimed = {
            let mut state = self.lock_state();
            let cur = state.current;

            let thread = state.thread_mut(cur);
            thread.set_state(ThreadState::Running);
            let space = thread.address_space();
            state.slice_ticks = 0;
            self.cpu.activate_address_space(space);

            match state.switching_from.take() {
                Some(prev)
                    if prev != state.initial && state.thread(prev).state() == ThreadState::Dying =>
                {
                    sched_assert!(prev != cur, "reclaiming the running thread {}", cur);
                    state.registry.reclaim(prev)
                }
                _ => None,
            }
        };

        // Logging is safe again once the switch is complete
        if let Some(thread) = reclaimed {
            self.stats.record_reclaim();
            debug!("[SCHED] Reclaimed thread '{}' (TID {})", thread.name(), thread.id());
        }
    }

    // ── Blocking ──────────────────────────────────────────────────────────

    /// Put the running thread to sleep until `unblock`.
    ///
    /// Interrupts must already be off; never call from an interrupt handler.
    pub fn thread_block(&self) {
        sched_assert!(!self.cpu.in_interrupt(), "thread_block from interrupt context");
        sched_assert!(
            !self.cpu.interrupts_enabled(),
            "thread_block with interrupts enabled"
        );
        {
            let mut state = self.lock_state();
            state.current_mut().set_state(ThreadState::Blocked);
        }
        self.schedule();
    }

    /// Blocked -> Ready. Never preempts the caller: it may rely on
    /// unblocking atomically with other updates.
    ///
    /// A sleeping thread woken this way leaves the sleep queue.
    pub fn unblock(&self, tid: ThreadId) {
        self.with_scheduler_lock(|s| {
            s.sleeping.remove(tid);
            s.make_ready(tid);
        });
        debug!("[SCHED] Thread {} unblocked", tid);
    }

    /// Block the running thread until the tick counter reaches `wakeup_tick`.
    ///
    /// Returns at once if that tick has already passed.
    pub fn sleep_until(&self, wakeup_tick: u64) {
        sched_assert!(!self.cpu.in_interrupt(), "sleep from interrupt context");
        let _guard = InterruptGuard::new(&self.cpu);
        if wakeup_tick <= self.stats.ticks() {
            return;
        }
        {
            let mut state = self.lock_state();
            let cur = state.current;
            sched_assert!(!state.is_idle(cur), "idle thread cannot sleep");
            let thread = state.current_mut();
            thread.set_wakeup_tick(Some(wakeup_tick));
            thread.set_state(ThreadState::Blocked);
            state.sleeping.push(cur, wakeup_tick);
        }
        self.schedule();
    }

    /// Sleep for `ticks` timer ticks; `u64::MAX` sleeps until unblocked
    pub fn sleep_for(&self, ticks: u64) {
        self.sleep_until(self.ticks().saturating_add(ticks));
    }

    // ── Yield & exit ──────────────────────────────────────────────────────

    /// Give up the CPU; the caller stays ready and may be picked again at once
    pub fn thread_yield(&self) {
        sched_assert!(!self.cpu.in_interrupt(), "thread_yield from interrupt context");
        let _guard = InterruptGuard::new(&self.cpu);
        {
            let mut state = self.lock_state();
            let cur = state.current;
            // Idle is never queued; it runs again only when nothing is ready
            if state.is_idle(cur) {
                state.current_mut().set_state(ThreadState::Blocked);
            } else {
                state.current_mut().set_state(ThreadState::Ready);
                state.ready.push(cur);
            }
        }
        self.stats.record_yield();
        self.schedule();
    }

    /// Yield if a ready thread strictly outranks the running one.
    ///
    /// From interrupt context the yield is deferred to interrupt return.
    pub fn yield_if_preempted(&self) {
        let preempted = self.with_scheduler_lock(|s| {
            let cur = s.current;
            if s.is_idle(cur) {
                return !s.ready.is_empty();
            }
            let priority = s.thread(cur).priority();
            s.ready_max().map_or(false, |max| max > priority)
        });

        if preempted {
            if self.cpu.in_interrupt() {
                self.request_yield_on_return();
            } else {
                self.thread_yield();
            }
        }
    }

    /// Retire the running thread and switch away.
    ///
    /// On hardware this never returns: the record is freed by the next
    /// thread. Use `thread_exit` outside of tests.
    pub fn exit_current(&self) {
        sched_assert!(!self.cpu.in_interrupt(), "thread_exit from interrupt context");
        let _guard = InterruptGuard::new(&self.cpu);
        {
            let mut state = self.lock_state();
            let cur = state.current;
            sched_assert!(!state.is_idle(cur), "idle thread cannot exit");
            state.registry.unlink(cur);
            state.current_mut().set_state(ThreadState::Dying);
            debug!("[SCHED] Thread {} exiting", cur);
        }
        self.schedule();
    }

    /// Deschedule and destroy the running thread
    pub fn thread_exit(&self) -> ! {
        self.exit_current();
        unreachable!("dying thread was scheduled again");
    }

    // ── Deferred preemption ───────────────────────────────────────────────

    pub(crate) fn request_yield_on_return(&self) -> bool {
        self.yield_on_return.swap(true, Ordering::AcqRel)
    }

    /// True if a yield is waiting for the current interrupt to return
    pub fn yield_pending(&self) -> bool {
        self.yield_on_return.load(Ordering::Acquire)
    }

    /// Called by the platform's interrupt exit path, outside the handler,
    /// before interrupts are re-enabled.
    pub fn on_interrupt_return(&self) {
        sched_assert!(!self.cpu.in_interrupt(), "interrupt return while still in handler");
        if self.yield_on_return.swap(false, Ordering::AcqRel) {
            self.thread_yield();
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn current_tid(&self) -> ThreadId {
        self.with_current(|t| t.id())
    }

    pub fn current_name(&self) -> String {
        self.with_current(|t| String::from(t.name()))
    }

    pub fn current_priority(&self) -> Priority {
        self.with_current(|t| t.priority())
    }

    /// Run `f` on the running thread
    pub fn with_current<R>(&self, f: impl FnOnce(&mut Thread) -> R) -> R {
        self.with_scheduler_lock(|s| f(s.current_mut()))
    }

    /// Run `f` on a live thread, if `tid` names one
    pub fn with_thread<R>(&self, tid: ThreadId, f: impl FnOnce(&mut Thread) -> R) -> Option<R> {
        self.with_scheduler_lock(|s| {
            if s.registry.is_live(tid) {
                s.registry.get_mut(tid).map(f)
            } else {
                None
            }
        })
    }

    /// Set the running thread's base priority and yield if it no longer
    /// has the highest. Ignored under MLFQS, where priorities are derived.
    pub fn set_priority(&self, priority: Priority) {
        if self.config.is_mlfqs() {
            warn!("[SCHED] set_priority({}) ignored under MLFQS", priority);
            return;
        }
        self.with_current(|t| t.set_priority(priority));
        self.yield_if_preempted();
    }

    /// Visit every live thread. Interrupts must already be off.
    pub fn for_each_thread(&self, f: impl FnMut(&mut Thread)) {
        sched_assert!(
            !self.cpu.interrupts_enabled(),
            "for_each_thread with interrupts enabled"
        );
        self.lock_state().registry.for_each_live_mut(f);
    }

    /// State of a thread whose record has not been freed yet
    pub fn thread_state(&self, tid: ThreadId) -> Option<ThreadState> {
        self.with_scheduler_lock(|s| s.registry.get(tid).map(|t| t.state()))
    }

    /// Live thread ids in creation order
    pub fn live_threads(&self) -> Vec<ThreadId> {
        self.with_scheduler_lock(|s| s.registry.live().to_vec())
    }

    pub fn ready_count(&self) -> usize {
        self.with_scheduler_lock(|s| s.ready.len())
    }

    pub fn sleeping_count(&self) -> usize {
        self.with_scheduler_lock(|s| s.sleeping.len())
    }

    /// Timer ticks since boot
    pub fn ticks(&self) -> u64 {
        self.stats.ticks()
    }

    pub fn elapsed_since(&self, then: u64) -> u64 {
        self.ticks().saturating_sub(then)
    }

    pub fn tick_stats(&self) -> TickStats {
        self.stats.snapshot()
    }

    pub fn print_stats(&self) {
        info!("{}", self.tick_stats());
    }
}
