//! Scheduler scenario tests
//!
//! Run on the host against `SimCpu`: a context switch returns at once and
//! the test carries on as the thread that was switched to.

mod mlfqs_tests;

use crate::arch::sim::SimCpu;
use crate::arch::Cpu;
use crate::config::SchedConfig;
use crate::scheduler::thread::{ThreadId, ThreadStack, ThreadState, DEFAULT_KERNEL_STACK_SIZE};
use crate::scheduler::Scheduler;

pub(crate) fn noop(_arg: usize) {}

/// Scheduler with only the bootstrap thread
pub(crate) fn boot(config: SchedConfig) -> Scheduler<SimCpu> {
    let boot_stack = ThreadStack::allocate(DEFAULT_KERNEL_STACK_SIZE).unwrap();
    Scheduler::new(SimCpu::new(), config, boot_stack).unwrap()
}

/// Scheduler with the idle thread created and interrupts on
pub(crate) fn boot_started(config: SchedConfig) -> Scheduler<SimCpu> {
    let sched = boot(config);
    sched.start(noop, 0).unwrap();
    sched
}

/// Deliver one timer interrupt, including the interrupt-return path
pub(crate) fn timer_tick(sched: &Scheduler<SimCpu>) {
    sched.cpu().interrupt(|| sched.tick());
    sched.on_interrupt_return();
}

pub(crate) fn running_threads(sched: &Scheduler<SimCpu>) -> usize {
    sched
        .live_threads()
        .into_iter()
        .filter(|&tid| sched.thread_state(tid) == Some(ThreadState::Running))
        .count()
}

/// Block the running thread, as a lock or semaphore would
pub(crate) fn block(sched: &Scheduler<SimCpu>) {
    let _guard = sched.disable_interrupts();
    sched.thread_block();
}

pub(crate) fn priority_of(sched: &Scheduler<SimCpu>, tid: ThreadId) -> i32 {
    sched.with_thread(tid, |t| t.priority()).unwrap()
}

#[test]
fn test_boot_thread_is_main() {
    let sched = boot(SchedConfig::default());
    assert_eq!(sched.current_tid(), 1);
    assert_eq!(sched.current_name(), "main");
    assert_eq!(sched.current_priority(), crate::scheduler::PRI_DEFAULT);
    assert!(!sched.cpu().interrupts_enabled());
    assert_eq!(sched.idle_tid(), None);
}
