//! Thread Structure and Management
//!
//! The thread control block: identity, scheduling state, owned stack and
//! the metrics the MLFQS engine maintains.

use super::stack::ThreadStack;
use super::state::{validate_transition, ThreadState};
use crate::arch::ContextHandle;
use crate::scheduler::fixed_point::FixedPoint;
use crate::sched_assert;
use alloc::boxed::Box;
use spin::Mutex;

/// Thread ID type
pub type ThreadId = u64;

/// Scheduling priority, higher runs first
pub type Priority = i32;

/// Thread entry point; the argument is opaque to the scheduler
pub type ThreadFunc = fn(usize);

pub const PRI_MIN: Priority = 0;
pub const PRI_DEFAULT: Priority = 31;
pub const PRI_MAX: Priority = 63;

pub const NICE_MIN: i32 = -20;
pub const NICE_DEFAULT: i32 = 0;
pub const NICE_MAX: i32 = 20;

/// Longest name kept, in bytes
pub const MAX_NAME_LEN: usize = 15;

/// Detects a record overwritten by a stack overflow or a stray pointer
pub const THREAD_MAGIC: u32 = 0xcd6a_bf4b;

/// Thread Control Block (TCB)
pub struct Thread {
    /// Unique thread ID
    id: ThreadId,

    /// Thread name (for debugging)
    name: Box<str>,

    /// Current state
    state: ThreadState,

    /// Base priority (round-robin) or derived priority (MLFQS)
    priority: Priority,

    /// MLFQS niceness
    nice: i32,

    /// MLFQS decayed CPU usage
    recent_cpu: FixedPoint,

    /// Absolute tick at which a sleeping thread is woken
    wakeup_tick: Option<u64>,

    /// Saved context while not running
    context: ContextHandle,

    /// Kernel stack
    stack: ThreadStack,

    /// User address space, if the thread runs a user program
    address_space: Option<usize>,

    magic: u32,
}

impl Thread {
    /// Build a Blocked thread with zeroed scheduling metrics
    pub(crate) fn new(id: ThreadId, name: &str, priority: Priority, stack: ThreadStack) -> Self {
        sched_assert!(
            (PRI_MIN..=PRI_MAX).contains(&priority),
            "thread priority out of range"
        );

        Self {
            id,
            name: bounded_name(name),
            state: ThreadState::Blocked,
            priority,
            nice: NICE_DEFAULT,
            recent_cpu: FixedPoint::ZERO,
            wakeup_tick: None,
            context: ContextHandle::empty(),
            stack,
            address_space: None,
            magic: THREAD_MAGIC,
        }
    }

    /// Get thread ID
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Get thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get thread state
    pub fn state(&self) -> ThreadState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ThreadState) {
        sched_assert!(
            validate_transition(self.state, state),
            "invalid thread state transition"
        );
        self.state = state;
    }

    /// Get priority
    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub(crate) fn set_priority(&mut self, priority: Priority) {
        sched_assert!(
            (PRI_MIN..=PRI_MAX).contains(&priority),
            "thread priority out of range"
        );
        self.priority = priority;
    }

    pub fn nice(&self) -> i32 {
        self.nice
    }

    pub(crate) fn set_nice(&mut self, nice: i32) {
        self.nice = nice;
    }

    pub fn recent_cpu(&self) -> FixedPoint {
        self.recent_cpu
    }

    pub(crate) fn set_recent_cpu(&mut self, recent_cpu: FixedPoint) {
        self.recent_cpu = recent_cpu;
    }

    pub(crate) fn charge_tick(&mut self) {
        self.recent_cpu.increment();
    }

    pub fn wakeup_tick(&self) -> Option<u64> {
        self.wakeup_tick
    }

    pub(crate) fn set_wakeup_tick(&mut self, tick: Option<u64>) {
        self.wakeup_tick = tick;
    }

    pub fn address_space(&self) -> Option<usize> {
        self.address_space
    }

    /// Attach or detach a user address space (process layer)
    pub fn set_address_space(&mut self, space: Option<usize>) {
        self.address_space = space;
    }

    pub fn stack(&self) -> &ThreadStack {
        &self.stack
    }

    #[cfg(test)]
    pub(crate) fn stack_mut(&mut self) -> &mut ThreadStack {
        &mut self.stack
    }

    pub(crate) fn set_context(&mut self, context: ContextHandle) {
        self.context = context;
    }

    /// Get context pointer (for context switch)
    pub(crate) fn context_ptr(&mut self) -> *mut ContextHandle {
        &mut self.context as *mut ContextHandle
    }

    /// True if the record still looks like a thread
    pub fn is_valid(&self) -> bool {
        self.magic == THREAD_MAGIC && self.stack.is_intact()
    }

    #[cfg(test)]
    pub(crate) fn corrupt_magic(&mut self) {
        self.magic = !THREAD_MAGIC;
    }
}

/// Cut `name` to at most `MAX_NAME_LEN` bytes on a char boundary
fn bounded_name(name: &str) -> Box<str> {
    let mut end = name.len().min(MAX_NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].into()
}

/// Hands out thread ids.
///
/// Guarded by its own lock rather than interrupt masking: ids are taken
/// from contexts that run with interrupts enabled.
pub struct TidAllocator {
    next: Mutex<ThreadId>,
}

impl TidAllocator {
    pub const fn new() -> Self {
        Self {
            next: Mutex::new(1),
        }
    }

    /// Allocate a new thread ID
    pub fn allocate(&self) -> ThreadId {
        let mut next = self.next.lock();
        let tid = *next;
        *next += 1;
        tid
    }
}

impl Default for TidAllocator {
    fn default() -> Self {
        Self::new()
    }
}
