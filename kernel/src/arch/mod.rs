// src/arch/mod.rs
// Abstraction d'architecture - primitives CPU consommées par l'ordonnanceur

//! CPU primitives consumed by the scheduler.
//!
//! The scheduler never touches registers, stack layout or the interrupt
//! controller itself. A platform provides one [`Cpu`] implementation and
//! the scheduler drives it through this trait.

pub mod interrupts;

#[cfg(test)]
pub mod sim;

pub use interrupts::{InterruptGuard, InterruptLevel};

use crate::scheduler::thread::{ThreadFunc, ThreadStack};

/// Saved execution context of a thread that is not running.
///
/// Opaque to the scheduler: the platform stores whatever it needs to
/// resume the thread (typically the saved stack pointer after the
/// callee-saved registers were pushed).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextHandle {
    sp: usize,
}

impl ContextHandle {
    pub const fn empty() -> Self {
        Self { sp: 0 }
    }

    pub const fn new(sp: usize) -> Self {
        Self { sp }
    }

    /// Saved stack pointer
    pub fn stack_pointer(&self) -> usize {
        self.sp
    }

    /// Updated by the switch primitive when the thread is switched out
    pub fn set_stack_pointer(&mut self, sp: usize) {
        self.sp = sp;
    }
}

/// Hardware primitives of the single CPU the scheduler runs on.
///
/// # Porting
/// Masking interrupts is the only mutual exclusion the scheduler relies
/// on. A multi-core port must pair it with a real spinlock.
pub trait Cpu {
    /// True when maskable interrupts are delivered
    fn interrupts_enabled(&self) -> bool;

    fn disable_interrupts(&self);

    fn enable_interrupts(&self);

    /// True while an external interrupt handler is executing
    fn in_interrupt(&self) -> bool;

    /// Build the first-run frame of a thread that has never executed.
    ///
    /// When first switched to, the frame must call
    /// [`Scheduler::run_thread`](crate::scheduler::Scheduler::run_thread)
    /// with `entry` and `arg` on the thread's own stack.
    fn prepare_initial_context(
        &self,
        stack: &ThreadStack,
        entry: ThreadFunc,
        arg: usize,
    ) -> ContextHandle;

    /// Save the running context into `from` and resume `to`.
    ///
    /// Returns when some later switch resumes `from`.
    ///
    /// # Safety
    /// Interrupts must be disabled. Both pointers must reference live
    /// thread records that stay allocated until the switch completes.
    unsafe fn switch_context(&self, from: *mut ContextHandle, to: *const ContextHandle);

    /// Atomically enable interrupts and halt until the next one arrives
    fn wait_for_interrupt(&self);

    /// Install the address space of the thread that was just switched in
    fn activate_address_space(&self, _space: Option<usize>) {}
}
