//! Simulated CPU for host tests.
//!
//! `switch_context` records the switch and returns at once, so after a
//! call that switches threads the test keeps running "as" the thread that
//! was switched to.

use super::{ContextHandle, Cpu};
use crate::scheduler::thread::{ThreadFunc, ThreadStack};
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use spin::Mutex;

pub struct SimCpu {
    interrupts: AtomicBool,
    in_irq: AtomicBool,
    switches: Mutex<Vec<(usize, usize)>>,
    activations: Mutex<Vec<Option<usize>>>,
    halts: AtomicUsize,
}

impl SimCpu {
    /// Boots with interrupts disabled, like real hardware
    pub fn new() -> Self {
        Self {
            interrupts: AtomicBool::new(false),
            in_irq: AtomicBool::new(false),
            switches: Mutex::new(Vec::new()),
            activations: Mutex::new(Vec::new()),
            halts: AtomicUsize::new(0),
        }
    }

    /// Run `f` as an external interrupt handler
    pub fn interrupt<R>(&self, f: impl FnOnce() -> R) -> R {
        let was_enabled = self.interrupts.swap(false, Ordering::SeqCst);
        self.in_irq.store(true, Ordering::SeqCst);
        let result = f();
        self.in_irq.store(false, Ordering::SeqCst);
        self.interrupts.store(was_enabled, Ordering::SeqCst);
        result
    }

    /// `(from, to)` saved stack pointers of every switch so far
    pub fn switches(&self) -> Vec<(usize, usize)> {
        self.switches.lock().clone()
    }

    pub fn switch_count(&self) -> usize {
        self.switches.lock().len()
    }

    pub fn activations(&self) -> Vec<Option<usize>> {
        self.activations.lock().clone()
    }

    pub fn halt_count(&self) -> usize {
        self.halts.load(Ordering::SeqCst)
    }
}

impl Cpu for SimCpu {
    fn interrupts_enabled(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst)
    }

    fn disable_interrupts(&self) {
        self.interrupts.store(false, Ordering::SeqCst);
    }

    fn enable_interrupts(&self) {
        self.interrupts.store(true, Ordering::SeqCst);
    }

    fn in_interrupt(&self) -> bool {
        self.in_irq.load(Ordering::SeqCst)
    }

    fn prepare_initial_context(
        &self,
        stack: &ThreadStack,
        _entry: ThreadFunc,
        _arg: usize,
    ) -> ContextHandle {
        ContextHandle::new(stack.top())
    }

    unsafe fn switch_context(&self, from: *mut ContextHandle, to: *const ContextHandle) {
        let from_sp = (*from).stack_pointer();
        let to_sp = (*to).stack_pointer();
        self.switches.lock().push((from_sp, to_sp));
    }

    fn wait_for_interrupt(&self) {
        self.halts.fetch_add(1, Ordering::SeqCst);
        self.enable_interrupts();
    }

    fn activate_address_space(&self, space: Option<usize>) {
        self.activations.lock().push(space);
    }
}
