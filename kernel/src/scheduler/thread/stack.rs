//! Stack - Thread stack allocation and management
//!
//! Each thread exclusively owns its kernel stack. The lowest word holds a
//! canary: a stack that grew past its base overwrites it first.

use crate::scheduler::core::error::{SchedulerError, SchedulerResult};
use alloc::boxed::Box;
use alloc::vec::Vec;

/// Default kernel stack size (4KB)
pub const DEFAULT_KERNEL_STACK_SIZE: usize = 4 * 1024;

/// Smallest stack accepted by the configuration
pub const MIN_STACK_SIZE: usize = 1024;

/// Written at the base of every owned stack
pub const STACK_CANARY: u64 = 0x5ac3_d0f1_7e11_a9b2;

const CANARY_LEN: usize = core::mem::size_of::<u64>();

/// Thread stack
pub struct ThreadStack {
    /// Backing memory, `None` for a stack we did not allocate
    memory: Option<Box<[u8]>>,

    /// Stack base (lowest address)
    base: usize,

    /// Stack size (bytes)
    size: usize,
}

impl ThreadStack {
    /// Allocate new stack.
    ///
    /// Fails instead of aborting when the allocator is exhausted.
    pub fn allocate(size: usize) -> SchedulerResult<Self> {
        let mut buffer: Vec<u8> = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|_| SchedulerError::StackAllocationFailed { size })?;
        buffer.resize(size, 0);

        let mut memory = buffer.into_boxed_slice();
        if size >= CANARY_LEN {
            memory[..CANARY_LEN].copy_from_slice(&STACK_CANARY.to_ne_bytes());
        }

        let base = memory.as_ptr() as usize;
        Ok(Self {
            memory: Some(memory),
            base,
            size,
        })
    }

    /// Describe a stack set up before the scheduler existed (the boot
    /// stack). It is never freed by the scheduler.
    pub fn external(base: usize, size: usize) -> Self {
        Self {
            memory: None,
            base,
            size,
        }
    }

    /// Get stack base address
    pub fn base(&self) -> usize {
        self.base
    }

    /// Get stack top address (initial stack pointer)
    pub fn top(&self) -> usize {
        self.base + self.size
    }

    /// Get stack size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Check if address is within stack
    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.base && addr < self.top()
    }

    /// True when the memory was allocated by (and will be freed with) the
    /// owning thread record
    pub fn is_owned(&self) -> bool {
        self.memory.is_some()
    }

    /// Check the canary; external stacks carry none and always pass
    pub fn is_intact(&self) -> bool {
        match &self.memory {
            Some(memory) if memory.len() >= CANARY_LEN => {
                memory[..CANARY_LEN] == STACK_CANARY.to_ne_bytes()
            }
            _ => true,
        }
    }

    #[cfg(test)]
    pub(crate) fn smash_canary(&mut self) {
        if let Some(memory) = self.memory.as_mut() {
            memory[0] ^= 0xff;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocated_stack_layout() {
        let stack = ThreadStack::allocate(DEFAULT_KERNEL_STACK_SIZE).unwrap();
        assert!(stack.is_owned());
        assert!(stack.is_intact());
        assert_eq!(stack.top() - stack.base(), DEFAULT_KERNEL_STACK_SIZE);
        assert!(stack.contains(stack.base()));
        assert!(!stack.contains(stack.top()));
    }

    #[test]
    fn test_overflow_detected() {
        let mut stack = ThreadStack::allocate(MIN_STACK_SIZE).unwrap();
        stack.smash_canary();
        assert!(!stack.is_intact());
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let err = ThreadStack::allocate(usize::MAX).err();
        assert_eq!(err, Some(SchedulerError::StackAllocationFailed { size: usize::MAX }));
    }

    #[test]
    fn test_external_stack_not_owned() {
        let stack = ThreadStack::external(0x8000, 0x1000);
        assert!(!stack.is_owned());
        assert!(stack.is_intact());
        assert_eq!(stack.top(), 0x9000);
    }
}
