//! Thread module

pub mod thread;
pub mod state;
pub mod stack;

pub use thread::{
    Priority, Thread, ThreadFunc, ThreadId, TidAllocator, MAX_NAME_LEN, NICE_DEFAULT,
    NICE_MAX, NICE_MIN, PRI_DEFAULT, PRI_MAX, PRI_MIN, THREAD_MAGIC,
};
pub use state::ThreadState;
pub use stack::{ThreadStack, DEFAULT_KERNEL_STACK_SIZE, MIN_STACK_SIZE};
