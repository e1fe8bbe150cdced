//! Scheduler subsystem
//!
//! Preemptive priority scheduling of kernel threads on one CPU, with an
//! optional multi-level feedback queue (MLFQS) policy.

pub mod core;
pub mod fixed_point;
pub mod idle;
pub mod mlfqs;
pub mod thread;
pub mod tick;

// Re-exports
pub use self::core::{Scheduler, SchedulerError, SchedulerResult, SchedulerState, TickStats};
pub use fixed_point::FixedPoint;
pub use thread::{
    Priority, Thread, ThreadFunc, ThreadId, ThreadStack, ThreadState, NICE_DEFAULT, NICE_MAX,
    NICE_MIN, PRI_DEFAULT, PRI_MAX, PRI_MIN,
};
