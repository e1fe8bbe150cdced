//! Scheduler core module
//!
//! - `scheduler`: thread lifecycle, blocking, yield and the context switch
//! - `ready_queue` / `sleep_queue`: runnable and sleeping threads
//! - `registry`: thread records and the all-threads list
//! - `statistics`: tick attribution and lifecycle counters

pub mod error;
pub mod ready_queue;
pub mod registry;
pub mod scheduler;
pub mod sleep_queue;
pub mod statistics;

pub use error::{SchedulerError, SchedulerResult};
pub use ready_queue::ReadyQueue;
pub use registry::ThreadRegistry;
pub use scheduler::{Scheduler, SchedulerState};
pub use sleep_queue::SleepQueue;
pub use statistics::{SchedulerStats, TickKind, TickStats};
