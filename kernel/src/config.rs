//! Scheduler boot configuration
//!
//! The policy is picked once from the kernel command line and never
//! changes afterwards.

use crate::scheduler::core::error::{SchedulerError, SchedulerResult};
use crate::scheduler::thread::{DEFAULT_KERNEL_STACK_SIZE, MIN_STACK_SIZE};

/// Ticks a thread may run before preemption is requested
pub const TIME_SLICE: u32 = 4;

/// Timer interrupts per second
pub const TIMER_FREQ: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedPolicy {
    /// Fixed priorities, round-robin within the time slice
    #[default]
    RoundRobin,

    /// Multi-level feedback queue: priorities derived from CPU usage
    Mlfqs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedConfig {
    pub policy: SchedPolicy,
    pub time_slice: u32,
    pub timer_freq: u64,
    pub stack_size: usize,
    /// Live thread cap, `None` for no limit
    pub max_threads: Option<usize>,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            policy: SchedPolicy::RoundRobin,
            time_slice: TIME_SLICE,
            timer_freq: TIMER_FREQ,
            stack_size: DEFAULT_KERNEL_STACK_SIZE,
            max_threads: None,
        }
    }
}

impl SchedConfig {
    pub fn mlfqs() -> Self {
        Self {
            policy: SchedPolicy::Mlfqs,
            ..Self::default()
        }
    }

    /// Parse the kernel command line.
    ///
    /// `-mlfqs` and `-o mlfqs` select MLFQS; everything else is left to
    /// other subsystems.
    pub fn from_cmdline(cmdline: &str) -> Self {
        let mut config = Self::default();
        let mut tokens = cmdline.split_whitespace();
        while let Some(token) = tokens.next() {
            match token {
                "-mlfqs" => config.policy = SchedPolicy::Mlfqs,
                "-o" => {
                    if tokens.next() == Some("mlfqs") {
                        config.policy = SchedPolicy::Mlfqs;
                    }
                }
                _ => {}
            }
        }
        config
    }

    pub fn is_mlfqs(&self) -> bool {
        self.policy == SchedPolicy::Mlfqs
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        if self.time_slice == 0 {
            return Err(SchedulerError::InvalidConfig { reason: "zero time slice" });
        }
        if !(19..=1000).contains(&self.timer_freq) {
            return Err(SchedulerError::InvalidConfig {
                reason: "timer frequency outside 19..=1000 Hz",
            });
        }
        if self.stack_size < MIN_STACK_SIZE {
            return Err(SchedulerError::InvalidConfig { reason: "stack too small" });
        }
        if self.max_threads == Some(0) {
            return Err(SchedulerError::InvalidConfig { reason: "thread limit of zero" });
        }
        Ok(())
    }
}
