//! Scheduler Error Handling
//!
//! Thread creation and configuration are the only fallible operations.
//! Everything else is an invariant: a violation means scheduler state can
//! no longer be trusted, and the kernel stops through `sched_assert!`.

use core::fmt;

/// Scheduler error types with detailed context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// Configured thread limit reached
    ThreadLimitReached { current: usize, max: usize },

    /// Stack allocation failed
    StackAllocationFailed { size: usize },

    /// Rejected boot configuration
    InvalidConfig { reason: &'static str },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreadLimitReached { current, max } => {
                write!(f, "Thread limit reached: {}/{}", current, max)
            }
            Self::StackAllocationFailed { size } => {
                write!(f, "Stack allocation failed: {} bytes", size)
            }
            Self::InvalidConfig { reason } => {
                write!(f, "Invalid scheduler configuration: {}", reason)
            }
        }
    }
}

impl SchedulerError {
    /// Get recovery hint for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::ThreadLimitReached { .. } => "Wait for threads to exit or increase limit",
            Self::StackAllocationFailed { .. } => "Free memory or reduce stack sizes",
            Self::InvalidConfig { .. } => "Check scheduler boot options",
        }
    }

    /// Is this a recoverable error?
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidConfig { .. } => false,
            _ => true,
        }
    }

    /// Get error severity (0-3)
    pub fn severity(&self) -> u8 {
        match self {
            Self::InvalidConfig { .. } => 3,
            Self::StackAllocationFailed { .. } => 2,
            Self::ThreadLimitReached { .. } => 2,
        }
    }
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Log a scheduler error with its hint and hand it back
#[macro_export]
macro_rules! sched_error {
    ($err:expr) => {{
        let err = $err;
        log::error!("[SCHED] Error: {} (hint: {})", err, err.recovery_hint());
        err
    }};
}

/// Halt on a broken scheduler invariant
#[macro_export]
macro_rules! sched_fatal {
    ($reason:expr) => {
        panic!("[SCHED CRITICAL] Invariant violated: {}", $reason)
    };
    ($fmt:expr, $($arg:tt)+) => {
        panic!(
            "[SCHED CRITICAL] Invariant violated: {}",
            format_args!($fmt, $($arg)+)
        )
    };
}

/// Macro for critical scheduler assertions
#[macro_export]
macro_rules! sched_assert {
    ($cond:expr, $reason:expr) => {
        if !$cond {
            $crate::sched_fatal!($reason);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::sched_fatal!($fmt, $($arg)+);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SchedulerError::ThreadLimitReached { current: 8, max: 8 };
        assert_eq!(alloc::format!("{}", err), "Thread limit reached: 8/8");
    }

    #[test]
    fn test_classification() {
        let oom = SchedulerError::StackAllocationFailed { size: 4096 };
        assert!(oom.is_recoverable());
        assert_eq!(oom.severity(), 2);
        let cfg = SchedulerError::InvalidConfig { reason: "zero time slice" };
        assert!(!cfg.is_recoverable());
        assert_eq!(cfg.recovery_hint(), "Check scheduler boot options");
    }

    #[test]
    #[should_panic(expected = "Invariant violated: tick 3")]
    fn test_sched_assert_formats() {
        let tick = 3;
        sched_assert!(tick == 0, "tick {}", tick);
    }

    #[test]
    #[should_panic(expected = "[SCHED CRITICAL] Invariant violated: no idle thread")]
    fn test_sched_fatal() {
        crate::sched_fatal!("no {} thread", "idle");
    }
}
