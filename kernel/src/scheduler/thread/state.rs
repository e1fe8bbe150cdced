//! State - Thread state machine
//!
//! New threads are built Blocked, then unblocked into Ready.
//! Running -> {Ready, Blocked, Dying}, Blocked -> Ready, Dying is terminal.

use core::fmt;

/// Thread state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadState {
    /// Owns the CPU; exactly one thread is in this state
    Running = 0,

    /// Waiting in the ready queue
    Ready = 1,

    /// Waiting for an unblock (lock, semaphore, sleep, first start)
    Blocked = 2,

    /// Exited; memory reclaimed once another thread runs
    Dying = 3,
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Ready => write!(f, "Ready"),
            Self::Blocked => write!(f, "Blocked"),
            Self::Dying => write!(f, "Dying"),
        }
    }
}

/// Validate state transition
pub fn validate_transition(from: ThreadState, to: ThreadState) -> bool {
    use ThreadState::*;

    match (from, to) {
        // Preemption or voluntary yield
        (Running, Ready) => true,

        (Running, Blocked) => true,

        (Running, Dying) => true,

        // Dispatch
        (Ready, Running) => true,

        // Unblock
        (Blocked, Ready) => true,

        // The idle thread is dispatched straight from Blocked
        (Blocked, Running) => true,

        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dying_is_terminal() {
        for to in [ThreadState::Running, ThreadState::Ready, ThreadState::Blocked] {
            assert!(!validate_transition(ThreadState::Dying, to));
        }
    }

    #[test]
    fn test_only_running_may_block_or_exit() {
        assert!(validate_transition(ThreadState::Running, ThreadState::Blocked));
        assert!(!validate_transition(ThreadState::Ready, ThreadState::Blocked));
        assert!(!validate_transition(ThreadState::Blocked, ThreadState::Dying));
    }
}
