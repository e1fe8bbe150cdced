//! Interrupt masking
//!
//! On a single CPU, disabling interrupts is the scheduler's mutex: the
//! timer handler is the only other actor that could interleave.

use super::Cpu;

/// Interrupt level before a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptLevel {
    On,
    Off,
}

impl InterruptLevel {
    pub fn current<C: Cpu + ?Sized>(cpu: &C) -> Self {
        if cpu.interrupts_enabled() {
            Self::On
        } else {
            Self::Off
        }
    }

    /// Restore this level on `cpu`
    pub fn restore<C: Cpu + ?Sized>(self, cpu: &C) {
        match self {
            Self::On => cpu.enable_interrupts(),
            Self::Off => cpu.disable_interrupts(),
        }
    }
}

/// RAII guard for disabling/restoring interrupts.
///
/// Guards nest: each one restores exactly the level it found.
pub struct InterruptGuard<'a, C: Cpu + ?Sized> {
    cpu: &'a C,
    previous: InterruptLevel,
}

impl<'a, C: Cpu + ?Sized> InterruptGuard<'a, C> {
    pub fn new(cpu: &'a C) -> Self {
        let previous = InterruptLevel::current(cpu);
        if previous == InterruptLevel::On {
            cpu.disable_interrupts();
        }
        Self { cpu, previous }
    }

    /// Level that will be restored on drop
    pub fn previous(&self) -> InterruptLevel {
        self.previous
    }
}

impl<C: Cpu + ?Sized> Drop for InterruptGuard<'_, C> {
    fn drop(&mut self) {
        if self.previous == InterruptLevel::On {
            self.cpu.enable_interrupts();
        }
    }
}
