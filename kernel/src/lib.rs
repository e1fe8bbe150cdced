// src/lib.rs
// Point d'entrée de la bibliothèque de l'ordonnanceur
#![cfg_attr(not(test), no_std)] // Pas de bibliothèque standard hors tests

// Import de alloc pour les allocations dynamiques
extern crate alloc;

// Modules
pub mod arch;
pub mod config;
pub mod logger;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use config::{SchedConfig, SchedPolicy};
pub use scheduler::{Scheduler, SchedulerError, SchedulerResult};
