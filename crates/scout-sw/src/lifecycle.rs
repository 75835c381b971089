//! Worker lifecycle: phases, events, and notifications.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of the cache controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerPhase {
    /// Initial state, nothing installed yet.
    Parsed,
    /// Install event in progress (precache population).
    Installing,
    /// Installed; ready to activate without waiting.
    Installed,
    /// Activate event in progress (stale generation purge).
    Activating,
    /// Active and serving fetches.
    Activated,
    /// Install failed; the previous generation stays authoritative.
    Redundant,
}

impl Default for WorkerPhase {
    fn default() -> Self {
        Self::Parsed
    }
}

impl WorkerPhase {
    /// Check if the controller is serving fetches.
    pub fn is_active(&self) -> bool {
        *self == Self::Activated
    }
}

/// Platform lifecycle events driving the controller state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// New version deployed; populate the precache.
    Install,
    /// Take control; purge stale generations.
    Activate,
}

/// Notifications published by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwEvent {
    /// Lifecycle phase changed.
    PhaseChange { phase: WorkerPhase },
    /// A stale cache generation was deleted during activation.
    GenerationPurged { name: String },
    /// All open pages are now controlled by this worker.
    ClientsClaimed,
}
