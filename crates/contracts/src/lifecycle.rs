//! Component lifecycle: `Created -> Running -> Stopped`.
//!
//! `Failed` is entered from `Running` when a transport faults; it still
//! accepts a stop. `Stopped` is terminal.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LifecycleState {
    Created = 0,
    Running = 1,
    Failed = 2,
    Stopped = 3,
}

impl LifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LifecycleState::Created,
            1 => LifecycleState::Running,
            2 => LifecycleState::Failed,
            _ => LifecycleState::Stopped,
        }
    }
}

/// Lock-free lifecycle cell shared between a component and its task
#[derive(Debug)]
pub struct Lifecycle(AtomicU8);

impl Lifecycle {
    pub fn new() -> Self {
        Self(AtomicU8::new(LifecycleState::Created as u8))
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// `Created -> Running`; false if the component was already started or stopped
    pub fn start(&self) -> bool {
        self.transition(LifecycleState::Created, LifecycleState::Running)
    }

    /// `Running -> Failed`
    pub fn fail(&self) -> bool {
        self.transition(LifecycleState::Running, LifecycleState::Failed)
    }

    /// Moves to `Stopped`; returns false when already stopped
    pub fn stop(&self) -> bool {
        let previous = self.0.swap(LifecycleState::Stopped as u8, Ordering::AcqRel);
        LifecycleState::from_u8(previous) != LifecycleState::Stopped
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Created);
        assert!(lifecycle.start());
        assert!(lifecycle.is_running());
        assert!(lifecycle.stop());
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[test]
    fn test_stop_is_idempotent_and_terminal() {
        let lifecycle = Lifecycle::new();
        lifecycle.start();
        assert!(lifecycle.stop());
        assert!(!lifecycle.stop());
        assert!(!lifecycle.start());
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[test]
    fn test_failed_can_be_stopped() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.fail());
        lifecycle.start();
        assert!(lifecycle.fail());
        assert_eq!(lifecycle.state(), LifecycleState::Failed);
        assert!(lifecycle.stop());
    }
}
