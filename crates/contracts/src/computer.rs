//! Computer trait - derives new measurements from the sentence stream.

use crate::{ComputerDescriptor, ComputerPatch, ContractError, LifecycleState};

/// Derived-data computer
///
/// Computers are fed every accepted sentence after it reached the cache and
/// may write derived values back into it.
pub trait Computer: Send + Sync {
    /// Serializable identity and configuration snapshot
    fn descriptor(&self) -> ComputerDescriptor;

    fn start(&self);

    /// Idempotent
    fn stop(&self);

    fn state(&self) -> LifecycleState;

    /// Called once per accepted sentence, after cache dispatch
    fn on_sentence(&self, sentence: &str);

    /// Drop accumulated samples, keep configuration
    fn reset(&self);

    /// Apply the mutable fields of `patch`
    fn update(&self, patch: &ComputerPatch) -> Result<(), ContractError>;
}
