//! Forwarder trait - output interface for raw sentences

use crate::ContractError;

/// Raw sentence output trait
///
/// All forwarder implementations must implement this trait. `line` is one
/// sentence terminated by `\r\n`.
#[trait_variant::make(Forwarder: Send)]
pub trait LocalForwarder {
    /// Forwarder name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one sentence
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, line: &[u8]) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close forwarder
    async fn close(&mut self) -> Result<(), ContractError>;
}
