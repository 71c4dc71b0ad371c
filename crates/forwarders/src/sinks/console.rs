//! ConsoleForwarder - sentences on stdout

use contracts::{ContractError, Forwarder};
use tokio::io::{AsyncWriteExt, Stdout};

pub struct ConsoleForwarder {
    out: Stdout,
}

impl ConsoleForwarder {
    pub fn new() -> Self {
        Self {
            out: tokio::io::stdout(),
        }
    }
}

impl Default for ConsoleForwarder {
    fn default() -> Self {
        Self::new()
    }
}

impl Forwarder for ConsoleForwarder {
    fn name(&self) -> &str {
        "console"
    }

    async fn write(&mut self, line: &[u8]) -> Result<(), ContractError> {
        self.out
            .write_all(line)
            .await
            .map_err(|e| ContractError::forwarder_write("console", e.to_string()))
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        self.out
            .flush()
            .await
            .map_err(|e| ContractError::forwarder_write("console", e.to_string()))
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await
    }
}
