//! Computer error types

use contracts::ContractError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ComputerError {
    #[error("at least one averaging window is required")]
    Empty,

    #[error("window length must be positive, got {length_ms} ms")]
    InvalidWindow { length_ms: u64 },

    #[error("window of {length_ms} ms configured twice")]
    DuplicateWindow { length_ms: u64 },

    #[error("invalid prefix '{prefix}': {message}")]
    InvalidPrefix { prefix: String, message: String },

    #[error("descriptor kind '{kind}' is not handled by this computer")]
    WrongKind { kind: String },
}

impl ComputerError {
    pub fn invalid_prefix(prefix: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPrefix {
            prefix: prefix.into(),
            message: message.into(),
        }
    }
}

impl From<ComputerError> for ContractError {
    fn from(e: ComputerError) -> Self {
        let field = match &e {
            ComputerError::InvalidPrefix { .. } => "computer.prefix",
            ComputerError::WrongKind { .. } => "computer.kind",
            _ => "computer.time_buffer_lengths",
        };
        ContractError::config_validation(field, e.to_string())
    }
}
