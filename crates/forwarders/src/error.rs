//! Forwarder error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForwarderError {
    /// The transport could not be opened or bound
    #[error("failed to open forwarder '{name}': {source}")]
    Open {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Contract(#[from] contracts::ContractError),
}

impl ForwarderError {
    pub fn open(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Open {
            name: name.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ForwarderError>;
