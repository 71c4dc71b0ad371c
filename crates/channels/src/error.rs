//! Channel error types

use thiserror::Error;

/// Channel errors
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Source could not read its transport
    #[error("channel {name}: i/o error: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Kind with no built-in source
    #[error("channel kind '{kind}' has no built-in source")]
    UnsupportedKind { kind: String },

    /// Descriptor rejected before a source was built
    #[error("invalid channel descriptor: {0}")]
    Invalid(#[from] contracts::ContractError),
}

impl ChannelError {
    pub fn io(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            name: name.into(),
            source,
        }
    }
}

/// Channel Result alias
pub type Result<T> = std::result::Result<T, ChannelError>;
