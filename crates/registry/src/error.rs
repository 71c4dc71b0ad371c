//! Registry error types

use channels::ChannelError;
use computers::ComputerError;
use contracts::{ContractError, Identity};
use forwarders::ForwarderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// An entry with the same identity is already registered
    #[error("'{identity}' is already registered")]
    Conflict { identity: Identity },

    #[error("'{identity}' is not registered")]
    NotFound { identity: Identity },

    /// Rejected before anything was built
    #[error("invalid {collection} configuration: {message}")]
    Config {
        collection: &'static str,
        message: String,
    },

    /// The transport or factory failed while building the entry
    #[error("failed to instantiate '{identity}': {message}")]
    Instantiation { identity: Identity, message: String },

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl RegistryError {
    pub fn conflict(identity: Identity) -> Self {
        Self::Conflict { identity }
    }

    pub fn not_found(identity: Identity) -> Self {
        Self::NotFound { identity }
    }

    pub fn config(collection: &'static str, message: impl Into<String>) -> Self {
        Self::Config {
            collection,
            message: message.into(),
        }
    }

    pub fn instantiation(identity: Identity, message: impl Into<String>) -> Self {
        Self::Instantiation {
            identity,
            message: message.into(),
        }
    }

    /// HTTP-like status for the admin surface
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } | Self::Config { .. } => 400,
            Self::Contract(e) if e.is_config() => 400,
            Self::Instantiation { .. } | Self::Contract(_) => 500,
        }
    }

    pub(crate) fn from_channel(identity: Identity, err: ChannelError) -> Self {
        match err {
            ChannelError::Invalid(e) => Self::Contract(e),
            ChannelError::UnsupportedKind { kind } => {
                Self::config("channel", format!("unsupported kind '{kind}'"))
            }
            other => Self::instantiation(identity, other.to_string()),
        }
    }

    pub(crate) fn from_forwarder(identity: Identity, err: ForwarderError) -> Self {
        match err {
            ForwarderError::Contract(e) if e.is_config() => Self::Contract(e),
            other => Self::instantiation(identity, other.to_string()),
        }
    }
}

impl From<ComputerError> for RegistryError {
    fn from(err: ComputerError) -> Self {
        Self::config("computer", err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let id = Identity::new("tcp", "localhost:7001");
        assert_eq!(RegistryError::not_found(id.clone()).status_code(), 404);
        assert_eq!(RegistryError::conflict(id.clone()).status_code(), 400);
        assert_eq!(
            RegistryError::from(ComputerError::DuplicateWindow { length_ms: 5000 }).status_code(),
            400
        );
        assert_eq!(
            RegistryError::from(ContractError::config_validation("channel.port", "must be > 0"))
                .status_code(),
            400
        );
        assert_eq!(RegistryError::instantiation(id, "address in use").status_code(), 500);
    }
}
