//! Error types for CLI operations.

use registry::RegistryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// A configured channel, forwarder or computer could not be started
    #[error("Failed to start {identity}: {source}")]
    Startup {
        identity: String,
        #[source]
        source: RegistryError,
    },

    #[error("Failed to install metrics exporter: {0}")]
    Metrics(#[source] anyhow::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn startup(identity: impl ToString, source: RegistryError) -> Self {
        Self::Startup {
            identity: identity.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
