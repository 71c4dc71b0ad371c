//! Layered error definitions
//!
//! Categorized by source: config / registry / transport / forwarder

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Kind tag known to the descriptor model but not built into this binary
    #[error("unsupported {collection} kind '{kind}'")]
    UnsupportedKind { collection: String, kind: String },

    // ===== Transport Errors =====
    /// A channel's underlying transport failed
    #[error("transport '{name}' error: {message}")]
    Transport { name: String, message: String },

    // ===== Forwarder Errors =====
    /// Forwarder write error
    #[error("forwarder '{name}' write error: {message}")]
    ForwarderWrite { name: String, message: String },

    /// Forwarder connection error
    #[error("forwarder '{name}' connection error: {message}")]
    ForwarderConnection { name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unsupported kind error
    pub fn unsupported_kind(collection: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedKind {
            collection: collection.into(),
            kind: kind.into(),
        }
    }

    /// Create transport error
    pub fn transport(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create forwarder write error
    pub fn forwarder_write(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ForwarderWrite {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised by configuration checking
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } | Self::UnsupportedKind { .. }
        )
    }
}
