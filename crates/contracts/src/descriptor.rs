//! Channel / Forwarder / Computer descriptors.
//!
//! One tagged union per entity, discriminated by `kind`. Common settings
//! (filters, verbose flag) sit next to the flattened kind-specific block:
//!
//! ```toml
//! [[channels]]
//! kind = "tcp"
//! host = "localhost"
//! port = 7001
//! sentence_filters = ["RMC"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::{ContractError, Identity};

/// Opaque parameters handed to a registered factory
pub type FactoryParams = BTreeMap<String, String>;

fn default_between_records_ms() -> u64 {
    500
}

fn default_generator_period_ms() -> u64 {
    1000
}

fn default_queue_capacity() -> usize {
    256
}

fn default_true() -> bool {
    true
}

fn default_computer_prefix() -> String {
    "CC".to_string()
}

fn custom_identity(factory: &str, params: &FactoryParams) -> Identity {
    if params.is_empty() {
        return Identity::new("custom", factory);
    }
    let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    Identity::new("custom", format!("{}[{}]", factory, rendered.join(";")))
}

fn require(field: &str, ok: bool, message: &str) -> Result<(), ContractError> {
    if ok {
        Ok(())
    } else {
        Err(ContractError::config_validation(field, message))
    }
}

// ============================================================================
// Channels
// ============================================================================

/// Input channel kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ChannelKind {
    /// Replays a log file, one sentence per line
    File {
        path: PathBuf,
        #[serde(default)]
        loop_playback: bool,
        #[serde(default = "default_between_records_ms")]
        between_records_ms: u64,
    },
    /// Reads lines from a TCP server
    Tcp { host: String, port: u16 },
    /// Emits random transducer readings
    Rnd {
        #[serde(default = "default_generator_period_ms")]
        period_ms: u64,
    },
    /// Emits the system clock as date/time sentences
    Zda {
        #[serde(default = "default_generator_period_ms")]
        period_ms: u64,
    },
    /// Built by a registered factory
    Custom {
        factory: String,
        #[serde(default)]
        params: FactoryParams,
    },
}

impl ChannelKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ChannelKind::File { .. } => "file",
            ChannelKind::Tcp { .. } => "tcp",
            ChannelKind::Rnd { .. } => "rnd",
            ChannelKind::Zda { .. } => "zda",
            ChannelKind::Custom { .. } => "custom",
        }
    }

    pub fn identity(&self) -> Identity {
        match self {
            ChannelKind::File { path, .. } => Identity::new("file", path.to_string_lossy()),
            ChannelKind::Tcp { host, port } => Identity::new("tcp", format!("{host}:{port}")),
            ChannelKind::Rnd { .. } => Identity::singleton("rnd"),
            ChannelKind::Zda { .. } => Identity::singleton("zda"),
            ChannelKind::Custom { factory, params } => custom_identity(factory, params),
        }
    }
}

/// Input channel descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    #[serde(flatten)]
    pub kind: ChannelKind,

    /// Talker prefixes accepted (`GP`, `II`, ...); empty accepts all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device_filters: Vec<String>,

    /// Sentence ids accepted (`RMC`, `MWV`, ...); empty accepts all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sentence_filters: Vec<String>,

    #[serde(default)]
    pub verbose: bool,
}

impl ChannelDescriptor {
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            device_filters: Vec::new(),
            sentence_filters: Vec::new(),
            verbose: false,
        }
    }

    pub fn with_sentence_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sentence_filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_device_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.device_filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn identity(&self) -> Identity {
        self.kind.identity()
    }

    /// Check required parameters
    pub fn validate(&self) -> Result<(), ContractError> {
        match &self.kind {
            ChannelKind::File { path, .. } => {
                require("channel.path", !path.as_os_str().is_empty(), "must not be empty")
            }
            ChannelKind::Tcp { host, port } => {
                require("channel.host", !host.trim().is_empty(), "must not be empty")?;
                require("channel.port", *port > 0, "must be > 0")
            }
            ChannelKind::Rnd { period_ms } | ChannelKind::Zda { period_ms } => {
                require("channel.period_ms", *period_ms > 0, "must be > 0")
            }
            ChannelKind::Custom { factory, .. } => {
                require("channel.factory", !factory.trim().is_empty(), "must not be empty")
            }
        }?;
        let filters_ok = self
            .device_filters
            .iter()
            .chain(self.sentence_filters.iter())
            .all(|f| !f.trim().is_empty());
        require("channel.filters", filters_ok, "filter entries must not be empty")
    }
}

/// Mutable fields of a running channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelPatch {
    #[serde(default)]
    pub verbose: Option<bool>,
    #[serde(default)]
    pub device_filters: Option<Vec<String>>,
    #[serde(default)]
    pub sentence_filters: Option<Vec<String>>,
}

// ============================================================================
// Forwarders
// ============================================================================

/// Output forwarder kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ForwarderKind {
    /// Writes sentences to stdout
    Console,
    /// Appends sentences to a log file
    File {
        path: PathBuf,
        #[serde(default = "default_true")]
        append: bool,
    },
    /// Sends each sentence as a UDP datagram
    Udp { host: String, port: u16 },
    /// Serves sentences to every client connected on `port`
    Tcp { port: u16 },
    /// Built by a registered factory
    Custom {
        factory: String,
        #[serde(default)]
        params: FactoryParams,
    },
}

impl ForwarderKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ForwarderKind::Console => "console",
            ForwarderKind::File { .. } => "file",
            ForwarderKind::Udp { .. } => "udp",
            ForwarderKind::Tcp { .. } => "tcp",
            ForwarderKind::Custom { .. } => "custom",
        }
    }

    pub fn identity(&self) -> Identity {
        match self {
            ForwarderKind::Console => Identity::singleton("console"),
            ForwarderKind::File { path, .. } => Identity::new("file", path.to_string_lossy()),
            ForwarderKind::Udp { host, port } => Identity::new("udp", format!("{host}:{port}")),
            ForwarderKind::Tcp { port } => Identity::new("tcp", port.to_string()),
            ForwarderKind::Custom { factory, params } => custom_identity(factory, params),
        }
    }
}

/// Output forwarder descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwarderDescriptor {
    #[serde(flatten)]
    pub kind: ForwarderKind,

    #[serde(default)]
    pub verbose: bool,

    /// Sentences buffered before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl ForwarderDescriptor {
    pub fn new(kind: ForwarderKind) -> Self {
        Self {
            kind,
            verbose: false,
            queue_capacity: default_queue_capacity(),
        }
    }

    pub fn identity(&self) -> Identity {
        self.kind.identity()
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        require("forwarder.queue_capacity", self.queue_capacity > 0, "must be > 0")?;
        match &self.kind {
            ForwarderKind::Console | ForwarderKind::Tcp { .. } => Ok(()),
            ForwarderKind::File { path, .. } => {
                require("forwarder.path", !path.as_os_str().is_empty(), "must not be empty")
            }
            ForwarderKind::Udp { host, port } => {
                require("forwarder.host", !host.trim().is_empty(), "must not be empty")?;
                require("forwarder.port", *port > 0, "must be > 0")
            }
            ForwarderKind::Custom { factory, .. } => {
                require("forwarder.factory", !factory.trim().is_empty(), "must not be empty")
            }
        }
    }
}

/// Mutable fields of a running forwarder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForwarderPatch {
    #[serde(default)]
    pub verbose: Option<bool>,
}

// ============================================================================
// Computers
// ============================================================================

/// Computer kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ComputerKind {
    /// True wind and averaged current
    TwCurrent {
        /// Talker prefix of the sentences it generates
        #[serde(default = "default_computer_prefix")]
        prefix: String,
        /// Averaging windows, milliseconds
        time_buffer_lengths: Vec<u64>,
    },
    /// Built by a registered factory
    Custom {
        factory: String,
        #[serde(default)]
        params: FactoryParams,
    },
}

impl ComputerKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ComputerKind::TwCurrent { .. } => "tw-current",
            ComputerKind::Custom { .. } => "custom",
        }
    }

    pub fn identity(&self) -> Identity {
        match self {
            ComputerKind::TwCurrent { .. } => Identity::singleton("tw-current"),
            ComputerKind::Custom { factory, params } => custom_identity(factory, params),
        }
    }
}

/// Computer descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputerDescriptor {
    #[serde(flatten)]
    pub kind: ComputerKind,

    #[serde(default)]
    pub verbose: bool,
}

impl ComputerDescriptor {
    pub fn new(kind: ComputerKind) -> Self {
        Self {
            kind,
            verbose: false,
        }
    }

    pub fn identity(&self) -> Identity {
        self.kind.identity()
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        match &self.kind {
            ComputerKind::TwCurrent {
                prefix,
                time_buffer_lengths,
            } => {
                require(
                    "computer.prefix",
                    prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_alphanumeric()),
                    "must be two alphanumeric characters",
                )?;
                require(
                    "computer.time_buffer_lengths",
                    !time_buffer_lengths.is_empty(),
                    "must not be empty",
                )
            }
            ComputerKind::Custom { factory, .. } => {
                require("computer.factory", !factory.trim().is_empty(), "must not be empty")
            }
        }
    }
}

/// Mutable fields of a running computer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputerPatch {
    #[serde(default)]
    pub verbose: Option<bool>,
    #[serde(default)]
    pub prefix: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_json_flattened() {
        let json = r#"{"kind":"tcp","host":"localhost","port":7001,"sentence_filters":["RMC"]}"#;
        let desc: ChannelDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(
            desc.kind,
            ChannelKind::Tcp {
                host: "localhost".into(),
                port: 7001
            }
        );
        assert_eq!(desc.sentence_filters, vec!["RMC".to_string()]);
        assert!(!desc.verbose);
        assert_eq!(desc.identity().to_string(), "tcp:localhost:7001");
    }

    #[test]
    fn test_channel_toml_defaults() {
        let desc: ChannelDescriptor = toml::from_str(
            r#"
kind = "file"
path = "/var/log/nmea.log"
"#,
        )
        .unwrap();
        match desc.kind {
            ChannelKind::File {
                loop_playback,
                between_records_ms,
                ..
            } => {
                assert!(!loop_playback);
                assert_eq!(between_records_ms, 500);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let json = r#"{"kind":"serial","port":"/dev/ttyUSB0"}"#;
        assert!(serde_json::from_str::<ChannelDescriptor>(json).is_err());
    }

    #[test]
    fn test_forwarder_console_and_identity() {
        let desc: ForwarderDescriptor =
            serde_json::from_str(r#"{"kind":"console","verbose":true}"#).unwrap();
        assert_eq!(desc.kind, ForwarderKind::Console);
        assert!(desc.verbose);
        assert_eq!(desc.queue_capacity, 256);
        assert_eq!(desc.identity(), Identity::singleton("console"));
    }

    #[test]
    fn test_computer_kind_tag() {
        let desc: ComputerDescriptor = serde_json::from_str(
            r#"{"kind":"tw-current","time_buffer_lengths":[10000,60000]}"#,
        )
        .unwrap();
        assert_eq!(desc.kind.tag(), "tw-current");
        assert!(desc.validate().is_ok());
        match desc.kind {
            ComputerKind::TwCurrent { prefix, .. } => assert_eq!(prefix, "CC"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_custom_identity_includes_params() {
        let mut params = FactoryParams::new();
        params.insert("b".into(), "2".into());
        params.insert("a".into(), "1".into());
        let kind = ChannelKind::Custom {
            factory: "replay".into(),
            params,
        };
        assert_eq!(kind.identity().to_string(), "custom:replay[a=1;b=2]");
    }

    #[test]
    fn test_validation() {
        let bad_port = ChannelDescriptor::new(ChannelKind::Tcp {
            host: "localhost".into(),
            port: 0,
        });
        assert!(bad_port.validate().unwrap_err().is_config());

        let bad_filter = ChannelDescriptor::new(ChannelKind::Zda { period_ms: 1000 })
            .with_sentence_filters([""]);
        assert!(bad_filter.validate().is_err());

        let bad_udp = ForwarderDescriptor::new(ForwarderKind::Udp {
            host: String::new(),
            port: 2000,
        });
        assert!(bad_udp.validate().is_err());
    }
}
