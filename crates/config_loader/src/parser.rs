//! Config parsing: TOML (primary) and JSON.

use contracts::{ContractError, MuxConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn parse_toml(content: &str) -> Result<MuxConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse_json(content: &str) -> Result<MuxConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse(content: &str, format: ConfigFormat) -> Result<MuxConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ChannelKind, ForwarderKind};

    #[test]
    fn test_parse_toml_collections() {
        let content = r#"
[[channels]]
kind = "file"
path = "logs/2024-06-01.nmea"
loop_playback = true

[[channels]]
kind = "zda"

[[forwarders]]
kind = "udp"
host = "192.168.1.255"
port = 8002
verbose = true
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.channels.len(), 2);
        match &config.channels[0].kind {
            ChannelKind::File {
                loop_playback,
                between_records_ms,
                ..
            } => {
                assert!(*loop_playback);
                assert_eq!(*between_records_ms, 500);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(config.channels[1].kind, ChannelKind::Zda { period_ms: 1000 });
        assert!(config.forwarders[0].verbose);
        assert!(matches!(
            config.forwarders[0].kind,
            ForwarderKind::Udp { port: 8002, .. }
        ));
        assert_eq!(config.mux.feed_capacity, 1024);
        assert_eq!(config.cache.damping, 1);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "cache": { "damping": 5 },
            "channels": [{ "kind": "tcp", "host": "localhost", "port": 7001 }],
            "computers": [{ "kind": "tw-current", "time_buffer_lengths": [10000] }]
        }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.cache.damping, 5);
        assert_eq!(config.channels[0].identity().to_string(), "tcp:localhost:7001");
        assert_eq!(config.computers.len(), 1);
    }

    #[test]
    fn test_reserved_kinds_rejected() {
        for kind in ["serial", "ws", "i2c"] {
            let content = format!("[[channels]]\nkind = \"{kind}\"\n");
            let err = parse_toml(&content).unwrap_err();
            assert!(matches!(err, ContractError::ConfigParse { .. }), "{kind}");
        }
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("JSON"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
